//! Generate known-answer vectors for gateway interop testing.
//!
//! Run with: cargo run --package tsm-protocol --example test_vectors

use tsm_protocol::{Credentials, EnvelopeBuilder};

const KEY_B64: &str = "e05+vW25CBfNHvtYq1pLEnsDEsJv6aDZ";
const TEST_KEY_PEM: &str = include_str!("../testdata/test_key.pem");
const TIMESTAMP: &str = "2024-01-01 00:00:00";

fn main() -> tsm_protocol::Result<()> {
    let credentials = Credentials::new("https://tsm.test/api", "APPKEY1", KEY_B64, TEST_KEY_PEM);
    let builder = EnvelopeBuilder::new(&credentials)?;
    let token = "0".repeat(128);

    // Test vector 1: access token request
    print_test_vector(
        &builder,
        "access_token",
        "synjones.authorize.access_token",
        &token,
        r#"{"authorize_access_token": {}}"#,
    )?;

    // Test vector 2: barcode request
    print_test_vector(
        &builder,
        "barcode_get",
        "synjones.onecard.barcode.get",
        "tok-123",
        r####"{"barcode_get":{"account":"100234","paytype":"1","payacc":"###"}}"####,
    )?;

    // Test vector 3: unfreeze request
    print_test_vector(
        &builder,
        "unfrozen_card",
        "synjones.onecard.unfrozen.card",
        "tok-123",
        r#"{"unfrozen_card":{"account":"100234"}}"#,
    )?;

    Ok(())
}

fn print_test_vector(
    builder: &EnvelopeBuilder,
    name: &str,
    method: &str,
    access_token: &str,
    payload: &str,
) -> tsm_protocol::Result<()> {
    let envelope = builder.build_at(method, access_token, payload, TIMESTAMP)?;
    println!("[{}]", name);
    println!("payload   = {}", payload);
    println!("request   = {}", envelope.fields.request);
    println!("canonical = {}", envelope.fields.canonical_string());
    println!("sign      = {}", envelope.sign);
    println!("body      = {}", envelope.to_form_body());
    println!();
    Ok(())
}
