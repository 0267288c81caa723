//! Gateway response decoding.
//!
//! The gateway answers with a percent-encoded string which, once decoded, is
//! a query string carrying `errcode`, `request` and `sign`. Decoding is done
//! in four steps:
//!
//! 1. percent-decode the body once (`+` is left alone here)
//! 2. parse the result as a form query (`+` becomes a space here); escapes
//!    left over from step 1 must be well-formed too
//! 3. turn spaces in `request` back into `+`, since Base64 never contains spaces
//! 4. decrypt `request` when `errcode` is `0`

use tracing::debug;
use url::form_urlencoded;

use crate::crypto::SymmetricCipher;
use crate::error::{ProtocolError, Result};

/// `errcode` value of a successful call.
pub const SUCCESS_CODE: &str = "0";

/// The three fields of a gateway response, before decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// Protocol status code. `"0"` means success.
    pub errcode: String,
    /// Base64 ciphertext of the business reply. Empty when absent.
    pub request: String,
    /// Gateway signature. Carried along but not verified.
    pub sign: Option<String>,
}

impl WireResponse {
    /// Parses a raw response body.
    pub fn parse(raw_body: &str) -> Result<Self> {
        let decoded = percent_decode_strict(raw_body.trim())?;
        // Form parsing decodes escapes leniently, so check them first
        percent_decode_strict(&decoded)?;

        let mut errcode = None;
        let mut request = None;
        let mut sign = None;
        for (key, value) in form_urlencoded::parse(decoded.as_bytes()) {
            let slot = match key.as_ref() {
                "errcode" => &mut errcode,
                "request" => &mut request,
                "sign" => &mut sign,
                _ => continue,
            };
            // First occurrence wins
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let errcode = errcode.ok_or(ProtocolError::MissingField { field: "errcode" })?;

        Ok(Self {
            errcode: errcode.trim().to_string(),
            request: request.map(restore_plus).unwrap_or_default(),
            sign: sign.map(restore_plus),
        })
    }

    /// Returns true when the gateway reported success.
    pub fn is_success(&self) -> bool {
        self.errcode == SUCCESS_CODE
    }
}

/// A decoded gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    /// Protocol status code.
    pub errcode: String,
    /// Decrypted business JSON. Empty unless `errcode` is `"0"`.
    pub payload: String,
}

impl DecodedResponse {
    /// Returns true when the gateway reported success.
    pub fn is_success(&self) -> bool {
        self.errcode == SUCCESS_CODE
    }
}

/// Decodes and decrypts gateway responses.
#[derive(Debug, Clone)]
pub struct ResponseDecoder {
    cipher: SymmetricCipher,
}

impl ResponseDecoder {
    /// Creates a decoder using the payload cipher.
    pub fn new(cipher: SymmetricCipher) -> Self {
        Self { cipher }
    }

    /// Decodes a raw response body.
    ///
    /// The `request` field is only decrypted on success. A failing `errcode`
    /// never turns into a crypto error.
    pub fn decode(&self, raw_body: &str) -> Result<DecodedResponse> {
        let wire = WireResponse::parse(raw_body)?;

        let payload = if wire.is_success() && !wire.request.is_empty() {
            self.cipher.decrypt(&wire.request)?
        } else {
            String::new()
        };

        debug!(
            errcode = %wire.errcode,
            payload_len = payload.len(),
            "gateway response decoded"
        );

        Ok(DecodedResponse {
            errcode: wire.errcode,
            payload,
        })
    }
}

/// Undoes the space substitution made by form decoding.
fn restore_plus(value: String) -> String {
    if value.contains(' ') {
        value.replace(' ', "+")
    } else {
        value
    }
}

/// Decodes `%XX` escapes, rejecting malformed ones. `+` is kept as is.
fn percent_decode_strict(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
        let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
        match (hi, lo) {
            (Some(hi), Some(lo)) => {
                out.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                let end = (i + 3).min(bytes.len());
                return Err(ProtocolError::MalformedEncoding(format!(
                    "invalid escape {:?} at byte {}",
                    String::from_utf8_lossy(&bytes[i..end]),
                    i
                )));
            }
        }
    }

    String::from_utf8(out).map_err(|e| {
        ProtocolError::MalformedEncoding(format!("decoded response is not UTF-8: {}", e))
    })
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
