//! # TSM Envelope Protocol
//!
//! This crate implements the signed and encrypted envelope spoken by the
//! TSM campus-card gateway. It performs no I/O; the HTTP exchange lives in
//! `tsm-client`.
//!
//! ## Overview
//!
//! - **Symmetric Cipher**: Triple-DES/CBC with a zero IV for business payloads
//! - **Canonicalizer**: byte-ordered `key+value` concatenation of the envelope fields
//! - **Signer**: SHA1withRSA over the canonical string
//! - **Envelope Builder**: encrypt, canonicalize, sign, form-encode
//! - **Response Decoder**: percent-decode, query-parse, restore `+`, decrypt
//! - **Error Mapper**: gateway `errcode` to message
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Business JSON payload          │
//! ├─────────────────────────────────────────┤
//! │       Triple-DES/CBC  → `request`       │  Base64
//! ├─────────────────────────────────────────┤
//! │   canonical string → SHA1withRSA sign   │  Base64
//! ├─────────────────────────────────────────┤
//! │    x-www-form-urlencoded POST body      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tsm_protocol::{Credentials, EnvelopeBuilder, ResponseDecoder};
//!
//! # fn run(pem: &str, body_from_gateway: &str) -> tsm_protocol::Result<()> {
//! let credentials = Credentials::new(
//!     "https://tsm.example.edu/tsm",
//!     "APPKEY1",
//!     "e05+vW25CBfNHvtYq1pLEnsDEsJv6aDZ",
//!     pem,
//! );
//!
//! let builder = EnvelopeBuilder::new(&credentials)?;
//! let envelope = builder.build(
//!     "synjones.authorize.access_token",
//!     &"0".repeat(128),
//!     r#"{"authorize_access_token": {}}"#,
//! )?;
//! let body = envelope.to_form_body();
//!
//! // ... POST `body` to the gateway ...
//!
//! let decoder = ResponseDecoder::new(builder.cipher().clone());
//! let reply = decoder.decode(body_from_gateway)?;
//! println!("errcode={} payload={}", reply.errcode, reply.payload);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`credentials`]: Gateway credentials
//! - [`crypto`]: Triple-DES cipher, RSA signer and verifier
//! - [`envelope`]: Canonical string and request envelope
//! - [`response`]: Response decoding
//! - [`errcode`]: Status code messages
//! - [`error`]: Error types

pub mod credentials;
pub mod crypto;
pub mod envelope;
pub mod errcode;
pub mod error;
pub mod response;

pub use credentials::Credentials;
pub use crypto::{
    RequestSigner, SignatureVerifier, SymmetricCipher, TDES_BLOCK_SIZE, TDES_KEY_LENGTH,
};
pub use envelope::{
    canonicalize, EnvelopeBuilder, EnvelopeFields, SignedEnvelope, FORMAT, FORM_CONTENT_TYPE,
    SIGN_METHOD, TIMESTAMP_FORMAT, VERSION,
};
pub use errcode::ErrorMapper;
pub use error::{ProtocolError, Result};
pub use response::{DecodedResponse, ResponseDecoder, WireResponse, SUCCESS_CODE};
