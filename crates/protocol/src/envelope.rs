//! Request envelope: canonical string, signature and form body.
//!
//! # Envelope Format
//!
//! Every gateway call is a form POST with nine fields:
//!
//! | field          | value                                      |
//! |----------------|--------------------------------------------|
//! | `method`       | business method name                       |
//! | `timestamp`    | local time, `YYYY-MM-DD HH:MM:SS`          |
//! | `format`       | always `json`                              |
//! | `app_key`      | application key                            |
//! | `access_token` | token from `synjones.authorize.access_token` |
//! | `v`            | always `2.0`                               |
//! | `sign_method`  | always `rsa`                               |
//! | `request`      | Base64 Triple-DES ciphertext of the JSON payload |
//! | `sign`         | SHA1withRSA over the canonical string      |
//!
//! The canonical string is the first eight fields sorted by name and written
//! as `name` followed directly by `value`, with no separators.

use std::collections::BTreeMap;

use chrono::Local;
use tracing::debug;
use url::form_urlencoded;

use crate::credentials::Credentials;
use crate::crypto::{RequestSigner, SymmetricCipher};
use crate::error::Result;

/// Value of the `format` field.
pub const FORMAT: &str = "json";

/// Value of the `v` field.
pub const VERSION: &str = "2.0";

/// Value of the `sign_method` field.
pub const SIGN_METHOD: &str = "rsa";

/// `strftime` pattern of the `timestamp` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Content type of the request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Builds the canonical string that gets signed.
///
/// Keys are ordered by byte value:
/// `access_token < app_key < format < method < request < sign_method < timestamp < v`.
pub fn canonicalize(
    method: &str,
    timestamp: &str,
    app_key: &str,
    access_token: &str,
    request: &str,
) -> String {
    let fields = BTreeMap::from([
        ("method", method),
        ("timestamp", timestamp),
        ("format", FORMAT),
        ("app_key", app_key),
        ("access_token", access_token),
        ("v", VERSION),
        ("sign_method", SIGN_METHOD),
        ("request", request),
    ]);

    let capacity = fields.iter().map(|(k, v)| k.len() + v.len()).sum();
    fields
        .into_iter()
        .fold(String::with_capacity(capacity), |mut out, (key, value)| {
            out.push_str(key);
            out.push_str(value);
            out
        })
}

/// The eight signed fields of one request.
///
/// The constant fields (`format`, `v`, `sign_method`) are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeFields {
    /// Business method name.
    pub method: String,
    /// Formatted send time.
    pub timestamp: String,
    /// Application key.
    pub app_key: String,
    /// Access token (a placeholder when requesting a token).
    pub access_token: String,
    /// Base64 ciphertext of the business payload.
    pub request: String,
}

impl EnvelopeFields {
    /// Returns the canonical string for these fields.
    pub fn canonical_string(&self) -> String {
        canonicalize(
            &self.method,
            &self.timestamp,
            &self.app_key,
            &self.access_token,
            &self.request,
        )
    }
}

/// A fully built request: the signed fields plus their signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// The signed fields.
    pub fields: EnvelopeFields,
    /// Base64 SHA1withRSA signature over the canonical string.
    pub sign: String,
}

impl SignedEnvelope {
    /// All nine form fields, ordered by name.
    pub fn form_fields(&self) -> [(&'static str, &str); 9] {
        [
            ("access_token", self.fields.access_token.as_str()),
            ("app_key", self.fields.app_key.as_str()),
            ("format", FORMAT),
            ("method", self.fields.method.as_str()),
            ("request", self.fields.request.as_str()),
            ("sign", self.sign.as_str()),
            ("sign_method", SIGN_METHOD),
            ("timestamp", self.fields.timestamp.as_str()),
            ("v", VERSION),
        ]
    }

    /// Encodes the envelope as an `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_fields())
            .finish()
    }
}

/// Turns business JSON into signed envelopes.
///
/// Holds only immutable key material; every call to [`build`](Self::build)
/// produces an independent [`SignedEnvelope`].
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    app_key: String,
    cipher: SymmetricCipher,
    signer: RequestSigner,
}

impl EnvelopeBuilder {
    /// Creates a builder from gateway credentials.
    ///
    /// Decodes the symmetric key and parses the private key up front so that
    /// bad key material is reported at construction time.
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let cipher = SymmetricCipher::from_base64_key(credentials.symmetric_key_b64())?;
        let signer = RequestSigner::from_pkcs8_pem(credentials.private_key_pem())?;
        Ok(Self::from_parts(credentials.app_key(), cipher, signer))
    }

    /// Creates a builder from already decoded parts.
    pub fn from_parts(
        app_key: impl Into<String>,
        cipher: SymmetricCipher,
        signer: RequestSigner,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            cipher,
            signer,
        }
    }

    /// The cipher used for payloads. Responses are decrypted with the same key.
    pub fn cipher(&self) -> &SymmetricCipher {
        &self.cipher
    }

    /// Builds an envelope stamped with the current local time.
    pub fn build(&self, method: &str, access_token: &str, payload: &str) -> Result<SignedEnvelope> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.build_at(method, access_token, payload, &timestamp)
    }

    /// Builds an envelope with an explicit timestamp string.
    pub fn build_at(
        &self,
        method: &str,
        access_token: &str,
        payload: &str,
        timestamp: &str,
    ) -> Result<SignedEnvelope> {
        let request = self.cipher.encrypt(payload)?;

        let fields = EnvelopeFields {
            method: method.to_string(),
            timestamp: timestamp.to_string(),
            app_key: self.app_key.clone(),
            access_token: access_token.to_string(),
            request,
        };

        let sign = self.signer.sign(&fields.canonical_string())?;
        debug!(
            method = %fields.method,
            timestamp = %fields.timestamp,
            request_len = fields.request.len(),
            "envelope signed"
        );

        Ok(SignedEnvelope { fields, sign })
    }
}
