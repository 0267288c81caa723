//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all envelope failure modes.
///
/// Every variant is either a crypto failure (key material, cipher, signature)
/// or an encoding failure (malformed wire response). See [`ProtocolError::is_crypto`]
/// and [`ProtocolError::is_encoding`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    // Cryptographic errors
    /// Key material could not be decoded or has the wrong shape.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Encryption operation failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption operation failed (bad Base64, bad padding, non-UTF-8 plaintext).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Producing a signature failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature verification failed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    // Encoding errors
    /// The wire response is not valid percent/query encoding.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// A required field is absent from the wire response.
    #[error("missing field in gateway response: {field}")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
}

impl ProtocolError {
    /// Returns true for key, cipher and signature failures.
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidKey(_)
                | ProtocolError::Encryption(_)
                | ProtocolError::Decryption(_)
                | ProtocolError::Signing(_)
                | ProtocolError::InvalidSignature(_)
        )
    }

    /// Returns true for malformed wire responses.
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            ProtocolError::MalformedEncoding(_) | ProtocolError::MissingField { .. }
        )
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Conversions from underlying crate errors

impl From<rsa::pkcs8::Error> for ProtocolError {
    fn from(err: rsa::pkcs8::Error) -> Self {
        ProtocolError::InvalidKey(format!("private key: {}", err))
    }
}

impl From<rsa::pkcs8::spki::Error> for ProtocolError {
    fn from(err: rsa::pkcs8::spki::Error) -> Self {
        ProtocolError::InvalidKey(format!("public key: {}", err))
    }
}

impl From<rsa::Error> for ProtocolError {
    fn from(err: rsa::Error) -> Self {
        match err {
            rsa::Error::Verification => ProtocolError::InvalidSignature(err.to_string()),
            _ => ProtocolError::Signing(err.to_string()),
        }
    }
}
