//! Error types for the client crate.

use std::time::Duration;

use thiserror::Error;
use tsm_protocol::ProtocolError;

use crate::config::ConfigError;

/// Failure of a gateway call.
///
/// The variants fall into four groups: transport (`Transport`, `Timeout`),
/// protocol (`Protocol`, split further by [`ProtocolError::is_crypto`] and
/// [`ProtocolError::is_encoding`]), business (`Gateway`, `Rejected`,
/// `InvalidPayload`) and local configuration (`Config`).
#[derive(Debug, Error)]
pub enum ClientError {
    // Transport errors
    /// The HTTP exchange failed (connect, TLS, reading the body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not finish before its deadline.
    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),

    // Envelope errors
    /// Building the envelope or decoding the reply failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    // Business errors
    /// The gateway answered with a non-zero `errcode`.
    #[error("gateway error {code}: {message}")]
    Gateway {
        /// Raw `errcode` value.
        code: String,
        /// Message from the error mapper, or the raw code when unmapped.
        message: String,
    },

    /// The business payload carried a non-zero `retcode`.
    #[error("{method} rejected with retcode {retcode}: {message}")]
    Rejected {
        /// Gateway method name.
        method: &'static str,
        /// Raw `retcode` value.
        retcode: String,
        /// The payload's `errmsg`.
        message: String,
    },

    /// The decrypted payload does not match the method's reply schema.
    #[error("invalid {method} reply: {reason}")]
    InvalidPayload {
        /// Gateway method name.
        method: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    // Local errors
    /// The client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Returns true for network failures and deadline expiry.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout(_))
    }

    /// Returns true for key, cipher and signature failures.
    pub fn is_crypto(&self) -> bool {
        matches!(self, ClientError::Protocol(err) if err.is_crypto())
    }

    /// Returns true for malformed wire responses.
    pub fn is_encoding(&self) -> bool {
        matches!(self, ClientError::Protocol(err) if err.is_encoding())
    }

    /// Returns true when the gateway or the business layer refused the call.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            ClientError::Gateway { .. }
                | ClientError::Rejected { .. }
                | ClientError::InvalidPayload { .. }
        )
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert!(err.is_transport());
        assert!(!err.is_business());
    }

    #[test]
    fn test_timeout_error_display() {
        let err = ClientError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "gateway call timed out after 250ms");
        assert!(err.is_transport());
    }

    #[test]
    fn test_gateway_error_display() {
        let err = ClientError::Gateway {
            code: "5".to_string(),
            message: "5".to_string(),
        };
        assert_eq!(err.to_string(), "gateway error 5: 5");
        assert!(err.is_business());
    }

    #[test]
    fn test_rejected_error_display() {
        let err = ClientError::Rejected {
            method: "synjones.onecard.open.acc",
            retcode: "12".to_string(),
            message: "duplicate sno".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "synjones.onecard.open.acc rejected with retcode 12: duplicate sno"
        );
        assert!(err.is_business());
    }

    #[test]
    fn test_invalid_payload_display() {
        let err = ClientError::InvalidPayload {
            method: "synjones.onecard.barcode.get",
            reason: "missing barcode_get".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid synjones.onecard.barcode.get reply: missing barcode_get"
        );
    }

    #[test]
    fn test_protocol_error_is_transparent() {
        let err: ClientError = ProtocolError::Decryption("bad padding".to_string()).into();
        assert_eq!(err.to_string(), "decryption failed: bad padding");
        assert!(err.is_crypto());
        assert!(!err.is_encoding());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_protocol_encoding_classification() {
        let err: ClientError = ProtocolError::MissingField { field: "errcode" }.into();
        assert!(err.is_encoding());
        assert!(!err.is_crypto());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ClientError = ConfigError::MissingAppKey.into();
        assert_eq!(err.to_string(), "configuration error: app_key must not be empty");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }
}
