//! The gateway client.
//!
//! [`TsmClient::send`] runs one complete exchange: build and sign the
//! envelope, POST it, decode the reply and map a failing `errcode`. The
//! typed business calls in [`crate::business`] are built on top of it.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use tsm_protocol::{Credentials, EnvelopeBuilder, ErrorMapper, ResponseDecoder};

use crate::config::{Config, DEFAULT_TIMEOUT_SECS};
use crate::error::{ClientError, ClientResult};
use crate::transport::HttpTransport;

/// Options for building a [`TsmClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout applied to every HTTP exchange.
    pub timeout: Duration,
    /// Mapper used to turn a failing `errcode` into a message.
    pub error_mapper: ErrorMapper,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            error_mapper: ErrorMapper::new(),
        }
    }
}

/// Successful gateway reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    /// The `errcode` value, always `"0"` for a reply returned by `send`.
    pub errcode: String,
    /// Decrypted business JSON. Empty when the gateway sent no `request`.
    pub payload: String,
}

impl GatewayReply {
    /// Deserializes the payload.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.payload)
    }
}

/// Client for the TSM gateway.
///
/// Holds only immutable state, so one client can serve any number of
/// concurrent calls (share it behind an `Arc` or clone it).
#[derive(Debug, Clone)]
pub struct TsmClient {
    builder: EnvelopeBuilder,
    decoder: ResponseDecoder,
    errors: ErrorMapper,
    transport: HttpTransport,
}

impl TsmClient {
    /// Creates a client with default options.
    ///
    /// # Errors
    ///
    /// Fails when the symmetric key or private key cannot be decoded, or
    /// when the HTTP client cannot be created.
    pub fn new(credentials: &Credentials) -> ClientResult<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Creates a client with explicit options.
    pub fn with_options(credentials: &Credentials, options: ClientOptions) -> ClientResult<Self> {
        let builder = EnvelopeBuilder::new(credentials)?;
        let decoder = ResponseDecoder::new(builder.cipher().clone());
        let transport = HttpTransport::new(credentials.gateway_url(), options.timeout)?;

        debug!(
            url = credentials.gateway_url(),
            timeout = ?options.timeout,
            "created gateway client"
        );

        Ok(Self {
            builder,
            decoder,
            errors: options.error_mapper,
            transport,
        })
    }

    /// Creates a client from a loaded configuration.
    ///
    /// The configuration is validated first.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        config.validate()?;
        let credentials = config.credentials()?;
        let options = ClientOptions {
            timeout: Duration::from_secs(config.gateway.timeout_secs),
            error_mapper: config.error_mapper(),
        };
        Self::with_options(&credentials, options)
    }

    /// The gateway URL.
    pub fn gateway_url(&self) -> &str {
        self.transport.url()
    }

    /// Sends one business request.
    ///
    /// `request_json` is encrypted as-is; `method` names the gateway method.
    /// A fresh envelope (timestamp, ciphertext, signature) is built on every
    /// call, so retrying means calling `send` again.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] / [`ClientError::Timeout`] when the
    ///   exchange fails
    /// - [`ClientError::Protocol`] when the envelope cannot be built or the
    ///   reply cannot be decoded
    /// - [`ClientError::Gateway`] when `errcode` is not `"0"`
    pub async fn send(
        &self,
        access_token: &str,
        request_json: &str,
        method: &str,
    ) -> ClientResult<GatewayReply> {
        let envelope = self.builder.build(method, access_token, request_json)?;
        let raw = self.transport.post_form(envelope.to_form_body()).await?;
        let decoded = self.decoder.decode(&raw)?;

        if !decoded.is_success() {
            let message = self.errors.message(&decoded.errcode);
            warn!(method, errcode = %decoded.errcode, %message, "gateway call failed");
            return Err(ClientError::Gateway {
                code: decoded.errcode,
                message,
            });
        }

        debug!(method, payload_len = decoded.payload.len(), "gateway call succeeded");
        Ok(GatewayReply {
            errcode: decoded.errcode,
            payload: decoded.payload,
        })
    }

    /// Like [`send`](Self::send), but gives up after `deadline`.
    ///
    /// The in-flight HTTP exchange is dropped when the deadline passes.
    pub async fn send_with_timeout(
        &self,
        access_token: &str,
        request_json: &str,
        method: &str,
        deadline: Duration,
    ) -> ClientResult<GatewayReply> {
        tokio::time::timeout(deadline, self.send(access_token, request_json, method))
            .await
            .map_err(|_| {
                warn!(method, ?deadline, "gateway call exceeded deadline");
                ClientError::Timeout(deadline)
            })?
    }
}
