//! HTTP transport to the gateway.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, warn};
use tsm_protocol::FORM_CONTENT_TYPE;

use crate::error::{ClientError, ClientResult};

const USER_AGENT_VALUE: &str = concat!("tsm-client/", env!("CARGO_PKG_VERSION"));

/// Posts form-encoded envelopes to one gateway URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport whose requests expire after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// The gateway URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client-wide timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POSTs `body` and returns the full response body.
    ///
    /// The HTTP status is not interpreted; gateways report failures through
    /// `errcode` in the body, so a non-2xx body is returned like any other.
    pub async fn post_form(&self, body: String) -> ClientResult<String> {
        debug!(url = %self.url, body_len = body.len(), "posting envelope");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "gateway returned non-success HTTP status");
        }

        let text = response.text().await.map_err(|e| self.map_error(e))?;
        debug!(%status, body_len = text.len(), "gateway replied");
        Ok(text)
    }

    fn map_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT_VALUE.starts_with("tsm-client/"));
    }

    #[test]
    fn test_transport_accessors() {
        let transport =
            HttpTransport::new("http://127.0.0.1:9/tsm", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.url(), "http://127.0.0.1:9/tsm");
        assert_eq!(transport.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // Port 9 (discard) is not expected to accept connections in the test environment.
        let transport =
            HttpTransport::new("http://127.0.0.1:9/tsm", Duration::from_secs(5)).unwrap();
        let err = transport.post_form("a=b".to_string()).await.unwrap_err();
        assert!(err.is_transport());
    }
}
