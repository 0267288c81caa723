//! Gateway credentials.

/// Static configuration needed to talk to one TSM gateway.
///
/// Built once when the client is constructed and shared read-only by every
/// call afterwards. The key material is opaque here; it is only decoded by
/// [`SymmetricCipher`](crate::SymmetricCipher) and
/// [`RequestSigner`](crate::RequestSigner).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    gateway_url: String,
    app_key: String,
    symmetric_key_b64: String,
    private_key_pem: String,
}

impl Credentials {
    /// Creates a new set of credentials.
    pub fn new(
        gateway_url: impl Into<String>,
        app_key: impl Into<String>,
        symmetric_key_b64: impl Into<String>,
        private_key_pem: impl Into<String>,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            app_key: app_key.into(),
            symmetric_key_b64: symmetric_key_b64.into(),
            private_key_pem: private_key_pem.into(),
        }
    }

    /// The URL every envelope is POSTed to.
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// The application key sent as `app_key`.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Base64 encoding of the 24-byte Triple-DES key.
    pub fn symmetric_key_b64(&self) -> &str {
        &self.symmetric_key_b64
    }

    /// PKCS#8 PEM encoding of the RSA signing key.
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("gateway_url", &self.gateway_url)
            .field("app_key", &self.app_key)
            .field("symmetric_key_b64", &"[REDACTED]")
            .field("private_key_pem", &"[REDACTED]")
            .finish()
    }
}
