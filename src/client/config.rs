//! Client configuration options.

use std::path::PathBuf;
use std::time::Duration;

use crate::Result;

/// Cloud surface of the Web API.
pub const CLOUD_BASE_URL: &str = "https://api.ibkr.com/v1/api";

/// Local Client Portal Gateway surface.
pub const GATEWAY_BASE_URL: &str = "https://localhost:5000/v1/api";

/// Configuration for [`IbkrClient`](crate::IbkrClient).
///
/// # Example
///
/// ```
/// use ibkr_rs::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Base URL of the cloud API surface
    pub cloud_base: String,
    /// Base URL of the local gateway surface, tried first for session init
    pub gateway_base: String,
    /// Token persistence path; `None` falls back to the default dotfile
    pub token_path: Option<PathBuf>,
    /// Whether to persist tokens at all
    pub persist_tokens: bool,
    /// Optional `oauth_verifier` for interactive flows
    pub oauth_verifier: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("ibkr-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            cloud_base: CLOUD_BASE_URL.to_string(),
            gateway_base: GATEWAY_BASE_URL.to_string(),
            token_path: None,
            persist_tokens: true,
            oauth_verifier: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the cloud base URL.
    pub fn with_cloud_base(mut self, base: impl Into<String>) -> Self {
        self.cloud_base = trim_trailing_slash(base.into());
        self
    }

    /// Override the local gateway base URL.
    pub fn with_gateway_base(mut self, base: impl Into<String>) -> Self {
        self.gateway_base = trim_trailing_slash(base.into());
        self
    }

    /// Set the token persistence path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Enable or disable token persistence.
    pub fn with_persist_tokens(mut self, enabled: bool) -> Self {
        self.persist_tokens = enabled;
        self
    }

    /// Attach an `oauth_verifier` for interactive flows.
    pub fn with_oauth_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.oauth_verifier = Some(verifier.into());
        self
    }

    /// Check that both base URLs parse.
    pub(crate) fn validate(&self) -> Result<()> {
        url::Url::parse(&self.cloud_base)?;
        url::Url::parse(&self.gateway_base)?;
        Ok(())
    }
}

fn trim_trailing_slash(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}
