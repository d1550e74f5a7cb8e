//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::ApiError;

/// Production endpoint of the Noraina API.
pub const DEFAULT_BASE_URL: &str = "https://nacp01.noraina.net/";

/// Request timeout applied when the caller's context has no deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL that relative API paths are resolved against.
    pub base_url: String,

    /// Fallback timeout for calls made with a deadline-free context.
    pub timeout: Option<Duration>,

    /// Value of the `user-agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            user_agent: format!("noraina-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables the fallback timeout; only context deadlines apply.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the base URL is empty, cannot be
    /// parsed, or does not use http(s).
    pub fn validate(&self) -> Result<(), ApiError> {
        self.parsed_base_url().map(|_| ())
    }

    /// Parses `base_url`, appending a trailing slash to its path when missing
    /// so that joined routes keep any path prefix.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::validate`].
    pub fn parsed_base_url(&self) -> Result<Url, ApiError> {
        if self.base_url.is_empty() {
            return Err(ApiError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidConfig(format!("base_url: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ApiError::InvalidConfig(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}
