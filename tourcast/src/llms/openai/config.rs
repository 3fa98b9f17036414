//! Connection settings for the OpenAI client.

use std::time::Duration;

/// Connection settings for [`OpenAI`](super::OpenAI).
///
/// Usually derived from [`TourConfig::openai_config`](crate::config::TourConfig::openai_config)
/// rather than built by hand.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Bearer token.
    pub api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model used when a request leaves its model empty.
    pub model: String,
    /// Sent as `OpenAI-Organization` when set.
    pub organization: Option<String>,
    /// HTTP-level timeout per request.
    pub timeout: Option<Duration>,
}

impl OpenAIConfig {
    /// Public API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Fallback chat model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Settings for `api_key` against the public API.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            organization: None,
            timeout: None,
        }
    }

    /// Points the client at another OpenAI-compatible server.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the fallback model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the organization header.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
