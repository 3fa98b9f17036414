//! Unified error types for tourcast.
//!
//! This module provides the error hierarchy used across the crate:
//! - Request validation errors, raised before any external call
//! - Generation errors, tagged with the pipeline stage that failed
//! - Speech rendering errors, which never discard already generated text
//! - Provider errors ([`LlmError`]) shared by chat and speech backends

use std::fmt;

use crate::tour::Interest;

/// Result type alias for tourcast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for provider operations.
pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// The main error type for tourcast.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The tour request was rejected before any external call.
    #[error("Invalid tour request: {0}")]
    InvalidRequest(String),

    /// A planner, specialist or orchestrator call failed.
    #[error("Generation failed at {stage}: {source}")]
    Generation {
        /// The pipeline stage that failed.
        stage: Stage,
        /// The underlying provider error.
        #[source]
        source: LlmError,
    },

    /// Speech rendering failed.
    #[error("Speech rendering failed: {0}")]
    Render(#[source] LlmError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a generation error for the given stage.
    #[must_use]
    pub const fn generation(stage: Stage, source: LlmError) -> Self {
        Self::Generation { stage, source }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns `true` if the request was rejected during validation.
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Returns `true` if a text generation stage failed.
    #[must_use]
    pub const fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Returns `true` if speech rendering failed.
    #[must_use]
    pub const fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }

    /// Returns the failed stage for generation errors.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Generation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A stage of the tour pipeline that talks to a language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Time allocation planning.
    Planner,
    /// Narrative generation for one interest.
    Specialist(Interest),
    /// Final tour assembly.
    Orchestrator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planner => f.write_str("planner"),
            Self::Specialist(interest) => write!(f, "{} specialist", interest.key()),
            Self::Orchestrator => f.write_str("orchestrator"),
        }
    }
}

/// Error type for LLM and speech provider operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LlmError {
    /// The error kind.
    pub kind: LlmErrorKind,
    /// The provider name (e.g., "openai", "mock").
    pub provider: Option<String>,
    /// Additional error message.
    pub message: String,
    /// Optional error code from the provider.
    pub code: Option<String>,
}

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LlmErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// Rate limit exceeded.
    RateLimited,
    /// Invalid request parameters.
    InvalidRequest,
    /// Response did not match the expected shape.
    ResponseFormat,
    /// Network or connection error.
    Network,
    /// The call did not finish in time.
    Timeout,
    /// HTTP status error.
    HttpStatus,
    /// Provider-specific error.
    Provider,
    /// Internal error.
    Internal,
}

impl LlmError {
    const fn with_kind(kind: LlmErrorKind, message: String) -> Self {
        Self {
            kind,
            provider: None,
            message,
            code: None,
        }
    }

    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::with_kind(LlmErrorKind::Auth, message.into())
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::with_kind(
                LlmErrorKind::RateLimited,
                "Rate limit exceeded. Please retry after some time.".into(),
            )
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::InvalidRequest, message.into())
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::with_kind(
            LlmErrorKind::ResponseFormat,
            format!("Expected {}, got {}", expected.into(), got.into()),
        )
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Network, message.into())
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(what: impl fmt::Display, secs: u64) -> Self {
        Self::with_kind(
            LlmErrorKind::Timeout,
            format!("{what} did not complete within {secs}s"),
        )
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            code: Some(status.to_string()),
            ..Self::with_kind(
                LlmErrorKind::HttpStatus,
                format!("HTTP {status}: {}", body.into()),
            )
        }
    }

    /// Create a provider-specific error.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::with_kind(LlmErrorKind::Provider, message.into())
        }
    }

    /// Create a provider error with an error code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            code: Some(code.into()),
            ..Self::with_kind(LlmErrorKind::Provider, message.into())
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Internal, message.into())
    }

    /// Check if this is a retryable error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            LlmErrorKind::RateLimited | LlmErrorKind::Network | LlmErrorKind::Timeout
        )
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::with_kind(LlmErrorKind::Timeout, "Request timed out".into())
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::response_format("JSON matching the output schema", err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod error {
        use super::*;

        #[test]
        fn invalid_request_creates_error() {
            let err = Error::invalid_request("location must not be empty");
            assert!(err.is_invalid_request());
            assert!(err.to_string().contains("location must not be empty"));
        }

        #[test]
        fn generation_carries_stage() {
            let err = Error::generation(
                Stage::Specialist(Interest::History),
                LlmError::network("reset"),
            );
            assert!(err.is_generation());
            assert_eq!(err.stage(), Some(Stage::Specialist(Interest::History)));
            assert!(err.to_string().contains("history specialist"));
            assert!(err.to_string().contains("reset"));
        }

        #[test]
        fn render_is_distinguishable() {
            let err = Error::Render(LlmError::http_status(500, "boom"));
            assert!(err.is_render());
            assert!(!err.is_generation());
            assert!(err.stage().is_none());
        }

        #[test]
        fn from_io_error() {
            let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
            let err: Error = io_err.into();
            assert!(matches!(err, Error::Io(_)));
        }

        #[test]
        fn from_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }

        #[test]
        fn source_chain_reaches_llm_error() {
            use std::error::Error as _;

            let err = Error::generation(Stage::Planner, LlmError::auth("openai", "bad key"));
            let source = err.source().unwrap();
            assert!(source.to_string().contains("[openai] bad key"));
        }
    }

    mod stage {
        use super::*;

        #[test]
        fn display_names() {
            assert_eq!(Stage::Planner.to_string(), "planner");
            assert_eq!(Stage::Orchestrator.to_string(), "orchestrator");
            assert_eq!(
                Stage::Specialist(Interest::Culinary).to_string(),
                "culinary specialist"
            );
        }
    }

    mod llm_error {
        use super::*;

        #[test]
        fn auth_creates_error() {
            let err = LlmError::auth("openai", "Invalid API key");
            assert_eq!(err.kind, LlmErrorKind::Auth);
            assert_eq!(err.provider.as_deref(), Some("openai"));
            assert!(err.message.contains("Invalid API key"));
            assert!(err.code.is_none());
        }

        #[test]
        fn rate_limited_creates_error() {
            let err = LlmError::rate_limited("openai");
            assert_eq!(err.kind, LlmErrorKind::RateLimited);
            assert!(err.message.contains("Rate limit"));
        }

        #[test]
        fn response_format_creates_error() {
            let err = LlmError::response_format("json", "text");
            assert_eq!(err.kind, LlmErrorKind::ResponseFormat);
            assert!(err.message.contains("json"));
            assert!(err.message.contains("text"));
        }

        #[test]
        fn timeout_mentions_seconds() {
            let err = LlmError::timeout(Stage::Orchestrator, 30);
            assert_eq!(err.kind, LlmErrorKind::Timeout);
            assert!(err.message.contains("orchestrator"));
            assert!(err.message.contains("30s"));
        }

        #[test]
        fn http_status_creates_error() {
            let err = LlmError::http_status(429, "Too Many Requests");
            assert_eq!(err.kind, LlmErrorKind::HttpStatus);
            assert!(err.message.contains("429"));
            assert_eq!(err.code.as_deref(), Some("429"));
        }

        #[test]
        fn provider_code_creates_error() {
            let err = LlmError::provider_code("openai", "model_not_found", "gpt-5 not available");
            assert_eq!(err.kind, LlmErrorKind::Provider);
            assert_eq!(err.code.as_deref(), Some("model_not_found"));
        }

        #[test]
        fn retryable_kinds() {
            assert!(LlmError::rate_limited("openai").is_retryable());
            assert!(LlmError::network("timeout").is_retryable());
            assert!(LlmError::timeout("call", 1).is_retryable());
            assert!(!LlmError::auth("openai", "bad key").is_retryable());
            assert!(!LlmError::internal("bug").is_retryable());
        }

        #[test]
        fn display_with_provider_and_code() {
            let err = LlmError::provider_code("openai", "server_error", "oops");
            let s = err.to_string();
            assert!(s.starts_with("[openai] "));
            assert!(s.contains("(code: server_error)"));
        }

        #[test]
        fn display_without_provider() {
            let s = LlmError::network("timeout").to_string();
            assert!(!s.contains('['));
            assert!(s.contains("timeout"));
        }

        #[test]
        fn from_serde_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: LlmError = json_err.into();
            assert_eq!(err.kind, LlmErrorKind::ResponseFormat);
        }
    }
}
