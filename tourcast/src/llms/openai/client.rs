//! HTTP plumbing shared by the chat and speech endpoints.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;

use crate::chat::ChatRequest;
use crate::error::{Error, LlmError, LlmResult, Result};

use super::config::OpenAIConfig;
use super::types::{ChatBody, ErrorEnvelope};

const PROVIDER: &str = "openai";

/// OpenAI API client.
///
/// Implements [`ChatProvider`](crate::chat::ChatProvider) and
/// [`TextToSpeechProvider`](crate::audio::TextToSpeechProvider). Cloning is
/// cheap; the configuration and connection pool are shared.
#[derive(Debug, Clone)]
pub struct OpenAI {
    config: Arc<OpenAIConfig>,
    client: Client,
}

impl OpenAI {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is blank or the HTTP client
    /// cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config("OpenAI API key is required"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// API root in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Model used when a request does not name one.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub(crate) fn chat_url(&self) -> String {
        self.endpoint("chat/completions")
    }

    pub(crate) fn speech_url(&self) -> String {
        self.endpoint("audio/speech")
    }

    /// Authenticated POST of `body` as JSON.
    fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> RequestBuilder {
        let mut req = self.client.post(url).bearer_auth(&self.config.api_key).json(body);
        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }
        req
    }

    /// Sends `body` to `url` and turns non-2xx statuses into [`LlmError`]s.
    pub(crate) async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> LlmResult<Response> {
        let response = self.post(url, body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(Self::parse_error(status.as_u16(), &text))
    }

    pub(crate) fn chat_body<'a>(&'a self, request: &'a ChatRequest) -> ChatBody<'a> {
        ChatBody {
            model: if request.model.is_empty() {
                self.config.model.as_str()
            } else {
                request.model.as_str()
            },
            messages: &request.messages,
            max_completion_tokens: request.max_completion_tokens,
            temperature: request.temperature,
            response_format: request.response_format.as_ref(),
            web_search_options: request.web_search.then(|| serde_json::json!({})),
            user: request.user.as_deref(),
        }
    }

    /// Maps an error status and body to an [`LlmError`].
    pub(crate) fn parse_error(status: u16, body: &str) -> LlmError {
        let Ok(ErrorEnvelope { error }) = serde_json::from_str::<ErrorEnvelope>(body) else {
            return LlmError::http_status(status, body);
        };
        match status {
            401 | 403 => LlmError::auth(PROVIDER, error.message),
            429 => LlmError::rate_limited(PROVIDER),
            400 => LlmError::invalid_request(error.message),
            _ => {
                let code = error
                    .code
                    .or(error.kind)
                    .unwrap_or_else(|| status.to_string());
                LlmError::provider_code(PROVIDER, code, error.message)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::chat::ResponseFormat;
    use crate::error::LlmErrorKind;

    fn client() -> OpenAI {
        OpenAI::new(OpenAIConfig::new("sk-test").with_base_url("http://localhost:9/v1/")).unwrap()
    }

    #[test]
    fn rejects_empty_api_key() {
        let err = OpenAI::new(OpenAIConfig::new("  ")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn urls_ignore_trailing_slash() {
        let client = client();
        assert_eq!(client.chat_url(), "http://localhost:9/v1/chat/completions");
        assert_eq!(client.speech_url(), "http://localhost:9/v1/audio/speech");
    }

    #[test]
    fn body_uses_default_model_and_web_search() {
        let client = client();
        let request = ChatRequest::new("")
            .system("Be a guide.")
            .user("hi")
            .web_search(true)
            .response_format(ResponseFormat::json_schema(
                "narrative",
                serde_json::json!({"type": "object"}),
            ));
        let body = serde_json::to_value(client.chat_body(&request)).unwrap();

        assert_eq!(body["model"], OpenAIConfig::DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["web_search_options"], serde_json::json!({}));
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "narrative");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn body_omits_web_search_when_disabled() {
        let client = client();
        let request = ChatRequest::new("gpt-4o");
        let body = serde_json::to_value(client.chat_body(&request)).unwrap();
        assert!(body.get("web_search_options").is_none());
        assert_eq!(body["model"], "gpt-4o");
    }

    #[test]
    fn parse_error_maps_status() {
        let body = r#"{"error": {"message": "Incorrect API key", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        assert_eq!(OpenAI::parse_error(401, body).kind, LlmErrorKind::Auth);
        assert_eq!(OpenAI::parse_error(429, body).kind, LlmErrorKind::RateLimited);
        assert_eq!(
            OpenAI::parse_error(400, body).kind,
            LlmErrorKind::InvalidRequest
        );

        let err = OpenAI::parse_error(503, body);
        assert_eq!(err.kind, LlmErrorKind::Provider);
        assert_eq!(err.code.as_deref(), Some("invalid_api_key"));
    }

    #[test]
    fn parse_error_falls_back_to_status() {
        let err = OpenAI::parse_error(502, "<html>bad gateway</html>");
        assert_eq!(err.kind, LlmErrorKind::HttpStatus);
        assert_eq!(err.code.as_deref(), Some("502"));
    }
}
