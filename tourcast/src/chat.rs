//! Chat types and the provider trait behind every tour role.
//!
//! This module provides:
//! - [`ChatRequest`]: Request parameters for chat completions
//! - [`ChatResponse`]: Response from chat completions
//! - [`ChatProvider`]: Core trait for LLM providers
//!
//! # Example
//!
//! ```rust,ignore
//! use tourcast::prelude::*;
//!
//! let request = ChatRequest::new("gpt-4o-mini")
//!     .system("You are a tour guide.")
//!     .user("Describe the Louvre.")
//!     .temperature(0.7);
//!
//! let response = provider.chat(&request).await?;
//! println!("{}", response.text().unwrap_or_default());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LlmResult;
use crate::message::Message;
use crate::usage::Usage;

/// A chat completion request to an LLM.
///
/// Aligns with the parameters of OpenAI's Chat Completions API that the tour
/// roles need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4o-mini"). Empty means provider default.
    #[serde(default)]
    pub model: String,

    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Maximum completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,

    /// Sampling temperature (0.0 to 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Response format specification (for JSON mode / structured outputs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Ask search-capable models to ground the answer in live web results.
    #[serde(default)]
    pub web_search: bool,

    /// User identifier for tracking and abuse detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatRequest {
    /// Creates a new request with the specified model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Adds a system message.
    #[must_use]
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Adds an assistant message.
    #[must_use]
    pub fn assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Sets max completion tokens.
    #[must_use]
    pub const fn max_completion_tokens(mut self, tokens: u32) -> Self {
        self.max_completion_tokens = Some(tokens);
        self
    }

    /// Sets temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets response format.
    #[must_use]
    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Enables or disables web search grounding.
    #[must_use]
    pub const fn web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    /// Sets user identifier.
    #[must_use]
    pub fn user_id(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Returns the schema name of a structured output request, if any.
    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        match self.response_format.as_ref()? {
            ResponseFormat::JsonSchema { json_schema } => Some(&json_schema.name),
            _ => None,
        }
    }

    /// Returns the concatenated text of all user messages.
    #[must_use]
    pub fn user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == crate::message::Role::User)
            .filter_map(Message::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Response format specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response.
    Text,
    /// JSON object response.
    JsonObject,
    /// JSON response with schema (structured outputs).
    JsonSchema {
        /// Schema definition.
        json_schema: JsonSchemaSpec,
    },
}

impl ResponseFormat {
    /// Creates a JSON object format.
    #[must_use]
    pub const fn json() -> Self {
        Self::JsonObject
    }

    /// Creates a strict JSON schema format.
    #[must_use]
    pub fn json_schema(name: impl Into<String>, schema: Value) -> Self {
        Self::JsonSchema {
            json_schema: JsonSchemaSpec {
                name: name.into(),
                schema,
                strict: Some(true),
            },
        }
    }
}

/// Generate a strict-mode JSON Schema from a Rust type that implements
/// [`schemars::JsonSchema`].
///
/// Returns `(name, schema)` where `name` is the type name. The `$schema` meta
/// field and `format` annotations are removed and every object is closed with
/// `additionalProperties: false`, which strict structured outputs require.
#[must_use]
pub fn generate_json_schema<T: schemars::JsonSchema>() -> (String, Value) {
    let root = schemars::schema_for!(T);
    let mut schema_value = serde_json::to_value(&root).unwrap_or_default();

    if let Value::Object(ref mut map) = schema_value {
        map.remove("$schema");
    }
    make_strict(&mut schema_value);

    let name = <T as schemars::JsonSchema>::schema_name();
    (name.into_owned(), schema_value)
}

/// Keywords whose value maps names to subschemas.
const SCHEMA_MAPS: [&str; 4] = ["properties", "patternProperties", "$defs", "definitions"];

/// Keywords whose value is data rather than a schema.
const DATA_KEYWORDS: [&str; 4] = ["enum", "const", "default", "examples"];

fn make_strict(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            map.remove("format");
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_owned(), Value::Bool(false));
            }
            for (key, child) in map.iter_mut() {
                if SCHEMA_MAPS.contains(&key.as_str()) {
                    if let Value::Object(named) = child {
                        named.values_mut().for_each(make_strict);
                    }
                } else if !DATA_KEYWORDS.contains(&key.as_str()) {
                    make_strict(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(make_strict),
        _ => {}
    }
}

/// JSON schema specification for structured outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchemaSpec {
    /// Schema name.
    pub name: String,
    /// JSON Schema definition.
    pub schema: Value,
    /// Whether to enforce strict validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural stop (end of response).
    #[default]
    Stop,
    /// Maximum token limit reached.
    Length,
    /// Content was filtered by safety systems.
    ContentFilter,
}

impl StopReason {
    /// Parse an OpenAI `finish_reason`; unknown values map to [`StopReason::Stop`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }
}

/// A chat completion response from an LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message.
    pub message: Message,

    /// Why the model stopped generating.
    pub stop_reason: StopReason,

    /// Token usage statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model identifier used for this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Unique completion ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChatResponse {
    /// Creates a new response with a message.
    #[must_use]
    pub const fn new(message: Message) -> Self {
        Self {
            message,
            stop_reason: StopReason::Stop,
            usage: None,
            model: None,
            id: None,
        }
    }

    /// Creates a response from text content.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(Message::assistant(content))
    }

    /// Sets the stop reason.
    #[must_use]
    pub const fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self
    }

    /// Sets usage statistics.
    #[must_use]
    pub const fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Returns the text content of the response.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.text()
    }

    /// Deserialize the response text into a concrete Rust type.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the response has no text content
    /// or if the text cannot be deserialized into `T`.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(self.text().unwrap_or_default())
    }

    /// Returns `true` if the response was truncated due to length.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::Length
    }
}

/// Trait for providers that support chat completions.
///
/// Every tour role (planner, specialists, orchestrator) goes through this
/// trait, so tests can swap the network for a scripted provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat completion request and receive a complete response.
    async fn chat(&self, request: &ChatRequest) -> LlmResult<ChatResponse>;

    /// Provider name used in logs and errors.
    fn provider_name(&self) -> &'static str;

    /// Model used when a request leaves `model` empty.
    fn default_model(&self) -> &str;
}

/// A shareable chat provider handle.
pub type SharedChatProvider = Arc<dyn ChatProvider>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Sample {
        title: String,
        minutes: f64,
    }

    #[test]
    fn builder_appends_messages_in_order() {
        let request = ChatRequest::new("gpt-4o-mini")
            .system("sys")
            .user("first")
            .assistant("reply")
            .user("second");
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.user_text(), "first\nsecond");
    }

    #[test]
    fn schema_name_only_for_json_schema() {
        let request = ChatRequest::new("m").response_format(ResponseFormat::json());
        assert!(request.schema_name().is_none());

        let request =
            ChatRequest::new("m").response_format(ResponseFormat::json_schema("x", Value::Null));
        assert_eq!(request.schema_name(), Some("x"));
    }

    #[test]
    fn generated_schema_is_strict() {
        let (name, schema) = generate_json_schema::<Sample>();
        assert_eq!(name, "Sample");
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        assert_eq!(schema["properties"]["title"]["type"], "string");
        assert_eq!(schema["properties"]["minutes"]["type"], "number");
        assert!(schema["properties"]["minutes"].get("format").is_none());
    }

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Clip {
        format: String,
        seconds: f32,
    }

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Playlist {
        format: String,
        clips: Vec<Clip>,
    }

    #[test]
    fn strict_schema_keeps_properties_named_format() {
        let (_, schema) = generate_json_schema::<Playlist>();
        assert_eq!(schema["properties"]["format"]["type"], "string");
        assert!(schema["required"].as_array().unwrap().contains(&Value::from("format")));

        let clip = &schema["$defs"]["Clip"];
        assert_eq!(clip["properties"]["format"]["type"], "string");
        assert!(clip["properties"]["seconds"].get("format").is_none());
        assert_eq!(clip["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn response_format_serializes_with_type_tag() {
        let format = ResponseFormat::json_schema("final_tour", serde_json::json!({}));
        let json = serde_json::to_value(&format).unwrap();
        assert_eq!(json["type"], "json_schema");
        assert_eq!(json["json_schema"]["name"], "final_tour");
        assert_eq!(json["json_schema"]["strict"], true);
    }

    #[test]
    fn parse_reads_structured_text() {
        let response = ChatResponse::from_text(r#"{"output": "Bonjour"}"#);
        let value: Value = response.parse().unwrap();
        assert_eq!(value["output"], "Bonjour");
        assert!(ChatResponse::default().parse::<Value>().is_err());
    }

    #[test]
    fn stop_reason_parse() {
        assert_eq!(StopReason::parse("length"), StopReason::Length);
        assert_eq!(StopReason::parse("content_filter"), StopReason::ContentFilter);
        assert_eq!(StopReason::parse("stop"), StopReason::Stop);
        assert_eq!(StopReason::parse("other"), StopReason::Stop);
    }
}
