//! Structured-output agents.
//!
//! An [`Agent`] is a named role: system instructions, a model, an
//! [`OutputSchema`] the reply must satisfy, and an optional web search flag.
//! Running an agent sends one chat request through a [`ChatProvider`] and
//! deserializes the reply text into a concrete Rust type.
//!
//! # Example
//!
//! ```rust,ignore
//! use tourcast::agent::{Agent, OutputSchema};
//!
//! #[derive(serde::Deserialize, schemars::JsonSchema)]
//! struct Reply {
//!     output: String,
//! }
//!
//! let agent = Agent::new("HistoryAgent", OutputSchema::from_type::<Reply>())
//!     .instructions("You are the History agent for a self-guided audio tour system.")
//!     .model("gpt-4o-mini");
//!
//! let reply = agent.run::<Reply>(&provider, "Location: Rome").await?;
//! println!("{}", reply.output.output);
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::chat::{ChatProvider, ChatRequest, JsonSchemaSpec, ResponseFormat, generate_json_schema};
use crate::error::{LlmError, LlmResult};
use crate::usage::Usage;

/// Schema specification for structured agent output.
///
/// Every request an agent sends carries this schema as its
/// `response_format`, constraining the model to reply with matching JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    name: String,
    schema: Value,
    strict: bool,
}

impl OutputSchema {
    /// Creates a new output schema with strict mode enabled.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }

    /// Creates an output schema from a type deriving [`schemars::JsonSchema`].
    ///
    /// The schema name is the type name.
    #[must_use]
    pub fn from_type<T: schemars::JsonSchema>() -> Self {
        let (name, schema) = generate_json_schema::<T>();
        Self::new(name, schema)
    }

    /// Creates an output schema from a type, overriding the schema name.
    #[must_use]
    pub fn named<T: schemars::JsonSchema>(name: impl Into<String>) -> Self {
        let (_, schema) = generate_json_schema::<T>();
        Self::new(name, schema)
    }

    /// Sets strict mode.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the JSON Schema definition.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns whether strict mode is enabled.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Converts this into a [`ResponseFormat`] for a [`ChatRequest`].
    #[must_use]
    pub fn to_response_format(&self) -> ResponseFormat {
        if self.strict {
            ResponseFormat::json_schema(&self.name, self.schema.clone())
        } else {
            ResponseFormat::JsonSchema {
                json_schema: JsonSchemaSpec {
                    name: self.name.clone(),
                    schema: self.schema.clone(),
                    strict: Some(false),
                },
            }
        }
    }
}

/// A parsed agent reply.
#[derive(Debug, Clone)]
pub struct AgentReply<T> {
    /// The deserialized output.
    pub output: T,
    /// The raw reply text, kept for follow-up turns.
    pub raw: String,
    /// Token usage reported by the provider.
    pub usage: Option<Usage>,
}

/// A named role with fixed instructions and a structured output contract.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    instructions: String,
    model: String,
    output: OutputSchema,
    web_search: bool,
    temperature: Option<f32>,
}

impl Agent {
    /// Creates an agent with no instructions that uses the provider's default model.
    #[must_use]
    pub fn new(name: impl Into<String>, output: OutputSchema) -> Self {
        Self {
            name: name.into(),
            instructions: String::new(),
            model: String::new(),
            output,
            web_search: false,
            temperature: None,
        }
    }

    /// Sets the system instructions.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Enables or disables web search grounding.
    #[must_use]
    pub const fn web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Returns the agent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the system instructions.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.instructions
    }

    /// Returns the configured model (empty means provider default).
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model
    }

    /// Returns the output schema.
    #[must_use]
    pub const fn output_schema(&self) -> &OutputSchema {
        &self.output
    }

    /// Returns whether web search grounding is enabled.
    #[must_use]
    pub const fn uses_web_search(&self) -> bool {
        self.web_search
    }

    /// Builds the single-turn request for `input`.
    #[must_use]
    pub fn request(&self, input: impl Into<String>) -> ChatRequest {
        let mut request = ChatRequest::new(&self.model);
        if !self.instructions.is_empty() {
            request = request.system(&self.instructions);
        }
        let mut request = request
            .user(input)
            .response_format(self.output.to_response_format())
            .web_search(self.web_search);
        request.temperature = self.temperature;
        request
    }

    /// Runs the agent on `input` and parses the reply into `T`.
    ///
    /// # Errors
    ///
    /// Returns the provider error, or a [`ResponseFormat`](crate::error::LlmErrorKind::ResponseFormat)
    /// error when the model refuses, truncates, or replies with JSON that does
    /// not match `T`.
    pub async fn run<T: DeserializeOwned>(
        &self,
        provider: &dyn ChatProvider,
        input: impl Into<String> + Send,
    ) -> LlmResult<AgentReply<T>> {
        self.send(provider, &self.request(input)).await
    }

    /// Sends a prepared request (for example a follow-up turn built from
    /// [`Agent::request`]) and parses the reply into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Agent::run`].
    pub async fn send<T: DeserializeOwned>(
        &self,
        provider: &dyn ChatProvider,
        request: &ChatRequest,
    ) -> LlmResult<AgentReply<T>> {
        debug!(
            agent = %self.name,
            provider = provider.provider_name(),
            messages = request.messages.len(),
            "running agent"
        );

        let response = provider.chat(request).await?;

        if let Some(refusal) = response.message.refusal.as_deref() {
            return Err(LlmError::response_format(
                format!("{} output", self.output.name()),
                format!("refusal: {refusal}"),
            ));
        }
        if response.is_truncated() {
            return Err(LlmError::response_format(
                format!("complete {} output", self.output.name()),
                "reply truncated at the token limit",
            ));
        }
        let raw = response
            .text()
            .ok_or_else(|| LlmError::response_format("text content", "empty message"))?
            .to_owned();

        let output = serde_json::from_str(&raw)?;

        if let Some(usage) = &response.usage {
            info!(
                agent = %self.name,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "agent completed"
            );
        }

        Ok(AgentReply {
            output,
            raw,
            usage: response.usage,
        })
    }
}
