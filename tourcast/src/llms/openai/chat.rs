//! `ChatProvider` over `/chat/completions`.

use async_trait::async_trait;
use tracing::debug;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::error::{LlmError, LlmResult};
use crate::message::{Message, Role};

use super::client::OpenAI;
use super::types::CompletionReply;

impl OpenAI {
    /// Keeps the first choice; the tour roles never ask for more than one.
    pub(crate) fn parse_response(reply: CompletionReply) -> LlmResult<ChatResponse> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::response_format("at least one choice", "empty choices"))?;

        Ok(ChatResponse {
            message: Message {
                role: Role::Assistant,
                content: choice.message.content,
                refusal: choice.message.refusal,
            },
            stop_reason: choice
                .finish_reason
                .as_deref()
                .map_or(StopReason::Stop, StopReason::parse),
            usage: reply.usage,
            model: reply.model,
            id: reply.id,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        let body = self.chat_body(request);
        debug!(
            model = body.model,
            messages = body.messages.len(),
            schema = request.schema_name().unwrap_or("-"),
            web_search = request.web_search,
            "sending chat completion"
        );

        let text = self.send(&self.chat_url(), &body).await?.text().await?;
        let reply: CompletionReply = serde_json::from_str(&text).map_err(|e| {
            LlmError::response_format("chat completion JSON", format!("{e}: {text}"))
        })?;

        Self::parse_response(reply)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        self.model()
    }
}
