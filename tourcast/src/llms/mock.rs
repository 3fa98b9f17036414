//! Scripted providers for testing.
//!
//! [`MockChat`] answers chat requests through a closure (or a fixed rotation
//! of replies) and records every request it sees, so tests can assert on
//! prompts, call counts and ordering without making real API calls.
//! [`MockSpeech`] does the same for text-to-speech.
//!
//! # Example
//!
//! ```rust,ignore
//! use tourcast::llms::mock::MockChat;
//!
//! let chat = MockChat::with_responses(vec![r#"{"output": "Hello!"}"#.to_owned()]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::audio::{SpeechRequest, SpeechResponse, TextToSpeechProvider};
use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{LlmError, LlmResult};

type ChatHandler = dyn Fn(&ChatRequest) -> LlmResult<ChatResponse> + Send + Sync;

/// A chat provider driven by a closure.
pub struct MockChat {
    handler: Box<ChatHandler>,
    calls: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl MockChat {
    /// Creates a mock that answers every request with `handler`.
    #[must_use]
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ChatRequest) -> LlmResult<ChatResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Creates a mock returning predefined texts in sequence, cycling through them.
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        let index = AtomicUsize::new(0);
        Self::new(move |_| {
            if responses.is_empty() {
                return Err(LlmError::internal("mock has no responses"));
            }
            let i = index.fetch_add(1, Ordering::SeqCst) % responses.len();
            Ok(ChatResponse::from_text(responses[i].clone()))
        })
    }

    /// Creates a mock whose every call fails with `error`.
    #[must_use]
    pub fn failing(error: LlmError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Waits `delay` before answering each request.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the requests whose structured output schema is `name`.
    #[must_use]
    pub fn calls_for_schema(&self, name: &str) -> Vec<ChatRequest> {
        self.calls()
            .into_iter()
            .filter(|r| r.schema_name() == Some(name))
            .collect()
    }
}

impl fmt::Debug for MockChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockChat")
            .field("calls", &self.call_count())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn chat(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(request)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}

/// A speech provider returning fixed bytes or a fixed error.
#[derive(Debug)]
pub struct MockSpeech {
    result: LlmResult<Vec<u8>>,
    calls: Mutex<Vec<SpeechRequest>>,
}

impl MockSpeech {
    /// Creates a mock that returns `audio` for every request.
    #[must_use]
    pub const fn new(audio: Vec<u8>) -> Self {
        Self {
            result: Ok(audio),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock whose every call fails with `error`.
    #[must_use]
    pub const fn failing(error: LlmError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<SpeechRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextToSpeechProvider for MockSpeech {
    async fn speech(&self, request: &SpeechRequest) -> LlmResult<SpeechResponse> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.result
            .clone()
            .map(|audio| SpeechResponse::new(audio, request.response_format))
    }
}
