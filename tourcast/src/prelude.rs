//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tourcast::prelude::*;
//! ```

pub use crate::agent::{Agent, AgentReply, OutputSchema};
pub use crate::audio::{
    AudioFormat, SharedSpeechProvider, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice,
};
pub use crate::chat::{
    ChatProvider, ChatRequest, ChatResponse, ResponseFormat, SharedChatProvider, StopReason,
};
pub use crate::config::{ConfigIssue, IssueLevel, ModelsConfig, TourConfig};
pub use crate::error::{Error, LlmError, LlmErrorKind, LlmResult, Result, Stage};
pub use crate::llms::{OpenAI, OpenAIConfig};
pub use crate::message::{Message, Role};
pub use crate::render::{SpeechRenderer, suggested_file_name};
pub use crate::tour::{
    BudgetStrategy, FinalTour, Interest, Interests, LengthPolicy, SectionContent, TimeAllocation,
    TourBudget, TourOutcome, TourPipeline, TourRequest, WordWindow,
};
pub use crate::usage::Usage;
