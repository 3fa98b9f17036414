//! LLM backend implementations.
//!
//! # Available Backends
//!
//! - [`openai`] - OpenAI API (chat completions and speech)
//! - [`mock`] - Scripted providers for tests and offline runs

pub mod mock;
pub mod openai;

pub use openai::{OpenAI, OpenAIConfig};
