//! OpenAI API client implementation.
//!
//! This module provides a client for the OpenAI API, supporting:
//! - Chat completions with structured outputs and optional web search
//! - Text-to-Speech (TTS)

mod audio;
mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
