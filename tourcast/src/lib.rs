//! Tourcast - personalized audio tours from language models
//!
//! A planner, four specialist narrators (architecture, history, culture,
//! culinary) and an orchestrator are driven through a chat completion API to
//! write a spoken tour of a location sized to the requested duration. The
//! result is then rendered to speech.
//!
//! ```rust,ignore
//! use tourcast::prelude::*;
//!
//! let config = TourConfig::default().with_env();
//! let pipeline = TourPipeline::from_config(config)?;
//! let request = TourRequest::from_labels("Paris", ["History", "Architecture"], 10)?;
//! let outcome = pipeline.run(&request).await?;
//! println!("{}", outcome.text());
//! ```

pub mod agent;
pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod render;
pub mod tour;
pub mod usage;

pub use error::{Error, LlmError, Result};
