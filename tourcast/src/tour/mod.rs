//! The tour domain: requests, budgets, roles and the pipeline tying them together.
//!
//! # Roles
//!
//! | Role         | Input                                   | Output             |
//! |--------------|-----------------------------------------|--------------------|
//! | Planner      | location, interests, duration           | [`TimeAllocation`] |
//! | Specialist   | location, interests, word limit         | [`SectionContent`] |
//! | Orchestrator | request, budget, sections in order      | [`FinalTour`]      |
//!
//! [`TourPipeline`] runs them for one [`TourRequest`].

mod budget;
mod interest;
mod narration;
mod orchestrator;
mod pipeline;
mod plan;
mod request;
mod specialist;

pub use budget::{
    BudgetStrategy, DEFAULT_WORD_TOLERANCE, DEFAULT_WORDS_PER_MINUTE, TourBudget, WordWindow,
    conclusion_words, intro_words, total_words, words_per_interest,
};
pub use interest::{Interest, Interests};
pub use narration::{sanitize_for_speech, word_count};
pub use orchestrator::{FinalTour, Orchestrator, Sections};
pub use pipeline::{TourOutcome, TourPipeline};
pub use plan::{Planner, TimeAllocation};
pub use request::TourRequest;
pub use specialist::{LengthPolicy, NarrativeReply, SectionContent, Specialist, instructions};
