//! The tour pipeline: budget, plan and narrate, then assemble.
//!
//! ```text
//! TourRequest ─▶ TourBudget ─┬─▶ Planner ───────────────┐
//!                            └─▶ Specialist × n (join) ─┴─▶ Orchestrator ─▶ TourOutcome
//! ```
//!
//! With `concurrency = false` every call runs one after another.
//! With [`BudgetStrategy::Planned`] the planner finishes first and its
//! allocation sets the specialist budgets. Any failure aborts the tour; the
//! orchestrator only runs once every specialist has succeeded.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{try_join, try_join_all};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{Instrument, info, info_span};

use crate::chat::SharedChatProvider;
use crate::config::TourConfig;
use crate::error::{Error, LlmError, LlmResult, Result, Stage};
use crate::llms::openai::OpenAI;
use crate::usage::Usage;

use super::budget::{BudgetStrategy, TourBudget};
use super::interest::Interest;
use super::narration::word_count;
use super::orchestrator::{FinalTour, Orchestrator, Sections};
use super::plan::{Planner, TimeAllocation};
use super::request::TourRequest;
use super::specialist::{SectionContent, Specialist};

/// Everything produced for one tour.
#[derive(Debug, Clone, Serialize)]
pub struct TourOutcome {
    /// The request served.
    pub request: TourRequest,
    /// Word targets used.
    pub budget: TourBudget,
    /// The planner's allocation.
    pub allocation: TimeAllocation,
    /// Specialist sections in domain order.
    pub sections: Sections,
    /// The assembled narration.
    pub tour: FinalTour,
    /// Tokens used across all calls.
    pub usage: Usage,
}

impl TourOutcome {
    /// The final narration text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.tour.text
    }
}

/// Coordinates the planner, specialists and orchestrator.
#[derive(Clone)]
pub struct TourPipeline {
    config: Arc<TourConfig>,
    chat: SharedChatProvider,
    planner: Planner,
    specialists: BTreeMap<Interest, Specialist>,
    orchestrator: Orchestrator,
}

impl fmt::Debug for TourPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourPipeline")
            .field("provider", &self.chat.provider_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TourPipeline {
    /// Creates a pipeline that sends every role through `chat`.
    #[must_use]
    pub fn new(config: TourConfig, chat: SharedChatProvider) -> Self {
        let specialists = Interest::ALL
            .into_iter()
            .map(|interest| {
                let specialist = Specialist::new(interest, &config.models.specialist)
                    .web_search(config.web_search)
                    .tolerance(config.word_tolerance)
                    .length_policy(config.length_policy);
                (interest, specialist)
            })
            .collect();
        Self {
            planner: Planner::new(&config.models.planner),
            orchestrator: Orchestrator::new(&config.models.orchestrator),
            specialists,
            chat,
            config: Arc::new(config),
        }
    }

    /// Creates a pipeline backed by the OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the settings have error-level issues
    /// (see [`TourConfig::validate`]) or the HTTP client cannot be built.
    pub fn from_config(config: TourConfig) -> Result<Self> {
        config.ensure_valid()?;
        let client = OpenAI::new(config.openai_config()?)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// The active settings.
    #[must_use]
    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    /// Runs only the planner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] tagged [`Stage::Planner`].
    pub async fn plan(&self, request: &TourRequest) -> Result<TimeAllocation> {
        let deadline = Instant::now() + self.config.request_deadline();
        let reply = self
            .call(
                Stage::Planner,
                deadline,
                self.planner.plan(self.chat.as_ref(), request),
            )
            .await?;
        Ok(reply.output)
    }

    /// Generates a complete tour.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] naming the first stage that failed or
    /// timed out. No partial tour is produced.
    pub async fn run(&self, request: &TourRequest) -> Result<TourOutcome> {
        let span = info_span!(
            "tour",
            location = request.location(),
            duration = request.duration_minutes(),
            interests = %request.interests(),
        );
        self.generate(request).instrument(span).await
    }

    async fn generate(&self, request: &TourRequest) -> Result<TourOutcome> {
        let started = Instant::now();
        let deadline = started + self.config.request_deadline();
        let wpm = self.config.words_per_minute;
        let planner = self.call(
            Stage::Planner,
            deadline,
            self.planner.plan(self.chat.as_ref(), request),
        );

        let (plan, budget, (sections, section_usage)) = match self.config.budget_strategy {
            BudgetStrategy::Even if self.config.concurrency => {
                let budget = TourBudget::even(request, wpm);
                let (plan, narrated) =
                    try_join(planner, self.narrate(request, &budget, deadline)).await?;
                (plan, budget, narrated)
            }
            BudgetStrategy::Even => {
                let plan = planner.await?;
                let budget = TourBudget::even(request, wpm);
                let narrated = self.narrate(request, &budget, deadline).await?;
                (plan, budget, narrated)
            }
            BudgetStrategy::Planned => {
                let plan = planner.await?;
                let budget = TourBudget::planned(request, wpm, &plan.output);
                let narrated = self.narrate(request, &budget, deadline).await?;
                (plan, budget, narrated)
            }
        };

        let (tour, tour_usage) = self
            .call(
                Stage::Orchestrator,
                deadline,
                self.orchestrator
                    .assemble(self.chat.as_ref(), request, &budget, &sections),
            )
            .await?;

        let usage = plan.usage.unwrap_or_else(Usage::zero) + section_usage + tour_usage;
        info!(
            words = word_count(&tour.text),
            target = budget.total_words,
            tokens = usage.total_tokens,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "tour generated"
        );

        Ok(TourOutcome {
            request: request.clone(),
            budget,
            allocation: plan.output,
            sections,
            tour,
            usage,
        })
    }

    async fn narrate(
        &self,
        request: &TourRequest,
        budget: &TourBudget,
        deadline: Instant,
    ) -> Result<(Sections, Usage)> {
        let jobs = budget.sections.iter().filter_map(|(interest, words)| {
            self.specialists
                .get(interest)
                .map(|specialist| (specialist, *words))
        });
        let results: Vec<(SectionContent, Usage)> = if self.config.concurrency {
            try_join_all(
                jobs.map(|(specialist, words)| self.narrate_one(specialist, request, words, deadline)),
            )
            .await?
        } else {
            let mut results = Vec::with_capacity(budget.sections.len());
            for (specialist, words) in jobs {
                results.push(
                    self.narrate_one(specialist, request, words, deadline)
                        .await?,
                );
            }
            results
        };

        let mut usage = Usage::zero();
        let mut sections = Sections::new();
        for (section, section_usage) in results {
            info!(
                interest = section.interest.key(),
                words = section.word_count(),
                target = section.word_limit,
                "section ready"
            );
            usage += section_usage;
            sections.insert(section.interest, section);
        }
        Ok((sections, usage))
    }

    async fn narrate_one(
        &self,
        specialist: &Specialist,
        request: &TourRequest,
        words: u32,
        deadline: Instant,
    ) -> Result<(SectionContent, Usage)> {
        self.call(
            Stage::Specialist(specialist.interest()),
            deadline,
            specialist.generate(self.chat.as_ref(), request, words),
        )
        .await
    }

    /// Awaits one model call under the per-call timeout and the tour deadline.
    async fn call<T, F>(&self, stage: Stage, deadline: Instant, call: F) -> Result<T>
    where
        F: Future<Output = LlmResult<T>>,
    {
        let call_timeout = self.config.call_timeout();
        let call_deadline = Instant::now() + call_timeout;
        let (until, secs) = if call_deadline <= deadline {
            (call_deadline, call_timeout.as_secs())
        } else {
            (deadline, self.config.request_deadline_secs)
        };

        let span = info_span!("stage", %stage);
        match tokio::time::timeout_at(until, call).instrument(span).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(Error::generation(stage, source)),
            Err(_) => Err(Error::generation(stage, LlmError::timeout(stage, secs))),
        }
    }
}
