//! The planner role: how a tour's minutes are spread across its sections.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::{Agent, AgentReply, OutputSchema};
use crate::chat::ChatProvider;
use crate::error::{LlmError, LlmResult};

use super::interest::Interest;
use super::request::TourRequest;

const PLANNER_INSTRUCTIONS: &str = "\
You are the Planner Agent for a self-guided audio tour system. Your responsibility is to \
analyze the user's location, interests and requested tour duration and produce an optimal \
time allocation plan.

Input parameters:
- Location: the specific place the tour covers
- Interests: the selected categories among Architecture, History, Culture and Culinary
- Duration: the total tour length in minutes

Your tasks:
1. Evaluate the selected interests and assign each one a weight.
2. Reserve 1 to 2 minutes for the introduction and 1 minute for the conclusion.
3. Distribute the remaining time among the selected categories only. Categories that were \
not selected get 0.
4. Make sure every selected category gets appropriate time for the duration.

Reply with the number of minutes for each section. Numbers only, no explanations.";

/// Minutes allocated to each tour section.
///
/// All six fields are always present; unselected interests are expected to be
/// zero. Values are validated to be finite and non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TimeAllocation {
    /// Introduction minutes.
    pub introduction: f64,
    /// Architecture minutes.
    pub architecture: f64,
    /// History minutes.
    pub history: f64,
    /// Culture minutes.
    pub culture: f64,
    /// Culinary minutes.
    pub culinary: f64,
    /// Conclusion minutes.
    pub conclusion: f64,
}

impl TimeAllocation {
    /// Minutes allocated to `interest`.
    #[must_use]
    pub const fn minutes_for(&self, interest: Interest) -> f64 {
        match interest {
            Interest::Architecture => self.architecture,
            Interest::History => self.history,
            Interest::Culture => self.culture,
            Interest::Culinary => self.culinary,
        }
    }

    /// Sum of all sections.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.fields().iter().map(|(_, v)| v).sum()
    }

    fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("introduction", self.introduction),
            ("architecture", self.architecture),
            ("history", self.history),
            ("culture", self.culture),
            ("culinary", self.culinary),
            ("conclusion", self.conclusion),
        ]
    }

    /// Checks that every value is a finite, non-negative number.
    ///
    /// # Errors
    ///
    /// Returns a response format error naming the first offending field.
    pub fn validate(&self) -> LlmResult<()> {
        for (name, value) in self.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(LlmError::response_format(
                    format!("non-negative minutes for {name}"),
                    value.to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The planner role.
#[derive(Debug, Clone)]
pub struct Planner {
    agent: Agent,
}

impl Planner {
    /// Creates a planner using `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            agent: Agent::new(
                "PlannerAgent",
                OutputSchema::named::<TimeAllocation>("time_allocation"),
            )
            .instructions(PLANNER_INSTRUCTIONS)
            .model(model),
        }
    }

    /// The underlying agent.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// The user turn sent for `request`.
    #[must_use]
    pub fn prompt(request: &TourRequest) -> String {
        format!(
            "Location: {} | Interests: {} | Duration: {} minutes",
            request.location(),
            request.interests(),
            request.duration_minutes()
        )
    }

    /// Asks the model for a time allocation.
    ///
    /// # Errors
    ///
    /// Returns the provider error, or a response format error if the reply is
    /// malformed or contains negative or non-finite minutes.
    pub async fn plan(
        &self,
        provider: &dyn ChatProvider,
        request: &TourRequest,
    ) -> LlmResult<AgentReply<TimeAllocation>> {
        let reply = self
            .agent
            .run::<TimeAllocation>(provider, Self::prompt(request))
            .await?;
        reply.output.validate()?;
        info!(
            introduction = reply.output.introduction,
            conclusion = reply.output.conclusion,
            total = reply.output.total(),
            "time allocation planned"
        );
        Ok(reply)
    }
}
