//! The orchestrator role: assembling sections into one spoken tour.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, OutputSchema};
use crate::chat::ChatProvider;
use crate::error::{LlmError, LlmResult};
use crate::usage::Usage;

use super::budget::TourBudget;
use super::interest::Interest;
use super::narration::sanitize_for_speech;
use super::request::TourRequest;
use super::specialist::{NarrativeReply, SectionContent};

/// Specialist output keyed by interest, iterated in domain order.
pub type Sections = BTreeMap<Interest, SectionContent>;

const ORCHESTRATOR_INSTRUCTIONS: &str = "\
You are the Orchestrator Agent for a self-guided audio tour system. Assemble one engaging tour \
for a single location from the content written by specialist agents, adding an introduction \
and a conclusion.

Input parameters:
- Location: the place the tour covers
- Selected Interests: the listener's interests among Architecture, History, Culture and Culinary
- Specialist content: one block per selected interest
- Tour Duration and Target Word Count

Your tasks:
1. Introduction. Welcome the listener to the location, briefly preview what the tour covers \
based on the selected interests, and set a conversational, immersive tone.
2. Content integration. Keep every specialist section in the order given \
(Architecture, History, Culture, Culinary, selected ones only). Preserve each section's voice \
and substance. Do not summarize, shorten or drop any section.
3. Transitions. Move naturally from one domain to the next and connect themes where possible.
4. Conclusion. Be concise: recall key highlights, reinforce what makes the location unique and \
encourage further exploration.

The result must read as one cohesive guided experience in natural spoken language. It is sent \
straight to a speech model, so never use headings, lists, links, citations or any other \
written formatting.";

/// The assembled tour narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalTour {
    /// Sanitized text, ready for speech synthesis.
    pub text: String,
}

/// The orchestrator role.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    agent: Agent,
}

impl Orchestrator {
    /// Creates an orchestrator using `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            agent: Agent::new(
                "OrchestratorAgent",
                OutputSchema::named::<NarrativeReply>("final_tour"),
            )
            .instructions(ORCHESTRATOR_INSTRUCTIONS)
            .model(model),
        }
    }

    /// The underlying agent.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// The user turn carrying every section, labelled `"{Interest} Content:"`.
    #[must_use]
    pub fn prompt(request: &TourRequest, budget: &TourBudget, sections: &Sections) -> String {
        let mut prompt = format!(
            "Location: {}\n\
Selected Interests: {}\n\
Tour Duration: {} minutes\n\
Target Word Count: {} words\n\
Introduction: about {} words\n\
Conclusion: about {} words\n\n\
Content from Specialists:\n",
            request.location(),
            request.interests(),
            request.duration_minutes(),
            budget.total_words,
            budget.intro_words,
            budget.conclusion_words,
        );
        for section in sections.values() {
            let _ = write!(prompt, "\n{} Content:\n{}\n", section.interest, section.text);
        }
        let _ = write!(
            prompt,
            "\nCreate a natural, conversational audio tour that flows smoothly, with an engaging \
introduction and a thoughtful conclusion. Sound like a friendly guide speaking to the visitor. \
The total should be approximately {} words.",
            budget.total_words
        );
        prompt
    }

    /// Assembles the final tour.
    ///
    /// # Errors
    ///
    /// Returns the provider error, or a response format error if the reply is
    /// malformed or empty after sanitation.
    pub async fn assemble(
        &self,
        provider: &dyn ChatProvider,
        request: &TourRequest,
        budget: &TourBudget,
        sections: &Sections,
    ) -> LlmResult<(FinalTour, Usage)> {
        let reply = self
            .agent
            .run::<NarrativeReply>(provider, Self::prompt(request, budget, sections))
            .await?;
        let text = sanitize_for_speech(&reply.output.output);
        if text.is_empty() {
            return Err(LlmError::response_format("non-empty tour", "empty text"));
        }
        Ok((FinalTour { text }, reply.usage.unwrap_or_else(Usage::zero)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::llms::mock::MockChat;

    fn fixture() -> (TourRequest, TourBudget, Sections) {
        let request = TourRequest::from_labels("Lisbon", ["Culinary", "History"], 2).unwrap();
        let budget = TourBudget::even(&request, 150);
        let sections = [Interest::Culinary, Interest::History]
            .into_iter()
            .map(|interest| {
                let section = SectionContent {
                    interest,
                    text: format!("{} narration.", interest.key()),
                    word_limit: 150,
                };
                (interest, section)
            })
            .collect();
        (request, budget, sections)
    }

    #[test]
    fn prompt_orders_sections_by_domain() {
        let (request, budget, sections) = fixture();
        let prompt = Orchestrator::prompt(&request, &budget, &sections);

        let history = prompt.find("History Content:\nhistory narration.").unwrap();
        let culinary = prompt.find("Culinary Content:\nculinary narration.").unwrap();
        assert!(history < culinary);
        assert!(!prompt.contains("Architecture Content:"));
    }

    #[test]
    fn prompt_carries_budget() {
        let (request, budget, sections) = fixture();
        let prompt = Orchestrator::prompt(&request, &budget, &sections);
        assert!(prompt.contains("Location: Lisbon"));
        assert!(prompt.contains("Selected Interests: History, Culinary"));
        assert!(prompt.contains("Tour Duration: 2 minutes"));
        assert!(prompt.contains("Target Word Count: 300 words"));
        assert!(prompt.contains("Introduction: about 40 words"));
        assert!(prompt.contains("Conclusion: about 30 words"));
    }

    #[tokio::test]
    async fn assemble_sanitizes_output() {
        let (request, budget, sections) = fixture();
        let mock = MockChat::with_responses(vec![
            r##"{"output":"# Tour\nWelcome to **Lisbon**! Enjoy."}"##.to_owned(),
        ]);
        let (tour, _) = Orchestrator::new("gpt-4o-mini")
            .assemble(&mock, &request, &budget, &sections)
            .await
            .unwrap();
        assert_eq!(tour.text, "Welcome to Lisbon! Enjoy.");
        assert_eq!(mock.calls()[0].schema_name(), Some("final_tour"));
    }

    #[tokio::test]
    async fn empty_output_fails() {
        let (request, budget, sections) = fixture();
        let mock = MockChat::with_responses(vec![r#"{"output":""}"#.to_owned()]);
        let result = Orchestrator::new("m")
            .assemble(&mock, &request, &budget, &sections)
            .await;
        assert!(result.is_err());
    }
}
