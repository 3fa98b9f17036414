//! Specialist roles: one narrator per interest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::{Agent, OutputSchema};
use crate::chat::ChatProvider;
use crate::error::{LlmError, LlmResult};
use crate::usage::Usage;

use super::budget::{DEFAULT_WORD_TOLERANCE, WordWindow};
use super::interest::Interest;
use super::narration::{sanitize_for_speech, word_count};
use super::request::TourRequest;

/// Structured reply of every narrating role: `{"output": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NarrativeReply {
    /// The narration text.
    pub output: String,
}

/// What to do when a specialist misses its word window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Log a warning and keep the text.
    #[default]
    Lenient,
    /// Ask for a rewrite up to `retries` more times, then fail.
    Strict {
        /// Extra attempts after the first reply.
        retries: u32,
    },
}

/// Narration produced for one interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    /// The interest narrated.
    pub interest: Interest,
    /// Sanitized spoken prose.
    pub text: String,
    /// The word target the specialist was given.
    pub word_limit: u32,
}

impl SectionContent {
    /// Number of words in the text.
    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

struct Persona {
    agent_name: &'static str,
    duties: [&'static str; 3],
    voice: &'static str,
    research: &'static str,
    closing: &'static str,
    focus: &'static str,
}

const fn persona(interest: Interest) -> Persona {
    match interest {
        Interest::Architecture => Persona {
            agent_name: "ArchitectureAgent",
            duties: [
                "Describe architectural styles, notable buildings, urban planning and design elements",
                "Provide technical insights balanced with accessible explanations",
                "Highlight the most visually striking or historically significant structures",
            ],
            voice: "a detailed, descriptive",
            research: "architectural information",
            closing: "Help listeners see and appreciate architectural details they might otherwise miss.",
            focus: "visual descriptions and interesting design details",
        },
        Interest::History => Persona {
            agent_name: "HistoricalAgent",
            duties: [
                "Provide historically accurate information about landmarks, events and people related to the location",
                "Prioritize the most significant historical aspects for the time available",
                "Include interesting historical facts and stories that are not commonly known",
            ],
            voice: "an authoritative, professorial",
            research: "historical information",
            closing: "Make history come alive through engaging narratives.",
            focus: "interesting stories and personal connections",
        },
        Interest::Culture => Persona {
            agent_name: "CulturalAgent",
            duties: [
                "Provide information about local traditions, customs, arts, music and cultural practices",
                "Highlight cultural venues and events relevant to the listener's interests",
                "Explain cultural nuances that deepen the visitor's understanding",
            ],
            voice: "a warm, respectful",
            research: "cultural information",
            closing: "Focus on authentic cultural insights that help listeners appreciate local ways of life.",
            focus: "local traditions and community life",
        },
        Interest::Culinary => Persona {
            agent_name: "CulinaryAgent",
            duties: [
                "Highlight local food specialties, restaurants, markets and culinary traditions",
                "Explain the historical and cultural significance of local dishes and ingredients",
                "Suggest food stops suitable for the tour duration",
            ],
            voice: "an enthusiastic, passionate",
            research: "culinary information",
            closing: "Make descriptions vivid and appetizing, with practical details like opening hours when relevant.",
            focus: "local specialties and food stories",
        },
    }
}

/// System instructions for the specialist narrating `interest`.
#[must_use]
pub fn instructions(interest: Interest) -> String {
    let p = persona(interest);
    format!(
        "You are the {label} agent for a self-guided audio tour system. Given a location and \
the listener's areas of interest, your role is to:
1. {d1}
2. {d2}
3. {d3}
4. Adopt {voice} voice style when delivering {key} content
5. Never add headings such as \"## {label}\". Provide only the content
6. Keep it conversational without any formatting. The text goes straight to a speech model \
and must sound like natural speech
7. Keep the content strictly within the lower and upper word limits you are given

When web search is available, use it to retrieve up-to-date context and {research} about \
the location. Never include links or hyperlinks and never cite sources.

{closing} Make it as detailed and elaborate as the word limit allows.",
        label = interest.label(),
        key = interest.key(),
        d1 = p.duties[0],
        d2 = p.duties[1],
        d3 = p.duties[2],
        voice = p.voice,
        research = p.research,
        closing = p.closing,
    )
}

/// A narrator for one interest.
#[derive(Debug, Clone)]
pub struct Specialist {
    interest: Interest,
    agent: Agent,
    tolerance: f64,
    policy: LengthPolicy,
}

impl Specialist {
    /// Creates the specialist for `interest` using `model`.
    #[must_use]
    pub fn new(interest: Interest, model: impl Into<String>) -> Self {
        let agent = Agent::new(
            persona(interest).agent_name,
            OutputSchema::named::<NarrativeReply>(format!("{}_content", interest.key())),
        )
        .instructions(instructions(interest))
        .model(model);
        Self {
            interest,
            agent,
            tolerance: DEFAULT_WORD_TOLERANCE,
            policy: LengthPolicy::Lenient,
        }
    }

    /// Enables or disables web search grounding.
    #[must_use]
    pub fn web_search(mut self, enabled: bool) -> Self {
        self.agent = self.agent.web_search(enabled);
        self
    }

    /// Sets the relative word tolerance.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the length policy.
    #[must_use]
    pub const fn length_policy(mut self, policy: LengthPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The interest narrated.
    #[must_use]
    pub const fn interest(&self) -> Interest {
        self.interest
    }

    /// The underlying agent.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Accepted range for a target of `word_limit` words.
    #[must_use]
    pub fn window(&self, word_limit: u32) -> WordWindow {
        WordWindow::around(word_limit, self.tolerance)
    }

    /// The user turn sent for `request` with a target of `word_limit` words.
    #[must_use]
    pub fn prompt(&self, request: &TourRequest, word_limit: u32) -> String {
        let window = self.window(word_limit);
        format!(
            "Location: {} | Interests: {} | Word Limit: between {} and {} words. \
Create engaging {} content for an audio tour. Focus on {}. \
Make it conversational and natural for speech.",
            request.location(),
            request.interests(),
            window.lower,
            window.upper,
            self.interest.key(),
            persona(self.interest).focus,
        )
    }

    /// Generates the section for `request`.
    ///
    /// The reply is sanitized before its length is checked against the
    /// window. Under [`LengthPolicy::Strict`] an out-of-window reply is sent
    /// back with a corrective turn.
    ///
    /// # Errors
    ///
    /// Returns the provider error, a response format error for malformed or
    /// empty replies, or, under the strict policy, when the text is still
    /// outside the window after all retries.
    pub async fn generate(
        &self,
        provider: &dyn ChatProvider,
        request: &TourRequest,
        word_limit: u32,
    ) -> LlmResult<(SectionContent, Usage)> {
        let window = self.window(word_limit);
        let retries = match self.policy {
            LengthPolicy::Lenient => 0,
            LengthPolicy::Strict { retries } => retries,
        };
        let mut conversation = self.agent.request(self.prompt(request, word_limit));
        let mut usage = Usage::zero();
        let mut attempt = 0;

        loop {
            let reply = self
                .agent
                .send::<NarrativeReply>(provider, &conversation)
                .await?;
            usage += reply.usage.unwrap_or_else(Usage::zero);

            let text = sanitize_for_speech(&reply.output.output);
            if text.is_empty() {
                return Err(LlmError::response_format("non-empty narration", "empty text"));
            }
            let words = word_count(&text);
            debug!(interest = self.interest.key(), words, attempt, "specialist replied");

            if window.contains(words) || self.policy == LengthPolicy::Lenient {
                if !window.contains(words) {
                    warn!(
                        interest = self.interest.key(),
                        words,
                        lower = window.lower,
                        upper = window.upper,
                        "narration outside word window"
                    );
                }
                let section = SectionContent {
                    interest: self.interest,
                    text,
                    word_limit,
                };
                return Ok((section, usage));
            }

            if attempt >= retries {
                return Err(LlmError::response_format(
                    format!("between {} and {} words", window.lower, window.upper),
                    format!("{words} words after {} attempts", attempt + 1),
                ));
            }

            warn!(
                interest = self.interest.key(),
                words,
                lower = window.lower,
                upper = window.upper,
                "narration outside word window, asking for a rewrite"
            );
            attempt += 1;
            conversation = conversation.assistant(reply.raw).user(format!(
                "That narration has {words} words. Rewrite it to between {} and {} words, \
keeping the same voice and facts. Reply in the same JSON format.",
                window.lower, window.upper
            ));
        }
    }
}
