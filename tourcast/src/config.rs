//! Tour generation settings.
//!
//! [`TourConfig`] is plain serde data: the CLI layers a TOML file, the
//! environment and command-line flags on top of [`TourConfig::default`].
//!
//! ```toml
//! language = "en"
//! voice = "nova"
//! budget_strategy = "planned"
//! length_policy = { strict = { retries = 2 } }
//!
//! [models]
//! planner = "gpt-4o"
//! specialist = "gpt-4o-mini"
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llms::openai::OpenAIConfig;
use crate::tour::{BudgetStrategy, DEFAULT_WORD_TOLERANCE, DEFAULT_WORDS_PER_MINUTE, LengthPolicy};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
/// Environment variable overriding the narration language.
pub const LANGUAGE_ENV: &str = "TOURCAST_LANGUAGE";

/// Settings for planning, narrating and rendering tours.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TourConfig {
    /// API key; usually supplied through `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Models per role.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Speech voice.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Narration language code.
    #[serde(default = "default_language")]
    pub language: String,

    /// Speaking rate used for word budgets.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,

    /// Relative tolerance of each word window.
    #[serde(default = "default_word_tolerance")]
    pub word_tolerance: f64,

    /// Ground specialists in live web search results.
    #[serde(default)]
    pub web_search: bool,

    /// Run specialists concurrently.
    #[serde(default = "default_true")]
    pub concurrency: bool,

    /// How per-interest word targets are derived.
    #[serde(default)]
    pub budget_strategy: BudgetStrategy,

    /// What to do when a specialist misses its word window.
    #[serde(default)]
    pub length_policy: LengthPolicy,

    /// Limit for a single model call, in seconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Limit for a whole tour, in seconds.
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: u64,
}

/// Model identifiers per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Planner model.
    #[serde(default = "default_planner_model")]
    pub planner: String,
    /// Specialist model.
    #[serde(default = "default_specialist_model")]
    pub specialist: String,
    /// Orchestrator model.
    #[serde(default = "default_orchestrator_model")]
    pub orchestrator: String,
    /// Text-to-speech model.
    #[serde(default = "default_speech_model")]
    pub speech: String,
}

fn default_base_url() -> String {
    OpenAIConfig::DEFAULT_BASE_URL.to_owned()
}

fn default_voice() -> String {
    "nova".to_owned()
}

fn default_language() -> String {
    "en".to_owned()
}

const fn default_words_per_minute() -> u32 {
    DEFAULT_WORDS_PER_MINUTE
}

const fn default_word_tolerance() -> f64 {
    DEFAULT_WORD_TOLERANCE
}

const fn default_true() -> bool {
    true
}

const fn default_call_timeout() -> u64 {
    120
}

const fn default_request_deadline() -> u64 {
    600
}

fn default_planner_model() -> String {
    "gpt-4o".to_owned()
}

fn default_specialist_model() -> String {
    "gpt-4o-mini".to_owned()
}

fn default_orchestrator_model() -> String {
    "gpt-4o-mini".to_owned()
}

fn default_speech_model() -> String {
    "tts-1".to_owned()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            planner: default_planner_model(),
            specialist: default_specialist_model(),
            orchestrator: default_orchestrator_model(),
            speech: default_speech_model(),
        }
    }
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            models: ModelsConfig::default(),
            voice: default_voice(),
            language: default_language(),
            words_per_minute: default_words_per_minute(),
            word_tolerance: default_word_tolerance(),
            web_search: false,
            concurrency: true,
            budget_strategy: BudgetStrategy::default(),
            length_policy: LengthPolicy::default(),
            call_timeout_secs: default_call_timeout(),
            request_deadline_secs: default_request_deadline(),
        }
    }
}

impl fmt::Debug for TourConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("voice", &self.voice)
            .field("language", &self.language)
            .field("words_per_minute", &self.words_per_minute)
            .field("word_tolerance", &self.word_tolerance)
            .field("web_search", &self.web_search)
            .field("concurrency", &self.concurrency)
            .field("budget_strategy", &self.budget_strategy)
            .field("length_policy", &self.length_policy)
            .field("call_timeout_secs", &self.call_timeout_secs)
            .field("request_deadline_secs", &self.request_deadline_secs)
            .finish()
    }
}

impl TourConfig {
    /// Applies `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `TOURCAST_LANGUAGE`.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Applies environment overrides read through `lookup`. Empty values are ignored.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());

        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(language) = lookup(LANGUAGE_ENV) {
            self.language = language;
        }
        self
    }

    /// Per-call limit.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Whole-tour limit.
    #[must_use]
    pub const fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    /// Returns `true` when a non-blank API key is set.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Builds the OpenAI client settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no API key is set.
    pub fn openai_config(&self) -> Result<OpenAIConfig> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config(format!("{API_KEY_ENV} is not set")))?;
        Ok(OpenAIConfig::new(key)
            .with_base_url(&self.base_url)
            .with_model(&self.models.specialist)
            .with_timeout(self.call_timeout()))
    }

    /// Checks the settings for problems.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !self.has_api_key() {
            issues.push(ConfigIssue::error(
                "api_key",
                format!("No API key configured. Set {API_KEY_ENV}."),
            ));
        }

        if self.words_per_minute == 0 {
            issues.push(ConfigIssue::error(
                "words_per_minute",
                "Speaking rate must be at least 1",
            ));
        }

        if !(0.0..=1.0).contains(&self.word_tolerance) {
            issues.push(ConfigIssue::error(
                "word_tolerance",
                "Tolerance must be between 0.0 and 1.0",
            ));
        }

        for (path, model) in [
            ("models.planner", &self.models.planner),
            ("models.specialist", &self.models.specialist),
            ("models.orchestrator", &self.models.orchestrator),
            ("models.speech", &self.models.speech),
        ] {
            if model.trim().is_empty() {
                issues.push(ConfigIssue::error(path, "Model must not be empty"));
            }
        }

        if self.call_timeout_secs == 0 || self.request_deadline_secs == 0 {
            issues.push(ConfigIssue::error(
                "call_timeout_secs",
                "Timeouts must be at least one second",
            ));
        } else if self.request_deadline_secs < self.call_timeout_secs {
            issues.push(ConfigIssue::warning(
                "request_deadline_secs",
                "Tour deadline is shorter than a single call timeout",
            ));
        }

        if self.web_search && !self.models.specialist.contains("search") {
            issues.push(ConfigIssue::warning(
                "web_search",
                "Web search needs a search-capable specialist model such as gpt-4o-mini-search-preview",
            ));
        }

        issues
    }

    /// Returns `true` if [`TourConfig::validate`] found no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Fails with every error-level issue [`TourConfig::validate`] reports.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] listing the errors, one per line.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors: Vec<String> = self
            .validate()
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .map(ToString::to_string)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::config(errors.join("\n")))
        }
    }
}

/// A configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Dotted field path.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl ConfigIssue {
    /// Creates an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{level}] {}: {}", self.path, self.message)
    }
}

/// Severity of a [`ConfigIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Tours cannot run.
    Error,
    /// Tours run but probably not as intended.
    Warning,
}
