//! Speech rendering of finished tours.
//!
//! The speech endpoint caps each request at [`MAX_INPUT_CHARS`] characters,
//! so long tours are split at sentence boundaries, rendered in order and the
//! audio segments concatenated. MP3 frames concatenate cleanly.

use tracing::{debug, info, warn};

use crate::audio::{AudioFormat, SharedSpeechProvider, SpeechRequest, SpeechResponse};
use crate::config::TourConfig;
use crate::error::{Error, LlmError, Result};

/// Character limit of one speech request.
pub const MAX_INPUT_CHARS: usize = 4096;

/// Converts final tour text into audio.
#[derive(Clone)]
pub struct SpeechRenderer {
    speech: SharedSpeechProvider,
    model: String,
    voice: String,
    language: String,
    format: AudioFormat,
}

impl std::fmt::Debug for SpeechRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechRenderer")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("language", &self.language)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl SpeechRenderer {
    /// Creates a renderer with `tts-1`, voice `nova`, language `en` and MP3 output.
    #[must_use]
    pub fn new(speech: SharedSpeechProvider) -> Self {
        Self {
            speech,
            model: "tts-1".to_owned(),
            voice: "nova".to_owned(),
            language: "en".to_owned(),
            format: AudioFormat::Mp3,
        }
    }

    /// Creates a renderer using the model, voice and language in `config`.
    #[must_use]
    pub fn from_config(config: &TourConfig, speech: SharedSpeechProvider) -> Self {
        Self::new(speech)
            .model(&config.models.speech)
            .voice(&config.voice)
            .language(&config.language)
    }

    /// Sets the speech model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the voice.
    #[must_use]
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Sets the language code announced to the speech model.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the audio format.
    #[must_use]
    pub const fn format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// The speech inputs sent for `text`: a language hint followed by the
    /// text, split to respect [`MAX_INPUT_CHARS`].
    #[must_use]
    pub fn speech_inputs(&self, text: &str) -> Vec<String> {
        let prefixed = format!("Language: {}. {}", self.language, text.trim());
        split_for_speech(&prefixed, MAX_INPUT_CHARS)
    }

    /// Renders `text` to audio.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] for blank text (without calling the
    /// provider) or when any segment fails to render.
    pub async fn render(&self, text: &str) -> Result<SpeechResponse> {
        if text.trim().is_empty() {
            return Err(Error::Render(LlmError::invalid_request(
                "nothing to render: tour text is empty",
            )));
        }

        let inputs = self.speech_inputs(text);
        if inputs.len() > 1 && !self.format.concatenates() {
            warn!(
                format = self.format.as_str(),
                segments = inputs.len(),
                "joined segments may not play back as one stream"
            );
        }

        let mut audio = SpeechResponse::new(Vec::new(), self.format);
        for (index, input) in inputs.iter().enumerate() {
            debug!(segment = index, chars = input.chars().count(), "rendering speech segment");
            let request = SpeechRequest::new(&self.model, input, self.voice.as_str())
                .format(self.format);
            let segment = self.speech.speech(&request).await.map_err(Error::Render)?;
            audio.append(&segment);
        }

        info!(
            segments = inputs.len(),
            bytes = audio.audio.len(),
            voice = %self.voice,
            "speech rendered"
        );
        Ok(audio)
    }
}

/// File name offered for a tour of `location`, e.g. `sonicguide_new_york_tour.mp3`.
#[must_use]
pub fn suggested_file_name(location: &str) -> String {
    let slug = location.trim().to_lowercase().replace(' ', "_");
    format!("sonicguide_{slug}_tour.mp3")
}

/// Splits `text` into pieces of at most `max_chars` characters, preferring
/// sentence boundaries and falling back to word boundaries.
fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences(text) {
        for piece in fit_words(&sentence, max_chars) {
            let needed = piece.chars().count() + usize::from(!current.is_empty());
            if !current.is_empty() && current.chars().count() + needed > max_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            out.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

fn fit_words(sentence: &str, max_chars: usize) -> Vec<String> {
    if sentence.chars().count() <= max_chars {
        return vec![sentence.to_owned()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in sentence.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llms::mock::MockSpeech;

    #[test]
    fn file_name_slug() {
        assert_eq!(suggested_file_name("New York"), "sonicguide_new_york_tour.mp3");
        assert_eq!(suggested_file_name(" Paris "), "sonicguide_paris_tour.mp3");
    }

    #[test]
    fn short_text_is_one_segment() {
        let renderer = SpeechRenderer::new(Arc::new(MockSpeech::new(vec![1])));
        assert_eq!(
            renderer.speech_inputs("Welcome to Paris."),
            vec!["Language: en. Welcome to Paris.".to_owned()]
        );
    }

    #[test]
    fn split_prefers_sentence_boundaries() {
        let chunks = split_for_speech("One two. Three four. Five six.", 20);
        assert_eq!(chunks, vec!["One two. Three four.", "Five six."]);
    }

    #[test]
    fn split_breaks_long_sentences_on_words() {
        let chunks = split_for_speech("alpha beta gamma delta epsilon", 11);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta", "epsilon"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 11));
    }

    #[test]
    fn long_tour_respects_limit() {
        let text = "This sentence is exactly forty characters. ".repeat(300);
        let renderer = SpeechRenderer::new(Arc::new(MockSpeech::new(vec![1])));
        let inputs = renderer.speech_inputs(&text);
        assert!(inputs.len() > 1);
        assert!(inputs.iter().all(|i| i.chars().count() <= MAX_INPUT_CHARS));
        assert!(inputs[0].starts_with("Language: en. "));
        assert_eq!(
            inputs.iter().map(|i| i.split_whitespace().count()).sum::<usize>(),
            text.split_whitespace().count() + 2
        );
    }

    #[tokio::test]
    async fn render_sends_language_voice_and_model() {
        let speech = Arc::new(MockSpeech::new(vec![0xFF, 0xFB]));
        let renderer = SpeechRenderer::new(speech.clone())
            .language("fr")
            .voice("alloy")
            .model("tts-1-hd");

        let response = renderer.render("Bienvenue à Paris.").await.unwrap();
        assert_eq!(response.audio, vec![0xFF, 0xFB]);
        assert_eq!(response.format, AudioFormat::Mp3);

        let calls = speech.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input, "Language: fr. Bienvenue à Paris.");
        assert_eq!(calls[0].voice.id, "alloy");
        assert_eq!(calls[0].model, "tts-1-hd");
    }

    #[tokio::test]
    async fn empty_text_fails_without_calling_provider() {
        let speech = Arc::new(MockSpeech::new(vec![1]));
        let err = SpeechRenderer::new(speech.clone()).render("   ").await.unwrap_err();
        assert!(err.is_render());
        assert!(speech.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_render_error() {
        let speech = Arc::new(MockSpeech::failing(LlmError::http_status(500, "boom")));
        let err = SpeechRenderer::new(speech).render("Hello.").await.unwrap_err();
        assert!(err.is_render());
        assert!(err.to_string().contains("boom"));
    }
}
