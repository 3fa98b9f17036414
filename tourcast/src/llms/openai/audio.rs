//! `TextToSpeechProvider` over `/audio/speech`.

use async_trait::async_trait;
use tracing::debug;

use crate::audio::{SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice};
use crate::error::{LlmError, LlmResult};

use super::client::OpenAI;
use super::types::SpeechBody;

/// Voices accepted by `tts-1` and `tts-1-hd`.
const VOICES: [(&str, &str); 9] = [
    ("alloy", "neutral and balanced"),
    ("ash", "warm and gentle"),
    ("coral", "clear and professional"),
    ("echo", "crisp and energetic"),
    ("fable", "expressive storyteller"),
    ("onyx", "deep and authoritative"),
    ("nova", "friendly and conversational"),
    ("sage", "calm and measured"),
    ("shimmer", "bright and upbeat"),
];

impl OpenAI {
    pub(crate) fn speech_body(request: &SpeechRequest) -> SpeechBody<'_> {
        SpeechBody {
            model: &request.model,
            input: &request.input,
            voice: &request.voice.id,
            response_format: request.response_format.as_str(),
            speed: request.speed,
        }
    }
}

#[async_trait]
impl TextToSpeechProvider for OpenAI {
    async fn speech(&self, request: &SpeechRequest) -> LlmResult<SpeechResponse> {
        let body = Self::speech_body(request);
        debug!(model = body.model, voice = body.voice, chars = body.input.chars().count(), "requesting speech");

        let audio = self.send(&self.speech_url(), &body).await?.bytes().await?;
        if audio.is_empty() {
            return Err(LlmError::response_format("audio bytes", "empty body"));
        }

        Ok(SpeechResponse::new(audio.to_vec(), request.response_format))
    }

    fn available_voices(&self) -> Vec<Voice> {
        VOICES
            .iter()
            .map(|(id, description)| Voice::new(*id).description(*description))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::AudioFormat;
    use crate::llms::openai::OpenAIConfig;

    #[test]
    fn speech_body_serializes_format_and_skips_speed() {
        let request = SpeechRequest::new("tts-1", "Hello world", "nova");
        let json = serde_json::to_value(OpenAI::speech_body(&request)).unwrap();

        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["input"], "Hello world");
        assert_eq!(json["voice"], "nova");
        assert_eq!(json["response_format"], "mp3");
        assert!(json.get("speed").is_none());
    }

    #[test]
    fn speech_body_includes_speed() {
        let request = SpeechRequest::new("tts-1", "x", "alloy")
            .format(AudioFormat::Wav)
            .speed(1.5);
        let json = serde_json::to_value(OpenAI::speech_body(&request)).unwrap();
        assert_eq!(json["response_format"], "wav");
        assert_eq!(json["speed"], 1.5);
    }

    #[test]
    fn voices_include_nova() {
        let client = OpenAI::new(OpenAIConfig::new("sk-test")).unwrap();
        assert!(client.available_voices().iter().any(|v| v.id == "nova"));
    }
}
