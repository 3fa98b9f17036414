//! Speech synthesis types and the provider seam used by the renderer.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmResult;

/// Encoding of synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG layer III; what tours are saved as.
    #[default]
    Mp3,
    /// Opus in Ogg.
    Opus,
    /// AAC.
    Aac,
    /// FLAC.
    Flac,
    /// WAV.
    Wav,
    /// Raw 24kHz 16-bit PCM.
    Pcm,
}

impl AudioFormat {
    /// Wire name, which is also the file extension.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    /// Whether two encoded streams can be joined by byte concatenation.
    #[must_use]
    pub const fn concatenates(&self) -> bool {
        matches!(self, Self::Mp3 | Self::Aac | Self::Pcm)
    }
}

/// A narrator voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Identifier sent to the provider, e.g. `nova`.
    pub id: String,
    /// What the voice sounds like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Voice {
    /// A voice with no description.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

impl From<&str> for Voice {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Voice {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// One synthesis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// TTS model, e.g. `tts-1`.
    pub model: String,
    /// Text to speak.
    pub input: String,
    /// Narrator.
    pub voice: Voice,
    /// Output encoding.
    pub response_format: AudioFormat,
    /// Playback speed, 0.25 to 4.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl SpeechRequest {
    /// Creates an MP3 request.
    #[must_use]
    pub fn new(model: impl Into<String>, input: impl Into<String>, voice: impl Into<Voice>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            voice: voice.into(),
            response_format: AudioFormat::Mp3,
            speed: None,
        }
    }

    /// Sets the output encoding.
    #[must_use]
    pub const fn format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Sets the playback speed.
    #[must_use]
    pub const fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }
}

/// Synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechResponse {
    /// Encoded audio bytes.
    pub audio: Vec<u8>,
    /// Encoding of `audio`.
    pub format: AudioFormat,
}

impl SpeechResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(audio: Vec<u8>, format: AudioFormat) -> Self {
        Self { audio, format }
    }

    /// Appends the audio of a following segment.
    pub fn append(&mut self, next: &Self) {
        self.audio.extend_from_slice(&next.audio);
    }

    /// Writes the audio to `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.audio)
    }
}

/// Trait for providers that support text-to-speech synthesis.
#[async_trait]
pub trait TextToSpeechProvider: Send + Sync {
    /// Synthesizes `request.input`.
    async fn speech(&self, request: &SpeechRequest) -> LlmResult<SpeechResponse>;

    /// Voices the provider offers; empty when unknown.
    fn available_voices(&self) -> Vec<Voice> {
        Vec::new()
    }
}

/// A shareable speech provider handle.
pub type SharedSpeechProvider = Arc<dyn TextToSpeechProvider>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mp3_is_default_and_concatenates() {
        assert_eq!(AudioFormat::default(), AudioFormat::Mp3);
        assert!(AudioFormat::Mp3.concatenates());
        assert!(!AudioFormat::Wav.concatenates());
        assert_eq!(AudioFormat::Opus.as_str(), "opus");
    }

    #[test]
    fn request_builder() {
        let request = SpeechRequest::new("tts-1", "Hello", "nova")
            .format(AudioFormat::Opus)
            .speed(1.25);
        assert_eq!(request.voice, Voice::new("nova"));
        assert_eq!(request.response_format, AudioFormat::Opus);
        assert_eq!(request.speed, Some(1.25));
    }

    #[test]
    fn append_joins_segments() {
        let mut first = SpeechResponse::new(vec![1, 2], AudioFormat::Mp3);
        first.append(&SpeechResponse::new(vec![3], AudioFormat::Mp3));
        assert_eq!(first.audio, vec![1, 2, 3]);
    }

    #[test]
    fn save_writes_bytes() {
        let path = std::env::temp_dir().join(format!("tourcast-save-{}.mp3", std::process::id()));
        SpeechResponse::new(vec![1, 2, 3], AudioFormat::Mp3).save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        std::fs::remove_file(&path).unwrap();
    }
}
