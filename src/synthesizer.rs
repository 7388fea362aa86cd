//! Text-to-speech synthesis via the ElevenLabs API.
//!
//! One fixed voice identity and synthesis model, chosen at construction.
//! Addressing the voice by ID keeps the integration working with API keys
//! that lack the `voices_read` permission.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{info, instrument};

/// Default narrator voice ("Rachel").
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Default synthesis model.
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";

/// Default ElevenLabs API root.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Errors produced while synthesizing speech.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// `ELEVENLABS_API_KEY` was absent when the first synthesis was requested.
    #[error("ELEVENLABS_API_KEY is not set")]
    MissingCredentials,
    /// The HTTP request failed at the transport level.
    #[error("speech request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The speech API answered with a non-success status.
    #[error("speech API returned HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Capability: turn a text string into encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the fixed voice, returning MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// [`SpeechSynthesizer`] backed by the ElevenLabs text-to-speech endpoint.
///
/// Output format is pinned to `mp3_44100_128` so every segment the assembler
/// sees shares one container and sample rate.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    api_key: Option<String>,
    voice_id: String,
    model_id: String,
    base_url: String,
    client: Client,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Build from `ELEVENLABS_API_KEY`. A missing key is not an error here;
    /// it surfaces at the first synthesis call.
    pub fn from_env() -> Self {
        Self::new(std::env::var("ELEVENLABS_API_KEY").ok())
    }

    /// Point at a different ElevenLabs-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    #[instrument(level = "info", skip_all, fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SynthesisError::MissingCredentials)?;

        let url = format!(
            "{}/text-to-speech/{}?output_format=mp3_44100_128",
            self.base_url, self.voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let response = self
            .client
            .post(url)
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api { status, body });
        }

        let audio = response.bytes().await?;
        info!(bytes = audio.len(), "Synthesized speech segment");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let synthesizer = ElevenLabsSynthesizer::new(None);
        let err = synthesizer.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, SynthesisError::MissingCredentials));
    }

    #[test]
    fn test_voice_is_fixed_at_construction() {
        let synthesizer = ElevenLabsSynthesizer::new(Some("key".into()));
        assert_eq!(synthesizer.voice_id, DEFAULT_VOICE_ID);
        assert_eq!(synthesizer.model_id, DEFAULT_MODEL_ID);
    }
}
