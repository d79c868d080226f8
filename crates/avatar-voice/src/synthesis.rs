use crate::completion::truncate_body;
use crate::config::SynthesisConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Maximum text input size for synthesis (64 KiB). Prevents runaway
/// provider bills from oversized drafts.
const MAX_SYNTHESIS_INPUT_BYTES: usize = 64 * 1024;

/// Renders spoken text into a compressed audio clip.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the encoded audio bytes (MP3 for the ElevenLabs provider).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError>;

    /// Lists the voices available to the configured account, as reported by the provider.
    async fn list_voices(&self) -> Result<serde_json::Value, VoiceError> {
        Err(VoiceError::Synthesis(
            "voice listing is not supported by this synthesizer".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct TextToSpeechRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
    voice_settings: VoiceSettings,
}

/// [`SpeechSynthesizer`] backed by the ElevenLabs text-to-speech API.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    config: SynthesisConfig,
    client: Client,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Result<Self, VoiceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn api_key(&self) -> Result<&str, VoiceError> {
        self.config
            .api_key()
            .ok_or_else(|| VoiceError::Config("synthesis API key is not configured".to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_SYNTHESIS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_SYNTHESIS_INPUT_BYTES
            )));
        }
        let api_key = self.api_key()?;

        let url = format!("{}/text-to-speech/{}", self.base_url(), self.config.voice_id);
        let body = TextToSpeechRequest {
            text,
            model_id: self.config.model_id.as_deref(),
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .client
            .post(url)
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VoiceError::Synthesis(format!(
                "provider returned {status}: {}",
                truncate_body(&text)
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("failed to read audio body: {e}")))?;
        if audio.is_empty() {
            return Err(VoiceError::Synthesis(
                "provider returned no audio data".to_string(),
            ));
        }

        debug!(bytes = audio.len(), voice_id = %self.config.voice_id, "synthesized audio");
        Ok(audio.to_vec())
    }

    async fn list_voices(&self) -> Result<serde_json::Value, VoiceError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/voices", self.base_url()))
            .header("xi-api-key", api_key)
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("voice listing failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VoiceError::Synthesis(format!(
                "provider returned {status}: {}",
                truncate_body(&text)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("malformed voice listing: {e}")))
    }
}
