//! ElevenLabs text-to-speech.
//!
//! Audio is streamed to `output_file` as it arrives, then handed to the
//! configured player.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use iva_core::{config::VoiceConfig, error::IvaError};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{command, Speaker};

const ELEVENLABS_API: &str = "https://api.elevenlabs.io";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Deserialize)]
struct VoiceList {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Deserialize)]
struct Voice {
    name: String,
    voice_id: String,
}

pub struct ElevenLabsSpeaker {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
    output_file: PathBuf,
    player_command: String,
}

impl ElevenLabsSpeaker {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: ELEVENLABS_API.to_string(),
            api_key: config.elevenlabs_api_key.clone(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
            output_file: PathBuf::from(iva_core::shellexpand(&config.output_file)),
            player_command: config.player_command.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Synthesize `text` into `output_file`.
    pub async fn synthesize(&self, text: &str) -> Result<&Path, IvaError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);
        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.similarity_boost,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IvaError::Voice(format!("elevenlabs request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(IvaError::Voice(format!("elevenlabs API error {status}: {body}")));
        }

        if let Some(parent) = self.output_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::File::create(&self.output_file).await?;
        let mut stream = resp.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| IvaError::Voice(format!("elevenlabs stream error: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        debug!("wrote {written} bytes to {}", self.output_file.display());
        Ok(&self.output_file)
    }
}

#[async_trait]
impl Speaker for ElevenLabsSpeaker {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn speak(&self, text: &str) -> Result<(), IvaError> {
        let path = self.synthesize(text).await?;
        let file = path.to_string_lossy();
        command::run(&self.player_command, &[("file", file.as_ref())]).await
    }
}

/// Voices available to the account, as `(name, voice_id)`.
pub async fn list_voices(
    client: &reqwest::Client,
    base_url: Option<&str>,
    api_key: &str,
) -> Result<Vec<(String, String)>, IvaError> {
    let base = base_url.unwrap_or(ELEVENLABS_API).trim_end_matches('/');
    let resp = client
        .get(format!("{base}/v1/voices"))
        .header("xi-api-key", api_key)
        .send()
        .await
        .map_err(|e| IvaError::Voice(format!("elevenlabs request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(IvaError::Voice(format!("elevenlabs API error {status}: {body}")));
    }

    let list: VoiceList = resp
        .json()
        .await
        .map_err(|e| IvaError::Voice(format!("elevenlabs response parse failed: {e}")))?;
    Ok(list.voices.into_iter().map(|v| (v.name, v.voice_id)).collect())
}
