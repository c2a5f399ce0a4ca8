//! Speech input: record a clip, transcribe it, ask again if nothing was heard.

use std::{path::PathBuf, sync::Arc};

use iva_core::{config::VoiceConfig, error::IvaError};
use tracing::{debug, info, warn};

use crate::{command, whisper::Transcriber};

pub const RETRY_PROMPT: &str = "Sorry, I didn't catch that. Please try again.";

pub struct Listener {
    transcriber: Arc<dyn Transcriber>,
    record_command: String,
    record_seconds: u64,
    audio_path: PathBuf,
    max_attempts: u32,
}

impl Listener {
    pub fn new(config: &VoiceConfig, transcriber: Arc<dyn Transcriber>, audio_path: PathBuf) -> Self {
        Self {
            transcriber,
            record_command: config.record_command.clone(),
            record_seconds: config.record_seconds,
            audio_path,
            max_attempts: config.max_listen_attempts.max(1),
        }
    }

    /// Record one clip and transcribe it. Empty string when nothing was understood.
    pub async fn listen_once(&self) -> Result<String, IvaError> {
        if let Some(parent) = self.audio_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = self.audio_path.to_string_lossy();
        let seconds = self.record_seconds.to_string();
        command::run(
            &self.record_command,
            &[("file", file.as_ref()), ("seconds", seconds.as_str())],
        )
        .await?;

        let audio = tokio::fs::read(&self.audio_path).await?;
        debug!("recorded {} bytes", audio.len());
        if audio.is_empty() {
            return Ok(String::new());
        }
        self.transcriber.transcribe(&audio).await
    }

    /// Listen until something is understood or the attempts run out.
    ///
    /// `on_retry` receives [`RETRY_PROMPT`] after each empty or failed attempt
    /// that will be followed by another one.
    pub async fn listen<F>(&self, mut on_retry: F) -> Result<Option<String>, IvaError>
    where
        F: FnMut(&str) + Send,
    {
        for attempt in 1..=self.max_attempts {
            info!("listening (attempt {attempt}/{})", self.max_attempts);
            match self.listen_once().await {
                Ok(text) if !text.trim().is_empty() => return Ok(Some(text.trim().to_string())),
                Ok(_) => debug!("nothing recognised"),
                Err(e) => warn!("listen attempt {attempt} failed: {e}"),
            }
            if attempt < self.max_attempts {
                on_retry(RETRY_PROMPT);
            }
        }
        Ok(None)
    }
}
