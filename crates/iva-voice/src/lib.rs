//! # iva-voice
//!
//! Text-to-speech through ElevenLabs or a local engine, and speech-to-text by
//! recording a clip and sending it to Whisper.

pub mod command;
pub mod elevenlabs;
pub mod fallback;
pub mod listener;
pub mod local;
pub mod whisper;

use std::sync::Arc;

use async_trait::async_trait;
use iva_core::{
    config::{TtsEngine, VoiceConfig},
    error::IvaError,
};
use tracing::warn;

pub use elevenlabs::{list_voices, ElevenLabsSpeaker};
pub use fallback::FallbackSpeaker;
pub use listener::{Listener, RETRY_PROMPT};
pub use local::LocalSpeaker;
pub use whisper::{Transcriber, WhisperClient};

/// Something that can say a reply out loud.
#[async_trait]
pub trait Speaker: Send + Sync {
    fn name(&self) -> &str;

    /// Speak `text`, returning once playback has finished.
    async fn speak(&self, text: &str) -> Result<(), IvaError>;
}

/// Build the speaker selected by `tts_engine`, or `None` when replies are text-only.
pub fn build_speaker(config: &VoiceConfig) -> Option<Arc<dyn Speaker>> {
    let local: Arc<dyn Speaker> = Arc::new(LocalSpeaker::new(&config.local_tts_command));
    match config.tts_engine {
        TtsEngine::None => None,
        TtsEngine::Local => Some(local),
        TtsEngine::Elevenlabs if config.elevenlabs_api_key.is_empty() => {
            warn!("no ElevenLabs API key configured, using local speech");
            Some(local)
        }
        TtsEngine::Elevenlabs => Some(Arc::new(FallbackSpeaker::new(
            Arc::new(ElevenLabsSpeaker::from_config(config)),
            local,
        ))),
    }
}
