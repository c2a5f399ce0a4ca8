use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Where user input comes from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Typed lines on stdin.
    #[default]
    Text,
    /// Recorded clips transcribed by Whisper.
    Speech,
}

/// Which text-to-speech engine speaks replies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngine {
    /// Replies are printed only.
    #[default]
    None,
    /// A local command such as `say` or `espeak`.
    Local,
    /// ElevenLabs, falling back to the local command on failure.
    Elevenlabs,
}

impl TtsEngine {
    pub fn display_name(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Local => "local",
            Self::Elevenlabs => "elevenlabs",
        }
    }
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub input_mode: InputMode,
    #[serde(default)]
    pub tts_engine: TtsEngine,
    #[serde(default)]
    pub elevenlabs_api_key: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_voice_model_id")]
    pub model_id: String,
    #[serde(default = "default_voice_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    /// Where synthesized audio is written before playback.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// Audio player; `{file}` is replaced by the audio path.
    #[serde(default = "default_player_command")]
    pub player_command: String,
    /// Local speech engine; `{text}` is replaced by the text to speak.
    #[serde(default = "default_local_tts_command")]
    pub local_tts_command: String,
    /// Recorder; `{file}` and `{seconds}` are substituted.
    #[serde(default = "default_record_command")]
    pub record_command: String,
    #[serde(default = "default_record_seconds")]
    pub record_seconds: u64,
    /// Whisper key. Empty = reuse the OpenAI provider key.
    #[serde(default)]
    pub whisper_api_key: String,
    #[serde(default = "default_max_listen_attempts")]
    pub max_listen_attempts: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            input_mode: InputMode::default(),
            tts_engine: TtsEngine::default(),
            elevenlabs_api_key: String::new(),
            voice_id: default_voice_id(),
            model_id: default_voice_model_id(),
            stability: default_voice_stability(),
            similarity_boost: default_similarity_boost(),
            output_file: default_output_file(),
            player_command: default_player_command(),
            local_tts_command: default_local_tts_command(),
            record_command: default_record_command(),
            record_seconds: default_record_seconds(),
            whisper_api_key: String::new(),
            max_listen_attempts: default_max_listen_attempts(),
        }
    }
}
