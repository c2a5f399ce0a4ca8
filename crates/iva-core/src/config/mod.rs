mod defaults;
mod google;
mod prompts;
mod providers;
mod voice;


pub use google::*;
pub use prompts::*;
pub use providers::*;
pub use voice::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::IvaError;
use defaults::*;

/// Top-level IVA configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub iva: IvaConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub focus: FocusConfig,
}

/// General assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvaConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// First message shown when the chat opens.
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Inputs that end the session (exact match, case-insensitive).
    #[serde(default = "default_stop_phrases")]
    pub stop_phrases: Vec<String>,
    /// Ask "yes/no" before saving a reminder or task.
    #[serde(default)]
    pub confirm_before_saving: bool,
}

impl Default for IvaConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            greeting: default_greeting(),
            stop_phrases: default_stop_phrases(),
            confirm_before_saving: false,
        }
    }
}

impl IvaConfig {
    /// Directory holding journal text files.
    pub fn journal_dir(&self) -> PathBuf {
        Path::new(&shellexpand(&self.data_dir)).join("journal")
    }

    /// Directory holding rolling log files.
    pub fn logs_dir(&self) -> PathBuf {
        Path::new(&shellexpand(&self.data_dir)).join("logs")
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Conversation turns sent to the model per request.
    #[serde(default = "default_max_context")]
    pub max_context_messages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_context_messages: default_max_context(),
        }
    }
}

/// Focus (pomodoro) timer lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment variables
/// override secrets and the data directory.
pub fn load(path: &str) -> Result<Config, IvaError> {
    let path = Path::new(path);
    let mut config = if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    } else {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IvaError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        parse(&content)?
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    derive_paths(&mut config);
    Ok(config)
}

/// Parse a TOML document into a config.
pub fn parse(content: &str) -> Result<Config, IvaError> {
    toml::from_str(content).map_err(|e| IvaError::Config(format!("failed to parse config: {}", e)))
}

/// An unset `memory.db_path` follows `data_dir`, so moving the data
/// directory moves the database with the journals and logs.
pub fn derive_paths(config: &mut Config) {
    if config.memory.db_path == defaults::default_db_path() {
        config.memory.db_path = format!(
            "{}/data/memory.db",
            config.iva.data_dir.trim_end_matches('/')
        );
    }
}

/// Apply environment overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
        config
            .provider
            .openai
            .get_or_insert_with(OpenAiConfig::default)
            .api_key = key;
    }
    if let Some(key) = lookup("ELEVENLABS_API_KEY").filter(|k| !k.is_empty()) {
        config.voice.elevenlabs_api_key = key;
    }
    if let Some(dir) = lookup("IVA_DATA_DIR").filter(|d| !d.is_empty()) {
        config.iva.data_dir = dir;
    }
}
