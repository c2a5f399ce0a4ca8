//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "IVA".to_string()
}

pub fn default_data_dir() -> String {
    "~/.iva".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_greeting() -> String {
    "How can I help you today?".to_string()
}

pub fn default_stop_phrases() -> Vec<String> {
    vec!["exit".to_string(), "goodbye".to_string()]
}

pub fn default_provider() -> String {
    "openai".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_temperature() -> f32 {
    0.5
}

pub fn default_max_tokens() -> u32 {
    300
}

pub fn default_presence_penalty() -> f32 {
    0.6
}

pub fn default_db_path() -> String {
    "~/.iva/data/memory.db".to_string()
}

pub fn default_max_context() -> usize {
    10
}

pub fn default_calendar_id() -> String {
    "primary".to_string()
}

pub fn default_tasklist() -> String {
    "@default".to_string()
}

pub fn default_credentials_path() -> String {
    "config/credentials.json".to_string()
}

pub fn default_token_path() -> String {
    "config/token.json".to_string()
}

pub fn default_tasks_credentials_path() -> String {
    "config/tasks_credentials.json".to_string()
}

pub fn default_tasks_token_path() -> String {
    "config/tasks_token.json".to_string()
}

pub fn default_popup_minutes() -> u32 {
    10
}

pub fn default_voice_id() -> String {
    "ThT5KcBeYPX3keUQqHPh".to_string()
}

pub fn default_voice_model_id() -> String {
    "eleven_monolingual_v1".to_string()
}

pub fn default_voice_stability() -> f32 {
    0.5
}

pub fn default_similarity_boost() -> f32 {
    0.5
}

pub fn default_output_file() -> String {
    "output.mp3".to_string()
}

pub fn default_player_command() -> String {
    if cfg!(target_os = "macos") {
        "afplay {file}".to_string()
    } else {
        "mpg123 -q {file}".to_string()
    }
}

pub fn default_local_tts_command() -> String {
    if cfg!(target_os = "macos") {
        "say {text}".to_string()
    } else {
        "espeak {text}".to_string()
    }
}

pub fn default_record_command() -> String {
    if cfg!(target_os = "macos") {
        "rec -q -c 1 -r 16000 {file} trim 0 {seconds}".to_string()
    } else {
        "arecord -q -f S16_LE -r 16000 -c 1 -d {seconds} {file}".to_string()
    }
}

pub fn default_record_seconds() -> u64 {
    5
}

pub fn default_max_listen_attempts() -> u32 {
    3
}

pub fn default_work_minutes() -> u64 {
    25
}

pub fn default_break_minutes() -> u64 {
    5
}
