use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Google Calendar / Tasks integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_tasklist")]
    pub tasklist: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_tasks_credentials_path")]
    pub tasks_credentials_path: String,
    #[serde(default = "default_tasks_token_path")]
    pub tasks_token_path: String,
    /// Minutes before the event for the popup notification.
    #[serde(default = "default_popup_minutes")]
    pub popup_minutes: u32,
    /// IANA timezone name sent with events. `None` = the machine's zone.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            calendar_id: default_calendar_id(),
            tasklist: default_tasklist(),
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
            tasks_credentials_path: default_tasks_credentials_path(),
            tasks_token_path: default_tasks_token_path(),
            popup_minutes: default_popup_minutes(),
            timezone: None,
        }
    }
}
