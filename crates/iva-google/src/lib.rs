//! # iva-google
//!
//! Thin REST clients for the Google services IVA forwards reminders and tasks to:
//! OAuth2 token handling, Calendar v3 events, and Tasks v1.

pub mod calendar;
pub mod oauth;
pub mod tasks;

pub use calendar::{CalendarClient, EventSummary, InsertOutcome, Period, ReminderEvent};
pub use oauth::{GoogleAuth, StaticToken, TokenSource, CALENDAR_SCOPE, TASKS_SCOPE};
pub use tasks::{RemoteTask, TasksClient};

use iva_core::error::IvaError;
use serde::Deserialize;

/// Google's JSON error envelope.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Turn a non-success response into an error, preferring Google's own message.
pub(crate) async fn api_error(what: &str, resp: reqwest::Response) -> IvaError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    IvaError::Google(format!("{what} returned {status}: {message}"))
}
