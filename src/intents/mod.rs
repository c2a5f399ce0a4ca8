//! Hand-written intent handlers: reminders and tasks are recognised by
//! keyword tables and regexes before anything reaches the chat provider.

pub mod datetime;
pub mod phrases;
pub mod reminder;
pub mod task;

use std::path::Path;

use iva_google::{CalendarClient, TasksClient};
use iva_memory::Store;

/// Everywhere a confirmed reminder or task gets written.
///
/// The journal and the store are always available; the Google clients are
/// `None` when the integration is disabled.
pub struct Outlets<'a> {
    pub journal_dir: &'a Path,
    pub store: &'a Store,
    pub sender_id: &'a str,
    pub calendar: Option<&'a CalendarClient>,
    pub tasks: Option<&'a TasksClient>,
}

/// Fixed replies shared by the handlers and the gateway.
pub mod replies {
    pub const REMINDER_INQUIRY: &str = "Yes, you can set a reminder. Please provide the details.";
    pub const REMINDER_SAVED: &str = "Reminder saved successfully.";
    pub const REMINDER_CALENDAR_ERROR: &str =
        "There was an error setting the reminder on Google Calendar.";
    pub const REMINDER_UNPARSEABLE: &str = "Couldn't understand the time or date. Please re-enter.";
    pub const REMINDER_NOT_SAVED: &str = "Reminder not saved.";
    pub const TASK_SAVED: &str = "Task saved successfully!";
    pub const TASK_ERROR: &str = "There was an error setting the task in Google Tasks.";
    pub const TASK_NOT_SAVED: &str = "Task not saved.";
    pub const CONFIRM_AGAIN: &str = "I didn't understand your response. Please confirm again.";
    pub const APOLOGY: &str = "Sorry, I couldn't process that request right now.";
    pub const GOODBYE: &str = "Goodbye!";
}
