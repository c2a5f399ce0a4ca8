//! Built-in slash commands: instant responses, no provider call.

mod reminders;
mod status;
mod tasks;

#[cfg(test)]
mod tests;

use crate::focus::FocusTimer;
use iva_google::{CalendarClient, TasksClient};
use iva_memory::Store;
use std::time::Instant;

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub store: &'a Store,
    pub channel: &'a str,
    pub sender_id: &'a str,
    pub text: &'a str,
    pub uptime: &'a Instant,
    pub provider_name: &'a str,
    /// Short description of the speech setup, e.g. "text in, local out".
    pub voice: &'a str,
    pub calendar: Option<&'a CalendarClient>,
    pub tasks: Option<&'a TasksClient>,
    pub focus: &'a FocusTimer,
}

impl CommandContext<'_> {
    /// Everything after the command word.
    fn args(&self) -> Vec<&str> {
        self.text.split_whitespace().skip(1).collect()
    }
}

/// Known commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reminders,
    Done,
    Tasks,
    Focus,
    History,
    Forget,
    Status,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes
    /// (which should pass through to the intent handlers and the provider).
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        match first.to_lowercase().as_str() {
            "/reminders" | "/todo" => Some(Self::Reminders),
            "/done" => Some(Self::Done),
            "/tasks" => Some(Self::Tasks),
            "/focus" => Some(Self::Focus),
            "/history" => Some(Self::History),
            "/forget" => Some(Self::Forget),
            "/status" => Some(Self::Status),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Handle a command and return the response text.
pub async fn handle(cmd: Command, ctx: &CommandContext<'_>) -> String {
    match cmd {
        Command::Reminders => reminders::handle_reminders(ctx).await,
        Command::Done => reminders::handle_done(ctx).await,
        Command::Tasks => tasks::handle_tasks(ctx).await,
        Command::Focus => handle_focus(ctx.focus, &ctx.args()),
        Command::History => {
            status::handle_history(ctx.store, ctx.channel, ctx.sender_id).await
        }
        Command::Forget => tasks::handle_forget(ctx.store, ctx.channel, ctx.sender_id).await,
        Command::Status => status::handle_status(ctx),
        Command::Help => status::handle_help(),
    }
}

fn handle_focus(focus: &FocusTimer, args: &[&str]) -> String {
    match args.first().map(|a| a.to_lowercase()).as_deref() {
        None | Some("status") => focus.status(),
        Some("start") => focus.start(),
        Some("pause") | Some("stop") => focus.pause(),
        Some("reset") => focus.reset(),
        Some("longer") => focus.longer(),
        Some("shorter") => focus.shorter(),
        Some(_) => "Usage: /focus [start|pause|reset|status|longer|shorter]".to_string(),
    }
}
