//! Task and data management command handlers: /tasks, /forget.

use super::reminders::short_id;
use super::CommandContext;
use iva_google::{RemoteTask, TasksClient};
use iva_memory::{Store, TaskRecord};
use tracing::error;

pub(super) async fn handle_tasks(ctx: &CommandContext<'_>) -> String {
    let args = ctx.args();
    if args.first().is_some_and(|a| a.eq_ignore_ascii_case("done")) {
        let Some(prefix) = args.get(1) else {
            return "Usage: /tasks done <id>".to_string();
        };
        return match ctx.store.complete_task(prefix, ctx.sender_id).await {
            Ok(true) => "Task marked as done.".to_string(),
            Ok(false) => "No open task matches that id.".to_string(),
            Err(e) => format!("Error: {e}"),
        };
    }

    if let Some(client) = ctx.tasks {
        if let Some(listing) = list_remote(client).await {
            return listing;
        }
    }

    match ctx.store.open_tasks(ctx.sender_id).await {
        Ok(tasks) => format_local(&tasks),
        Err(e) => format!("Error: {e}"),
    }
}

/// Google Tasks listing, `None` when the API is unreachable.
async fn list_remote(client: &TasksClient) -> Option<String> {
    match client.list_tasks().await {
        Ok(tasks) => Some(format_remote(&tasks)),
        Err(e) => {
            error!("listing Google tasks failed, showing local tasks: {e}");
            None
        }
    }
}

fn format_remote(tasks: &[RemoteTask]) -> String {
    format_lines(
        tasks
            .iter()
            .map(|t| (t.id.as_str(), t.title.as_str(), t.due_date().map(|d| d.to_string()))),
    )
}

fn format_local(tasks: &[TaskRecord]) -> String {
    format_lines(
        tasks
            .iter()
            .map(|t| (t.id.as_str(), t.title.as_str(), t.due_date.clone())),
    )
}

fn format_lines<'a>(tasks: impl Iterator<Item = (&'a str, &'a str, Option<String>)>) -> String {
    let mut out = "Open tasks:".to_string();
    let mut any = false;
    for (id, title, due) in tasks {
        any = true;
        out.push_str(&format!("\n[{}] {title}", short_id(id)));
        if let Some(due) = due {
            out.push_str(&format!(" (due {due})"));
        }
    }
    if any {
        out
    } else {
        "No open tasks.".to_string()
    }
}

pub(super) async fn handle_forget(store: &Store, channel: &str, sender_id: &str) -> String {
    match store.close_conversation(channel, sender_id).await {
        Ok(true) => "Conversation cleared. Fresh start!".to_string(),
        Ok(false) => "No active conversation to clear.".to_string(),
        Err(e) => format!("Error: {e}"),
    }
}
