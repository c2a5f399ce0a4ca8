//! Status and information command handlers: /status, /history, /help.

use super::CommandContext;
use iva_memory::Store;
use std::time::Instant;

fn format_uptime(uptime: &Instant) -> String {
    let elapsed = uptime.elapsed();
    let hours = elapsed.as_secs() / 3600;
    let minutes = (elapsed.as_secs() % 3600) / 60;
    let secs = elapsed.as_secs() % 60;
    format!("{hours}h {minutes}m {secs}s")
}

pub(super) fn handle_status(ctx: &CommandContext<'_>) -> String {
    let google = if ctx.calendar.is_some() {
        "connected"
    } else {
        "disabled"
    };
    format!(
        "IVA Status\n\
         Uptime: {}\n\
         Provider: {}\n\
         Google: {google}\n\
         Voice: {}\n\
         {}",
        format_uptime(ctx.uptime),
        ctx.provider_name,
        ctx.voice,
        ctx.focus.status(),
    )
}

pub(super) async fn handle_history(store: &Store, channel: &str, sender_id: &str) -> String {
    match store.recent_turns(channel, sender_id, 10).await {
        Ok(turns) if turns.is_empty() => "No conversation history yet.".to_string(),
        Ok(turns) => format!(
            "Recent conversation:\n\n{}",
            iva_memory::store::format_transcript(&turns)
        ),
        Err(e) => format!("Error: {e}"),
    }
}

pub(super) fn handle_help() -> String {
    "IVA Commands\n\n\
     /reminders [week]  Upcoming reminders for today or the week\n\
     /done <id>         Mark a reminder as done\n\
     /tasks             Open tasks (/tasks done <id> to complete one)\n\
     /focus [start|pause|reset|longer|shorter]  Focus timer\n\
     /history           Recent conversation\n\
     /forget            Clear the current conversation\n\
     /status            Uptime, provider, integrations\n\
     /help              This message\n\n\
     Say \"exit\" or \"goodbye\" to end the session."
        .to_string()
}
