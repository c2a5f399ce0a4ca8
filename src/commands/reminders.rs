//! Reminder commands: /reminders [day|week], /done <id>.

use super::CommandContext;
use chrono::{Duration, Local, NaiveDate};
use iva_core::error::IvaError;
use iva_google::{CalendarClient, EventSummary, Period};
use iva_memory::ReminderRecord;
use tracing::{error, warn};

const CALENDAR_UNREACHABLE: &str = "Couldn't reach Google Calendar right now.";

pub(super) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn empty_message(period: Period) -> &'static str {
    match period {
        Period::Day => "No reminders for today.",
        Period::Week => "No reminders for this week.",
    }
}

fn header(period: Period) -> &'static str {
    match period {
        Period::Day => "Reminders for today:",
        Period::Week => "Reminders for this week:",
    }
}

pub(super) async fn handle_reminders(ctx: &CommandContext<'_>) -> String {
    let period = match ctx.args().first() {
        None => Period::Day,
        Some(arg) => match arg.parse::<Period>() {
            Ok(p) => p,
            Err(IvaError::Google(msg)) => return msg,
            Err(e) => return format!("Error: {e}"),
        },
    };

    match ctx.calendar {
        Some(calendar) => list_calendar(calendar, period).await,
        None => list_local(ctx, period).await,
    }
}

async fn list_calendar(calendar: &CalendarClient, period: Period) -> String {
    match calendar.list_events(period, Local::now()).await {
        Ok(events) => format_events(period, &events),
        Err(e) => {
            error!("listing calendar events failed: {e}");
            CALENDAR_UNREACHABLE.to_string()
        }
    }
}

pub(super) fn format_events(period: Period, events: &[EventSummary]) -> String {
    if events.is_empty() {
        return empty_message(period).to_string();
    }
    let mut out = header(period).to_string();
    for event in events {
        out.push_str(&format!(
            "\n[{}] {} ({})",
            short_id(&event.id),
            event.summary,
            event.time
        ));
    }
    out
}

async fn list_local(ctx: &CommandContext<'_>, period: Period) -> String {
    match ctx.store.pending_reminders(ctx.sender_id).await {
        Ok(all) => format_local(period, &all, Local::now().date_naive()),
        Err(e) => format!("Error: {e}"),
    }
}

/// Pending reminders due within the period; daily ones always show.
pub(super) fn format_local(period: Period, reminders: &[ReminderRecord], today: NaiveDate) -> String {
    let last = today + period.span() - Duration::days(1);
    let due: Vec<&ReminderRecord> = reminders
        .iter()
        .filter(|r| {
            r.recurring
                || NaiveDate::parse_from_str(&r.due_date, "%Y-%m-%d")
                    .is_ok_and(|d| d >= today && d <= last)
        })
        .collect();

    if due.is_empty() {
        return empty_message(period).to_string();
    }
    let mut out = header(period).to_string();
    for r in due {
        let when = if r.recurring {
            format!("every day at {}", r.due_time)
        } else {
            format!("{} at {}", r.due_date, r.due_time)
        };
        out.push_str(&format!("\n[{}] {} ({when})", short_id(&r.id), r.content));
    }
    out
}

pub(super) async fn handle_done(ctx: &CommandContext<'_>) -> String {
    let Some(prefix) = ctx.args().first().map(|s| s.to_string()) else {
        return "Usage: /done <id>".to_string();
    };

    let local = match ctx.store.complete_reminder(&prefix, ctx.sender_id).await {
        Ok(found) => found,
        Err(e) => return format!("Error: {e}"),
    };

    if let Some(record) = local {
        let mut reply = format!("Marked '{}' as done.", record.content);
        if let (Some(calendar), Some(event_id)) = (ctx.calendar, record.event_id.as_deref()) {
            if let Err(e) = calendar.mark_done(event_id).await {
                error!("cancelling event {event_id} failed: {e}");
                reply.push('\n');
                reply.push_str(CALENDAR_UNREACHABLE);
            }
        }
        return reply;
    }

    // Not mirrored locally: look the id up among upcoming calendar events.
    let Some(calendar) = ctx.calendar else {
        return "No reminder matches that id.".to_string();
    };
    let events = match calendar.list_events(Period::Week, Local::now()).await {
        Ok(events) => events,
        Err(e) => {
            error!("listing calendar events failed: {e}");
            return CALENDAR_UNREACHABLE.to_string();
        }
    };
    let Some(event) = events.iter().find(|e| e.id.starts_with(&prefix)) else {
        return "No reminder matches that id.".to_string();
    };
    match calendar.mark_done(&event.id).await {
        Ok(()) => {
            if let Err(e) = ctx.store.mark_reminder_done(&event.id).await {
                warn!("local reminder for {} not updated: {e}", event.id);
            }
            format!("Marked '{}' as done.", event.summary)
        }
        Err(e) => {
            error!("cancelling event {} failed: {e}", event.id);
            CALENDAR_UNREACHABLE.to_string()
        }
    }
}
