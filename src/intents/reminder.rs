//! Reminder intent: recognise the request, pull out what and when, and write
//! the result to the journal, the store and the calendar.

use std::ops::Range;

use chrono::NaiveDateTime;
use iva_google::{InsertOutcome, ReminderEvent};
use iva_memory::{journal, store::NewReminder};
use regex::Regex;
use tracing::{error, info, warn};

use super::datetime::{extract_datetime, generate_time_formats, ExtractedDateTime};
use super::phrases::{contains_any, CLEAR_INTENT, INQUIRY, REMOVAL, VAGUE};
use super::replies::{REMINDER_CALENDAR_ERROR, REMINDER_SAVED};
use super::Outlets;

/// What the reminder handler made of an input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderIntent {
    /// A question about reminders; answer it, create nothing.
    Inquiry,
    /// Enough detail to save.
    Draft(ReminderDraft),
    /// Looked like a reminder but nothing was left to remind about.
    NeedsDetails,
    /// The date or time named something impossible.
    Unparseable,
}

/// A reminder that has been understood but not saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderDraft {
    pub content: String,
    pub when: ExtractedDateTime,
}

impl ReminderDraft {
    /// The sentence read back to the user and written to the journal.
    pub fn confirmation_sentence(&self) -> String {
        if self.when.recurring {
            format!(
                "Okay, I'll remind you every day at {} to {}.",
                self.when.time_str(),
                self.content
            )
        } else {
            format!(
                "Okay, I'll remind you on {} at {} to {}.",
                self.when.date_str(),
                self.when.time_str(),
                self.content
            )
        }
    }

    pub fn event(&self) -> ReminderEvent {
        ReminderEvent {
            summary: self.content.clone(),
            start: self.when.start(),
            recurring: self.when.recurring,
        }
    }
}

pub fn is_reminder_request(input: &str) -> bool {
    contains_any(input, CLEAR_INTENT) || contains_any(input, INQUIRY) || contains_any(input, VAGUE)
}

/// Classify `input`. `None` means it is not about reminders at all.
pub fn handle_reminder_request(input: &str, now: NaiveDateTime) -> Option<ReminderIntent> {
    if !is_reminder_request(input) {
        return None;
    }
    if contains_any(input, INQUIRY) {
        return Some(ReminderIntent::Inquiry);
    }

    let when = match extract_datetime(input, now) {
        Ok(when) => when,
        Err(e) => {
            info!("reminder date/time rejected: {e}");
            return Some(ReminderIntent::Unparseable);
        }
    };
    let content = extract_reminder_content(input, &when);
    if content.is_empty() {
        return Some(ReminderIntent::NeedsDetails);
    }
    Some(ReminderIntent::Draft(ReminderDraft { content, when }))
}

/// What is left of `input` once the trigger, filler and date/time phrases are gone.
pub fn extract_reminder_content(input: &str, when: &ExtractedDateTime) -> String {
    let stripped = remove_spans(input, &when.spans);
    let mut text = REMOVAL.replace_all(&stripped, " ").into_owned();

    let time_str = when.time_str();
    let leftovers = std::iter::once(when.date_str()).chain(generate_time_formats(&time_str));
    for literal in leftovers {
        // A bare hour reads the same as a quantity ("buy 5 apples").
        if literal.is_empty() || literal.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        text = remove_word(&text, &literal);
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_matches(|c: char| c == ':' || c.is_whitespace())
        .trim_end_matches(['.', ',', '!', '?', ';']);
    let trimmed = trimmed
        .strip_prefix("to ")
        .or_else(|| trimmed.strip_prefix("To "))
        .unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Cut byte ranges out of `input`. Overlapping or touching ranges merge into
/// one run, and each run leaves a single space behind.
fn remove_spans(input: &str, spans: &[Range<usize>]) -> String {
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut runs: Vec<Range<usize>> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match runs.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => runs.push(span),
        }
    }

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for run in runs {
        if let Some(kept) = input.get(cursor..run.start) {
            out.push_str(kept);
        }
        out.push(' ');
        cursor = run.end.min(input.len());
    }
    if let Some(rest) = input.get(cursor..) {
        out.push_str(rest);
    }
    out
}

fn remove_word(text: &str, literal: &str) -> String {
    let pattern = format!(r"(?i)(^|\s){}(\s|$)", regex::escape(literal));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(text, " ").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Write a confirmed reminder out. Returns the status lines for the user.
///
/// The journal comes first; if it fails nothing else is attempted. A store
/// failure is logged and does not block the calendar.
pub async fn save_reminder(draft: &ReminderDraft, outlets: &Outlets<'_>) -> String {
    let sentence = draft.confirmation_sentence();
    if let Err(e) = journal::save_to_file(outlets.journal_dir, journal::REMINDER, &sentence) {
        error!("reminder journal write failed: {e}");
        return REMINDER_CALENDAR_ERROR.to_string();
    }

    let mut lines = vec![REMINDER_SAVED.to_string()];

    let date = draft.when.date_str();
    let time = draft.when.time_str();
    let local_id = match outlets
        .store
        .save_reminder(&NewReminder {
            sender_id: outlets.sender_id,
            content: &draft.content,
            due_date: &date,
            due_time: &time,
            recurring: draft.when.recurring,
        })
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("reminder not mirrored locally: {e}");
            None
        }
    };

    let Some(calendar) = outlets.calendar else {
        return lines.join("\n");
    };

    match calendar.insert_event(&draft.event()).await {
        Ok(InsertOutcome::Created { id, html_link }) => {
            info!("reminder '{}' added to calendar as {id}", draft.content);
            if let Some(local_id) = &local_id {
                if let Err(e) = outlets
                    .store
                    .attach_event(local_id, &id, html_link.as_deref())
                    .await
                {
                    warn!("failed to link reminder {local_id} to event {id}: {e}");
                }
            }
        }
        Ok(outcome @ InsertOutcome::AlreadyExists) => lines.push(outcome.message()),
        Err(e) => {
            error!("calendar insert failed: {e}");
            lines.push(REMINDER_CALENDAR_ERROR.to_string());
        }
    }
    lines.join("\n")
}
