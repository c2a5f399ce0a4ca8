//! Task intent: "add to my tasks ...", "create a to-do ...".

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use iva_memory::journal;
use regex::Regex;
use tracing::{debug, error, info, warn};

use super::datetime::extract_datetime;
use super::phrases::TASK;
use super::replies::{TASK_ERROR, TASK_SAVED};
use super::Outlets;

/// The trigger patterns, case-insensitive so byte offsets stay valid on the input text.
static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TASK.iter()
        .map(|r| Regex::new(&format!("(?i){}", r.as_str())).expect("valid task trigger"))
        .collect()
});

static POLITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:please|can you|could you|for me)\b").expect("valid polite pattern")
});

static LEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[:\-]\s*|(?:to|called|that says|for)\s+)+").expect("valid leading pattern")
});

static TRAILING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:by|on|for|due|before)$").expect("valid trailing pattern")
});

/// A task that has been understood but not saved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub due: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn confirmation_question(&self) -> String {
        format!("Do you want to save this task: {}?", self.title)
    }

    fn due_str(&self) -> Option<String> {
        self.due.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

pub fn is_task_request(input: &str) -> bool {
    let lower = input.to_lowercase();
    TASK.iter().any(|r| r.is_match(&lower))
}

/// `None` when `input` is not a task request or names no task.
pub fn handle_task_request(input: &str, now: NaiveDateTime) -> Option<TaskDraft> {
    if !is_task_request(input) {
        return None;
    }
    let draft = extract_task_content(input, now);
    if draft.title.is_empty() {
        debug!("task trigger without a title: {input:?}");
        return None;
    }
    Some(draft)
}

/// Split `input` into a task title and an optional due date.
pub fn extract_task_content(input: &str, now: NaiveDateTime) -> TaskDraft {
    let mut text = input.to_string();
    if let Some(m) = TRIGGERS.iter().find_map(|r| r.find(input)) {
        text.replace_range(m.range(), " ");
    }

    let mut due = None;
    if let Ok(when) = extract_datetime(&text, now) {
        if when.has_date {
            due = Some(when.date);
            let mut spans = when.spans;
            spans.sort_by_key(|r| std::cmp::Reverse(r.start));
            for span in spans {
                if text.get(span.clone()).is_some() {
                    text.replace_range(span, " ");
                }
            }
        }
    }

    let text = POLITE.replace_all(&text, " ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let title = LEADING.replace(&collapsed, "");
    let title = title.trim_end_matches(['.', ',', '!', '?', ';']);
    let title = TRAILING.replace(title.trim(), "");

    TaskDraft {
        title: title.trim().to_string(),
        due,
    }
}

/// Write a confirmed task out. Returns the status lines for the user.
pub async fn save_task(draft: &TaskDraft, outlets: &Outlets<'_>) -> String {
    if let Err(e) = journal::save_to_file(outlets.journal_dir, journal::TASK, &draft.title) {
        error!("task journal write failed: {e}");
        return TASK_ERROR.to_string();
    }

    let mut lines = vec![TASK_SAVED.to_string()];
    let due = draft.due_str();
    let local_id = match outlets
        .store
        .save_task(outlets.sender_id, &draft.title, due.as_deref(), None)
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("task not mirrored locally: {e}");
            None
        }
    };

    let Some(tasks) = outlets.tasks else {
        return lines.join("\n");
    };

    match tasks.insert_task(&draft.title, draft.due, None).await {
        Ok(remote_id) => {
            info!("task '{}' added to Google Tasks as {remote_id}", draft.title);
            if let Some(local_id) = &local_id {
                if let Err(e) = outlets.store.attach_remote_task(local_id, &remote_id).await {
                    warn!("failed to link task {local_id} to {remote_id}: {e}");
                }
            }
        }
        Err(e) => {
            error!("tasks insert failed: {e}");
            lines.push(TASK_ERROR.to_string());
        }
    }
    lines.join("\n")
}
