//! Yes/no confirmation before a reminder or task is saved.

use super::pipeline::Reply;
use super::Gateway;
use crate::intents::phrases::{classify_answer, Answer};
use crate::intents::reminder::{save_reminder, ReminderDraft};
use crate::intents::replies::{CONFIRM_AGAIN, REMINDER_NOT_SAVED, TASK_NOT_SAVED};
use crate::intents::task::{save_task, TaskDraft};
use tracing::info;

/// An action parked until the sender answers yes or no.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Reminder(ReminderDraft),
    Task(TaskDraft),
}

impl PendingAction {
    pub fn question(&self) -> String {
        match self {
            Self::Reminder(draft) => format!(
                "{} Do you want to save this reminder?",
                draft.confirmation_sentence()
            ),
            Self::Task(draft) => draft.confirmation_question(),
        }
    }

    fn declined(&self) -> &'static str {
        match self {
            Self::Reminder(_) => REMINDER_NOT_SAVED,
            Self::Task(_) => TASK_NOT_SAVED,
        }
    }

    pub(super) fn handled_by(&self) -> &'static str {
        match self {
            Self::Reminder(_) => "reminder",
            Self::Task(_) => "task",
        }
    }
}

impl Gateway {
    /// Park `action` for the sender and return the question to ask.
    pub(super) async fn ask_confirmation(&self, sender_key: &str, action: PendingAction) -> Reply {
        let question = action.question();
        let handled_by = action.handled_by();
        self.pending
            .lock()
            .await
            .insert(sender_key.to_string(), action);
        Reply::handled(handled_by, question)
    }

    /// Answer a parked action. `None` when the sender has nothing pending.
    pub(super) async fn resolve_pending(
        &self,
        sender_key: &str,
        sender_id: &str,
        input: &str,
    ) -> Option<Reply> {
        let action = self.pending.lock().await.remove(sender_key)?;
        let handled_by = action.handled_by();

        let text = match classify_answer(input) {
            Answer::Yes => {
                info!("[{sender_key}] confirmed {handled_by}");
                self.save_action(&action, sender_id).await
            }
            Answer::No => {
                info!("[{sender_key}] declined {handled_by}");
                action.declined().to_string()
            }
            Answer::Unclear => {
                self.pending
                    .lock()
                    .await
                    .insert(sender_key.to_string(), action);
                CONFIRM_AGAIN.to_string()
            }
        };
        Some(Reply::handled(handled_by, text))
    }

    pub(super) async fn save_action(&self, action: &PendingAction, sender_id: &str) -> String {
        let outlets = self.outlets(sender_id);
        match action {
            PendingAction::Reminder(draft) => save_reminder(draft, &outlets).await,
            PendingAction::Task(draft) => save_task(draft, &outlets).await,
        }
    }
}
