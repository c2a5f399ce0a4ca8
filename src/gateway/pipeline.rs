//! Message processing pipeline: the main handle_message flow.

use super::confirmation::PendingAction;
use super::Gateway;
use crate::commands;
use crate::intents::reminder::{handle_reminder_request, save_reminder, ReminderDraft, ReminderIntent};
use crate::intents::replies::{APOLOGY, GOODBYE, REMINDER_INQUIRY, REMINDER_SAVED, REMINDER_UNPARSEABLE};
use crate::intents::task::{handle_task_request, save_task, TaskDraft};
use chrono::Local;
use iva_core::{
    context::{Context, ContextEntry},
    message::{IncomingMessage, MessageMetadata},
};
use iva_memory::{
    audit::{AuditEntry, AuditStatus},
    journal,
    store::format_transcript,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What the pipeline decided to answer.
pub(super) struct Reply {
    pub text: String,
    /// "reminder", "task", "command", or the provider name.
    pub handled_by: String,
    pub model: Option<String>,
    pub error: Option<String>,
}

impl Reply {
    pub(super) fn handled(handled_by: &str, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            handled_by: handled_by.to_string(),
            model: None,
            error: None,
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > 60 {
        let truncated: String = text.chars().take(60).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

impl Gateway {
    /// Process a single incoming message through the full pipeline.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let started = Instant::now();
        info!(
            "[{}] {} says: {}",
            incoming.channel,
            incoming
                .sender_name
                .as_deref()
                .unwrap_or(&incoming.sender_id),
            preview(&incoming.text)
        );
        let text = incoming.text.trim().to_string();

        // --- 1. STOP PHRASE ---
        if self.is_stop_phrase(&text) {
            self.end_session(&incoming, started).await;
            return;
        }

        // --- 2. COMMAND DISPATCH ---
        if let Some(cmd) = commands::Command::parse(&text) {
            let ctx = commands::CommandContext {
                store: &self.memory,
                channel: &incoming.channel,
                sender_id: &incoming.sender_id,
                text: &text,
                uptime: &self.uptime,
                provider_name: self.provider.name(),
                voice: &self.voice_label,
                calendar: self.calendar.as_ref(),
                tasks: self.tasks.as_ref(),
                focus: &self.focus,
            };
            let response = commands::handle(cmd, &ctx).await;
            self.send_text(&incoming, &response).await;
            self.audit_exchange(&incoming, &Reply::handled("command", response), started)
                .await;
            return;
        }

        // --- 3. TYPING INDICATOR ---
        let channel = self.channels.get(&incoming.channel).cloned();
        if let Some(ch) = &channel {
            if let Err(e) = ch.send_typing().await {
                debug!("typing indicator failed: {e}");
            }
        }

        // --- 4. HISTORY, THEN RECORD THE USER TURN ---
        let window = self.memory.max_context_messages();
        let history = match self
            .memory
            .recent_turns(&incoming.channel, &incoming.sender_id, window)
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                warn!("failed to load history: {e}");
                Vec::new()
            }
        };
        if let Err(e) = self
            .memory
            .append_turn(
                &incoming.channel,
                &incoming.sender_id,
                &ContextEntry::user(&text),
                None,
            )
            .await
        {
            error!("failed to store user turn: {e}");
        }

        // --- 5. ROUTE: confirmation, reminder, task, provider ---
        let reply = self.route(&incoming, &text, &history).await;

        // --- 6. RECORD, SEND, AUDIT ---
        let metadata = MessageMetadata {
            provider_used: reply.handled_by.clone(),
            tokens_used: None,
            processing_time_ms: started.elapsed().as_millis() as u64,
            model: reply.model.clone(),
        };
        if let Err(e) = self
            .memory
            .append_turn(
                &incoming.channel,
                &incoming.sender_id,
                &ContextEntry::assistant(&reply.text),
                Some(&metadata),
            )
            .await
        {
            error!("failed to store assistant turn: {e}");
        }

        if let Some(ch) = &channel {
            if let Err(e) = ch.stop_typing().await {
                debug!("clearing typing indicator failed: {e}");
            }
        }
        self.send_text(&incoming, &reply.text).await;
        self.audit_exchange(&incoming, &reply, started).await;
    }

    async fn route(
        &self,
        incoming: &IncomingMessage,
        text: &str,
        history: &[ContextEntry],
    ) -> Reply {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        if let Some(reply) = self
            .resolve_pending(&sender_key, &incoming.sender_id, text)
            .await
        {
            return reply;
        }

        let now = Local::now().naive_local();
        match handle_reminder_request(text, now) {
            Some(ReminderIntent::Inquiry) => return Reply::handled("reminder", REMINDER_INQUIRY),
            Some(ReminderIntent::Unparseable) => {
                return Reply::handled("reminder", REMINDER_UNPARSEABLE)
            }
            Some(ReminderIntent::Draft(draft)) => {
                return self
                    .reminder_reply(&sender_key, &incoming.sender_id, draft)
                    .await
            }
            Some(ReminderIntent::NeedsDetails) => {
                debug!("[{sender_key}] reminder request without content, asking the provider");
            }
            None => {}
        }

        if let Some(draft) = handle_task_request(text, now) {
            return self
                .task_reply(&sender_key, &incoming.sender_id, draft)
                .await;
        }

        self.chat(text, history).await
    }

    async fn reminder_reply(&self, sender_key: &str, sender_id: &str, draft: ReminderDraft) -> Reply {
        if self.settings.confirm_before_saving {
            return self
                .ask_confirmation(sender_key, PendingAction::Reminder(draft))
                .await;
        }
        let status = save_reminder(&draft, &self.outlets(sender_id)).await;
        let text = if status.starts_with(REMINDER_SAVED) {
            format!("{}\n{status}", draft.confirmation_sentence())
        } else {
            status
        };
        Reply::handled("reminder", text)
    }

    async fn task_reply(&self, sender_key: &str, sender_id: &str, draft: TaskDraft) -> Reply {
        if self.settings.confirm_before_saving {
            return self
                .ask_confirmation(sender_key, PendingAction::Task(draft))
                .await;
        }
        Reply::handled("task", save_task(&draft, &self.outlets(sender_id)).await)
    }

    /// General conversation: the last N turns go to the provider.
    async fn chat(&self, text: &str, history: &[ContextEntry]) -> Reply {
        let window = self.memory.max_context_messages();
        let context = Context::with_window(&self.prompts.system, history, text, window);
        let provider_name = self.provider.name().to_string();

        match self.provider.complete(&context).await {
            Ok(response) => Reply {
                text: response.text,
                handled_by: provider_name,
                model: response.metadata.model,
                error: None,
            },
            Err(e) => {
                error!("provider request failed: {e}");
                Reply {
                    text: APOLOGY.to_string(),
                    handled_by: provider_name,
                    model: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn is_stop_phrase(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.settings
            .stop_phrases
            .iter()
            .any(|p| p.trim().to_lowercase() == lower)
    }

    /// Save the transcript, close the conversation, say goodbye, and stop the loop.
    async fn end_session(&self, incoming: &IncomingMessage, started: Instant) {
        match self
            .memory
            .conversation_turns(&incoming.channel, &incoming.sender_id)
            .await
        {
            Ok(turns) if turns.is_empty() => debug!("empty conversation, no transcript written"),
            Ok(turns) => {
                let transcript = format_transcript(&turns);
                match journal::save_to_file(&self.journal_dir, journal::CONVERSATION, &transcript) {
                    Ok(path) => info!("transcript saved to {}", path.display()),
                    Err(e) => error!("failed to save transcript: {e}"),
                }
            }
            Err(e) => error!("failed to load conversation for transcript: {e}"),
        }

        if let Err(e) = self
            .memory
            .close_conversation(&incoming.channel, &incoming.sender_id)
            .await
        {
            warn!("failed to close conversation: {e}");
        }
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);
        self.pending.lock().await.remove(&sender_key);

        self.send_text(incoming, GOODBYE).await;
        self.audit_exchange(incoming, &Reply::handled("stop", GOODBYE), started)
            .await;
        self.stop.notify_one();
    }

    async fn audit_exchange(&self, incoming: &IncomingMessage, reply: &Reply, started: Instant) {
        let entry = AuditEntry {
            channel: incoming.channel.clone(),
            sender_id: incoming.sender_id.clone(),
            input_text: incoming.text.clone(),
            output_text: Some(reply.text.clone()),
            handled_by: Some(reply.handled_by.clone()),
            model: reply.model.clone(),
            processing_ms: Some(started.elapsed().as_millis() as i64),
            status: if reply.error.is_some() {
                AuditStatus::Error
            } else {
                AuditStatus::Ok
            },
            error: reply.error.clone(),
        };
        if let Err(e) = self.audit.log(&entry).await {
            warn!("audit log failed: {e}");
        }
    }
}
