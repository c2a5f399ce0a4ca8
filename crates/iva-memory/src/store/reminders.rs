//! Local mirror of reminders forwarded to the calendar.

use super::Store;
use iva_core::error::IvaError;
use uuid::Uuid;

/// A reminder about to be saved.
#[derive(Debug, Clone)]
pub struct NewReminder<'a> {
    pub sender_id: &'a str,
    pub content: &'a str,
    /// `YYYY-MM-DD`.
    pub due_date: &'a str,
    /// `hh:mm AM`.
    pub due_time: &'a str,
    pub recurring: bool,
}

/// A stored reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRecord {
    pub id: String,
    pub content: String,
    pub due_date: String,
    pub due_time: String,
    pub recurring: bool,
    pub event_id: Option<String>,
    pub event_link: Option<String>,
    pub status: String,
}

type ReminderRow = (
    String,
    String,
    String,
    String,
    bool,
    Option<String>,
    Option<String>,
    String,
);

impl From<ReminderRow> for ReminderRecord {
    fn from(row: ReminderRow) -> Self {
        let (id, content, due_date, due_time, recurring, event_id, event_link, status) = row;
        Self {
            id,
            content,
            due_date,
            due_time,
            recurring,
            event_id,
            event_link,
            status,
        }
    }
}

impl Store {
    /// Save a reminder locally. Returns its id.
    pub async fn save_reminder(&self, reminder: &NewReminder<'_>) -> Result<String, IvaError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO reminders (id, sender_id, content, due_date, due_time, recurring) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(reminder.sender_id)
        .bind(reminder.content)
        .bind(reminder.due_date)
        .bind(reminder.due_time)
        .bind(reminder.recurring)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("save reminder failed: {e}")))?;

        Ok(id)
    }

    /// Record the calendar event created for a reminder.
    pub async fn attach_event(
        &self,
        reminder_id: &str,
        event_id: &str,
        event_link: Option<&str>,
    ) -> Result<(), IvaError> {
        sqlx::query("UPDATE reminders SET event_id = ?, event_link = ? WHERE id = ?")
            .bind(event_id)
            .bind(event_link)
            .bind(reminder_id)
            .execute(&self.pool)
            .await
            .map_err(|e| IvaError::Memory(format!("attach event failed: {e}")))?;
        Ok(())
    }

    /// Pending reminders for a sender, soonest first.
    pub async fn pending_reminders(&self, sender_id: &str) -> Result<Vec<ReminderRecord>, IvaError> {
        let rows: Vec<ReminderRow> = sqlx::query_as(
            "SELECT id, content, due_date, due_time, recurring, event_id, event_link, status \
             FROM reminders WHERE sender_id = ? AND status = 'pending' \
             ORDER BY due_date ASC, created_at ASC",
        )
        .bind(sender_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("list reminders failed: {e}")))?;

        Ok(rows.into_iter().map(ReminderRecord::from).collect())
    }

    /// Mark the reminder mirroring a calendar event as done.
    pub async fn mark_reminder_done(&self, event_id: &str) -> Result<bool, IvaError> {
        let result = sqlx::query(
            "UPDATE reminders SET status = 'done' WHERE event_id = ? AND status = 'pending'",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("mark reminder done failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a pending reminder done, matching a local id or calendar event id prefix.
    /// Returns the reminder as it was before the update.
    pub async fn complete_reminder(
        &self,
        id_prefix: &str,
        sender_id: &str,
    ) -> Result<Option<ReminderRecord>, IvaError> {
        if id_prefix.is_empty() {
            return Ok(None);
        }
        let row: Option<ReminderRow> = sqlx::query_as(
            "SELECT id, content, due_date, due_time, recurring, event_id, event_link, status \
             FROM reminders \
             WHERE sender_id = ?1 AND status = 'pending' \
               AND (substr(id, 1, length(?2)) = ?2 OR substr(event_id, 1, length(?2)) = ?2) \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(sender_id)
        .bind(id_prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("find reminder failed: {e}")))?;

        let Some(record) = row.map(ReminderRecord::from) else {
            return Ok(None);
        };
        sqlx::query("UPDATE reminders SET status = 'done' WHERE id = ?")
            .bind(&record.id)
            .execute(&self.pool)
            .await
            .map_err(|e| IvaError::Memory(format!("mark reminder done failed: {e}")))?;
        Ok(Some(record))
    }
}
