//! Conversation turns: append, context window, transcript, forget.

use super::Store;
use iva_core::{context::ContextEntry, error::IvaError, message::MessageMetadata};
use uuid::Uuid;

impl Store {
    /// Get the active conversation for a channel + sender, creating one if needed.
    pub(crate) async fn get_or_create_conversation(
        &self,
        channel: &str,
        sender_id: &str,
    ) -> Result<String, IvaError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM conversations \
             WHERE channel = ? AND sender_id = ? AND status = 'active' \
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(channel)
        .bind(sender_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("query failed: {e}")))?;

        if let Some((id,)) = row {
            sqlx::query("UPDATE conversations SET updated_at = datetime('now') WHERE id = ?")
                .bind(&id)
                .execute(&self.pool)
                .await
                .map_err(|e| IvaError::Memory(format!("update failed: {e}")))?;
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO conversations (id, channel, sender_id, status) VALUES (?, ?, ?, 'active')",
        )
        .bind(&id)
        .bind(channel)
        .bind(sender_id)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("insert failed: {e}")))?;

        Ok(id)
    }

    /// Append one turn to the sender's active conversation.
    pub async fn append_turn(
        &self,
        channel: &str,
        sender_id: &str,
        entry: &ContextEntry,
        metadata: Option<&MessageMetadata>,
    ) -> Result<(), IvaError> {
        let conv_id = self.get_or_create_conversation(channel, sender_id).await?;
        let metadata_json = metadata.map(serde_json::to_string).transpose()?;

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, metadata_json) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&conv_id)
        .bind(&entry.role)
        .bind(&entry.content)
        .bind(metadata_json)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("insert failed: {e}")))?;

        Ok(())
    }

    /// The last `limit` turns of the active conversation, oldest first.
    pub async fn recent_turns(
        &self,
        channel: &str,
        sender_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextEntry>, IvaError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, content FROM ( \
                 SELECT m.role, m.content, m.timestamp, m.rowid AS seq \
                 FROM messages m \
                 JOIN conversations c ON c.id = m.conversation_id \
                 WHERE c.channel = ? AND c.sender_id = ? AND c.status = 'active' \
                 ORDER BY m.timestamp DESC, m.rowid DESC \
                 LIMIT ? \
             ) ORDER BY timestamp ASC, seq ASC",
        )
        .bind(channel)
        .bind(sender_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(role, content)| ContextEntry { role, content })
            .collect())
    }

    /// Every turn of the active conversation, oldest first.
    pub async fn conversation_turns(
        &self,
        channel: &str,
        sender_id: &str,
    ) -> Result<Vec<ContextEntry>, IvaError> {
        self.recent_turns(channel, sender_id, i64::MAX as usize).await
    }

    /// Close the active conversation. Returns whether one existed.
    pub async fn close_conversation(&self, channel: &str, sender_id: &str) -> Result<bool, IvaError> {
        let result = sqlx::query(
            "UPDATE conversations SET status = 'closed', updated_at = datetime('now') \
             WHERE channel = ? AND sender_id = ? AND status = 'active'",
        )
        .bind(channel)
        .bind(sender_id)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("update failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Render turns as a plain-text transcript (`Role: content` per line).
pub fn format_transcript(turns: &[ContextEntry]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.speaker(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}
