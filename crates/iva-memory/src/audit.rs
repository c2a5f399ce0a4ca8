//! Audit log: records every exchange handled by IVA.

use iva_core::error::IvaError;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub channel: String,
    pub sender_id: String,
    pub input_text: String,
    pub output_text: Option<String>,
    /// Which handler answered: "reminder", "task", "command", or a provider name.
    pub handled_by: Option<String>,
    pub model: Option<String>,
    pub processing_ms: Option<i64>,
    pub status: AuditStatus,
    pub error: Option<String>,
}

/// Status of an audited interaction.
pub enum AuditStatus {
    Ok,
    Error,
}

impl AuditStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Create a new audit logger sharing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), IvaError> {
        sqlx::query(
            "INSERT INTO audit_log \
             (id, channel, sender_id, input_text, output_text, handled_by, model, \
              processing_ms, status, error) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.channel)
        .bind(&entry.sender_id)
        .bind(&entry.input_text)
        .bind(&entry.output_text)
        .bind(&entry.handled_by)
        .bind(&entry.model)
        .bind(entry.processing_ms)
        .bind(entry.status.as_str())
        .bind(&entry.error)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} {} [{}] {}",
            entry.channel,
            entry.sender_id,
            entry.status.as_str(),
            truncate(&entry.input_text, 80)
        );

        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_log_writes_row() {
        let store = Store::in_memory(10).await.unwrap();
        let audit = AuditLogger::new(store.pool().clone());
        audit
            .log(&AuditEntry {
                channel: "console".into(),
                sender_id: "local".into(),
                input_text: "remind me to stretch at 3pm".into(),
                output_text: Some("Reminder saved successfully.".into()),
                handled_by: Some("reminder".into()),
                model: None,
                processing_ms: Some(12),
                status: AuditStatus::Ok,
                error: None,
            })
            .await
            .unwrap();

        let (handled_by, status): (String, String) =
            sqlx::query_as("SELECT handled_by, status FROM audit_log")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(handled_by, "reminder");
        assert_eq!(status, "ok");
    }
}
