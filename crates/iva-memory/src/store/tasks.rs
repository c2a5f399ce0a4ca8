//! Local mirror of to-do tasks forwarded to Google Tasks.

use super::Store;
use iva_core::error::IvaError;
use uuid::Uuid;

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub remote_id: Option<String>,
}

impl Store {
    /// Save a task locally. Returns its id.
    pub async fn save_task(
        &self,
        sender_id: &str,
        title: &str,
        due_date: Option<&str>,
        notes: Option<&str>,
    ) -> Result<String, IvaError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO tasks (id, sender_id, title, due_date, notes) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(sender_id)
        .bind(title)
        .bind(due_date)
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("save task failed: {e}")))?;
        Ok(id)
    }

    /// Record the Google Tasks id created for a task.
    pub async fn attach_remote_task(&self, task_id: &str, remote_id: &str) -> Result<(), IvaError> {
        sqlx::query("UPDATE tasks SET remote_id = ? WHERE id = ?")
            .bind(remote_id)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| IvaError::Memory(format!("attach remote task failed: {e}")))?;
        Ok(())
    }

    /// Open tasks for a sender, oldest first.
    pub async fn open_tasks(&self, sender_id: &str) -> Result<Vec<TaskRecord>, IvaError> {
        let rows: Vec<(String, String, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT id, title, due_date, notes, remote_id FROM tasks \
                 WHERE sender_id = ? AND status = 'open' ORDER BY created_at ASC, rowid ASC",
            )
            .bind(sender_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IvaError::Memory(format!("list tasks failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, title, due_date, notes, remote_id)| TaskRecord {
                id,
                title,
                due_date,
                notes,
                remote_id,
            })
            .collect())
    }

    /// Complete a task by id prefix. Returns whether one matched.
    pub async fn complete_task(&self, id_prefix: &str, sender_id: &str) -> Result<bool, IvaError> {
        if id_prefix.is_empty() {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE tasks SET status = 'done' \
             WHERE substr(id, 1, length(?1)) = ?1 AND sender_id = ?2 AND status = 'open'",
        )
        .bind(id_prefix)
        .bind(sender_id)
        .execute(&self.pool)
        .await
        .map_err(|e| IvaError::Memory(format!("complete task failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}
