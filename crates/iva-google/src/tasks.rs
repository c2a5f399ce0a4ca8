//! Google Tasks v1.

use std::sync::Arc;

use chrono::NaiveDate;
use iva_core::{config::GoogleConfig, error::IvaError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::oauth::TokenSource;

const TASKS_API: &str = "https://tasks.googleapis.com/tasks/v1";

/// An open task as Google reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// RFC 3339; only the date part is meaningful.
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RemoteTask {
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due
            .as_deref()
            .and_then(|d| d.get(..10))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

#[derive(Serialize)]
struct NewTask<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<String>,
}

#[derive(Deserialize)]
struct CreatedTask {
    id: String,
}

#[derive(Deserialize)]
struct TaskList {
    #[serde(default)]
    items: Vec<RemoteTask>,
}

pub struct TasksClient {
    http: reqwest::Client,
    auth: Arc<dyn TokenSource>,
    base_url: String,
    tasklist: String,
}

impl TasksClient {
    pub fn new(config: &GoogleConfig, auth: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            base_url: TASKS_API.to_string(),
            tasklist: config.tasklist.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn tasks_url(&self) -> Result<Url, IvaError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| IvaError::Google(format!("invalid tasks base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| IvaError::Google("tasks base url cannot have a path".into()))?
            .pop_if_empty()
            .push("lists")
            .push(&self.tasklist)
            .push("tasks");
        Ok(url)
    }

    /// Create a task and return its remote id.
    pub async fn insert_task(
        &self,
        title: &str,
        due: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> Result<String, IvaError> {
        let token = self.auth.access_token().await?;
        let body = NewTask {
            title,
            notes,
            due: due.map(|d| format!("{}T00:00:00.000Z", d.format("%Y-%m-%d"))),
        };

        let resp = self
            .http
            .post(self.tasks_url()?)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| IvaError::Google(format!("tasks request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(crate::api_error("tasks insert", resp).await);
        }
        let created: CreatedTask = resp
            .json()
            .await
            .map_err(|e| IvaError::Google(format!("bad tasks response: {e}")))?;
        debug!("task {} created", created.id);
        Ok(created.id)
    }

    /// Open tasks on the configured list.
    pub async fn list_tasks(&self) -> Result<Vec<RemoteTask>, IvaError> {
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(self.tasks_url()?)
            .bearer_auth(token)
            .query(&[("showCompleted", "false")])
            .send()
            .await
            .map_err(|e| IvaError::Google(format!("tasks request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(crate::api_error("tasks list", resp).await);
        }
        let list: TaskList = resp
            .json()
            .await
            .map_err(|e| IvaError::Google(format!("bad tasks response: {e}")))?;
        Ok(list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::StaticToken;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TasksClient {
        TasksClient::new(&GoogleConfig::default(), Arc::new(StaticToken("tok".into())))
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_insert_task_with_due_date() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lists/@default/tasks"))
            .and(body_json(serde_json::json!({
                "title": "buy milk",
                "due": "2030-03-04T00:00:00.000Z"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t-1", "title": "buy milk"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .insert_task("buy milk", NaiveDate::from_ymd_opt(2030, 3, 4), None)
            .await
            .unwrap();
        assert_eq!(id, "t-1");
    }

    #[tokio::test]
    async fn test_insert_task_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"code": 401, "message": "Invalid Credentials"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .insert_task("buy milk", None, Some("2%"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid Credentials"));
    }

    #[tokio::test]
    async fn test_list_tasks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lists/@default/tasks"))
            .and(query_param("showCompleted", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "1", "title": "file taxes", "due": "2030-04-15T00:00:00.000Z"},
                    {"id": "2", "title": "call mom"}
                ]
            })))
            .mount(&server)
            .await;

        let tasks = client(&server).list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].due_date(), NaiveDate::from_ymd_opt(2030, 4, 15));
        assert_eq!(tasks[1].due_date(), None);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        assert!(client(&server).list_tasks().await.unwrap().is_empty());
    }
}
