//! OpenAI-compatible chat-completion provider.
//!
//! Works with OpenAI's API and any endpoint speaking the same protocol.

use async_trait::async_trait;
use iva_core::{
    config::OpenAiConfig,
    context::{ApiMessage, Context},
    error::IvaError,
    message::{MessageMetadata, OutgoingMessage},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// The API key, shared with the Whisper transcriber when it has none.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }
}

/// Build OpenAI-format messages from context (system as a message role).
pub(crate) fn build_openai_messages(system: &str, api_messages: &[ApiMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(api_messages.len() + 1);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    for m in api_messages {
        messages.push(ChatMessage {
            role: m.role.to_lowercase(),
            content: m.content.clone(),
        });
    }
    messages
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
    pub model: Option<String>,
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u64>,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, IvaError> {
        let (system, api_messages) = context.to_api_messages();
        let effective_model = context.model.as_deref().unwrap_or(&self.config.model);
        let start = Instant::now();

        let body = ChatCompletionRequest {
            model: effective_model.to_string(),
            messages: build_openai_messages(&system, &api_messages),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(
            "openai: POST {url} model={effective_model} messages={}",
            body.messages.len()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IvaError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IvaError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| IvaError::Provider(format!("openai: failed to parse response: {e}")))?;

        let text = parsed
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.trim().to_string())
            .ok_or_else(|| IvaError::Provider("openai: response had no choices".to_string()))?;

        let tokens = parsed.usage.as_ref().and_then(|u| u.total_tokens);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        Ok(OutgoingMessage {
            text,
            metadata: MessageMetadata {
                provider_used: "openai".to_string(),
                tokens_used: tokens,
                processing_time_ms: elapsed_ms,
                model: parsed.model,
            },
        })
    }

    async fn is_available(&self) -> bool {
        if self.config.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iva_core::context::ContextEntry;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, api_key: &str) -> OpenAiProvider {
        OpenAiProvider::from_config(OpenAiConfig {
            api_key: api_key.into(),
            base_url: format!("{}/v1", server.uri()),
            ..OpenAiConfig::default()
        })
    }

    #[test]
    fn test_openai_provider_name() {
        let p = OpenAiProvider::from_config(OpenAiConfig::default());
        assert_eq!(p.name(), "openai");
        assert!(p.requires_api_key());
    }

    #[test]
    fn test_build_openai_messages_system_first() {
        let api_msgs = vec![
            ApiMessage {
                role: "User".into(),
                content: "Hi".into(),
            },
            ApiMessage {
                role: "assistant".into(),
                content: "Hello!".into(),
            },
        ];
        let messages = build_openai_messages("Be kind.", &api_msgs);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].content, "Hello!");
    }

    #[test]
    fn test_build_openai_messages_empty_system() {
        let api_msgs = vec![ApiMessage {
            role: "user".into(),
            content: "Hi".into(),
        }];
        let messages = build_openai_messages("", &api_msgs);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[tokio::test]
    async fn test_complete_sends_sampling_parameters_and_trims_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 300,
                "temperature": 0.5,
                "presence_penalty": 0.6
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Sure thing! \n"}}],
                "model": "gpt-3.5-turbo-0125",
                "usage": {"total_tokens": 42}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "sk-test");
        let history = vec![ContextEntry::user("hi"), ContextEntry::assistant("hello")];
        let ctx = Context::with_window("persona", &history, "help me", 10);
        let reply = provider.complete(&ctx).await.unwrap();

        assert_eq!(reply.text, "Sure thing!");
        assert_eq!(reply.metadata.tokens_used, Some(42));
        assert_eq!(reply.metadata.model.as_deref(), Some("gpt-3.5-turbo-0125"));
    }

    #[tokio::test]
    async fn test_complete_maps_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "sk-test");
        let err = provider.complete(&Context::new("hi")).await.unwrap_err();
        match err {
            IvaError::Provider(msg) => assert!(msg.contains("429")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "sk-test");
        assert!(provider.complete(&Context::new("hi")).await.is_err());
    }

    #[tokio::test]
    async fn test_is_available_requires_key() {
        let server = MockServer::start().await;
        let provider = provider_for(&server, "");
        assert!(!provider.is_available().await);
    }

    #[tokio::test]
    async fn test_is_available_lists_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "sk-test");
        assert!(provider.is_available().await);
    }
}
