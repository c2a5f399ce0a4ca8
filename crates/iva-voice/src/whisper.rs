//! OpenAI Whisper transcription.

use async_trait::async_trait;
use iva_core::error::IvaError;
use serde::Deserialize;

const OPENAI_API: &str = "https://api.openai.com/v1";

/// Turns recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, wav: &[u8]) -> Result<String, IvaError>;
}

/// Whisper API response.
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

pub struct WhisperClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WhisperClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_API.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, wav: &[u8]) -> Result<String, IvaError> {
        let part = reqwest::multipart::Part::bytes(wav.to_vec())
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(|e| IvaError::Voice(format!("whisper mime error: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .part("file", part);

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IvaError::Voice(format!("whisper request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(IvaError::Voice(format!("whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = resp
            .json()
            .await
            .map_err(|e| IvaError::Voice(format!("whisper response parse failed: {e}")))?;

        Ok(result.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transcribe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_string_contains("whisper-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "  remind me at 5pm  "})),
            )
            .mount(&server)
            .await;

        let text = WhisperClient::new("sk-test")
            .with_base_url(server.uri())
            .transcribe(b"RIFF....WAVE")
            .await
            .unwrap();
        assert_eq!(text, "remind me at 5pm");
    }

    #[tokio::test]
    async fn test_transcribe_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = WhisperClient::new("sk-test")
            .with_base_url(server.uri())
            .transcribe(b"x")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }
}
