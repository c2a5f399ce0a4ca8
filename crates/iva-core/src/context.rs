use serde::{Deserialize, Serialize};

/// A single entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl ContextEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Display label used in transcripts ("User" / "Assistant").
    pub fn speaker(&self) -> &'static str {
        if self.role == "user" {
            "User"
        } else {
            "Assistant"
        }
    }
}

/// Conversation context passed to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Conversation history (oldest first), excluding the current message.
    pub history: Vec<ContextEntry>,
    /// The current user message.
    pub current_message: String,
    /// Override the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A structured message for API-based providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Context {
    /// Create a new context with just a current message and the default persona.
    pub fn new(message: &str) -> Self {
        Self {
            system_prompt: default_system_prompt(),
            history: Vec::new(),
            current_message: message.to_string(),
            model: None,
        }
    }

    /// Build a context from prior turns, keeping at most `window` entries in
    /// total once the current message is counted.
    pub fn with_window(
        system_prompt: &str,
        history: &[ContextEntry],
        message: &str,
        window: usize,
    ) -> Self {
        let keep = window.saturating_sub(1);
        let start = history.len().saturating_sub(keep);
        Self {
            system_prompt: system_prompt.to_string(),
            history: history[start..].to_vec(),
            current_message: message.to_string(),
            model: None,
        }
    }

    /// Convert context to structured API messages.
    ///
    /// Returns `(system_prompt, messages)`; the current message is always last.
    pub fn to_api_messages(&self) -> (String, Vec<ApiMessage>) {
        let mut messages = Vec::with_capacity(self.history.len() + 1);

        for entry in &self.history {
            messages.push(ApiMessage {
                role: entry.role.clone(),
                content: entry.content.clone(),
            });
        }

        messages.push(ApiMessage {
            role: "user".to_string(),
            content: self.current_message.clone(),
        });

        (self.system_prompt.clone(), messages)
    }
}

/// Default persona prompt for IVA.
pub fn default_system_prompt() -> String {
    "You are an empathetic, friendly, supportive assistant named IVA, for users with ADHD. \
     Your role is to assist with tasks and offer engaging, varied conversation. \
     It's crucial to maintain context, recall previous user inputs accurately, and provide \
     coherent, contextually appropriate responses. \
     Avoid repetitiveness and unnecessary greetings. \
     You will use a minimum of 0 emoji and a maximum of 2 emojis per message."
        .to_string()
}
