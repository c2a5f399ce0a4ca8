use thiserror::Error;

/// Top-level error type for IVA.
#[derive(Debug, Error)]
pub enum IvaError {
    /// Error from the chat-completion provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from the front-end channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Memory/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Google Calendar / Tasks / OAuth error.
    #[error("google error: {0}")]
    Google(String),

    /// Speech synthesis or recognition error.
    #[error("voice error: {0}")]
    Voice(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
