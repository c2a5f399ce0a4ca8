use crate::{
    context::Context,
    error::IvaError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// Chat-completion provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Send a conversation context to the provider and get a response.
    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, IvaError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Front-end channel: where the user types (or speaks) and reads replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, IvaError>;

    /// Send a response back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), IvaError>;

    /// Show a typing indicator while a request is in flight.
    async fn send_typing(&self) -> Result<(), IvaError> {
        Ok(())
    }

    /// Clear the typing indicator.
    async fn stop_typing(&self) -> Result<(), IvaError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), IvaError>;
}
