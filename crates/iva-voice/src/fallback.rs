//! Try one engine, fall back to another.

use std::sync::Arc;

use async_trait::async_trait;
use iva_core::error::IvaError;
use tracing::warn;

use crate::Speaker;

pub struct FallbackSpeaker {
    primary: Arc<dyn Speaker>,
    fallback: Arc<dyn Speaker>,
    name: String,
}

impl FallbackSpeaker {
    pub fn new(primary: Arc<dyn Speaker>, fallback: Arc<dyn Speaker>) -> Self {
        let name = format!("{}+{}", primary.name(), fallback.name());
        Self {
            primary,
            fallback,
            name,
        }
    }
}

#[async_trait]
impl Speaker for FallbackSpeaker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn speak(&self, text: &str) -> Result<(), IvaError> {
        match self.primary.speak(text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("{} failed, falling back to {}: {e}", self.primary.name(), self.fallback.name());
                self.fallback.speak(text).await
            }
        }
    }
}
