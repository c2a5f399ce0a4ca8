//! Local speech engine (`say`, `espeak`, ...).

use async_trait::async_trait;
use iva_core::error::IvaError;

use crate::{command, Speaker};

pub struct LocalSpeaker {
    command: String,
}

impl LocalSpeaker {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

#[async_trait]
impl Speaker for LocalSpeaker {
    fn name(&self) -> &str {
        "local"
    }

    async fn speak(&self, text: &str) -> Result<(), IvaError> {
        command::run(&self.command, &[("text", text)]).await
    }
}
