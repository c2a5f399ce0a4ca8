use std::path::Path;
use tracing::warn;

use super::shellexpand;
use crate::context::default_system_prompt;

/// Externalized prompts, loaded from `<data_dir>/prompts/` at startup.
///
/// Missing files fall back to the compiled defaults.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// Persona instructions sent as the system message.
    pub system: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: default_system_prompt(),
        }
    }
}

impl Prompts {
    /// Load `SYSTEM_PROMPT.md` from the data directory if present.
    pub fn load(data_dir: &str) -> Self {
        let mut prompts = Self::default();
        let path = Path::new(&shellexpand(data_dir)).join("prompts/SYSTEM_PROMPT.md");
        if !path.exists() {
            return prompts;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                prompts.system = content.trim().to_string();
            }
            Ok(_) => warn!("{} is empty, using default persona", path.display()),
            Err(e) => warn!("failed to read {}: {e}", path.display()),
        }
        prompts
    }
}
