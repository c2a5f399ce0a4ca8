//! Plain-text journal files named `<kind>_<YYYY-MM-DD_HH-MM-SS>.txt`.

use chrono::{DateTime, Local};
use iva_core::error::IvaError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Journal kind for confirmed reminders.
pub const REMINDER: &str = "reminder";
/// Journal kind for saved tasks.
pub const TASK: &str = "task";
/// Journal kind for the transcript written on exit.
pub const CONVERSATION: &str = "iva_conversation";

/// Build the file name for a journal entry.
pub fn generate_file_name(kind: &str, now: DateTime<Local>) -> String {
    format!("{kind}_{}.txt", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write `text` to a new journal file in `dir`, creating the directory if needed.
pub fn save_to_file(dir: &Path, kind: &str, text: &str) -> Result<PathBuf, IvaError> {
    save_to_file_at(dir, kind, text, Local::now())
}

/// Same as [`save_to_file`] with an explicit timestamp.
pub fn save_to_file_at(
    dir: &Path,
    kind: &str,
    text: &str,
    now: DateTime<Local>,
) -> Result<PathBuf, IvaError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(generate_file_name(kind, now));
    std::fs::write(&path, text)?;
    debug!("journal: wrote {}", path.display());
    Ok(path)
}
