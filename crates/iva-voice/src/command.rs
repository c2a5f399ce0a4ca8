//! External audio commands (players, recorders, local speech engines).
//!
//! Templates are split on whitespace first and placeholders substituted per
//! argument, so a `{text}` full of spaces stays a single argv entry.

use iva_core::error::IvaError;
use tokio::process::Command;
use tracing::debug;

/// Expand a command template into argv.
pub fn expand(template: &str, vars: &[(&str, &str)]) -> Vec<String> {
    template
        .split_whitespace()
        .map(|arg| {
            vars.iter().fold(arg.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
        })
        .collect()
}

/// Run a command template to completion.
pub async fn run(template: &str, vars: &[(&str, &str)]) -> Result<(), IvaError> {
    let argv = expand(template, vars);
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| IvaError::Voice("empty command template".into()))?;

    debug!("running {program}");
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| IvaError::Voice(format!("failed to start {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IvaError::Voice(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
