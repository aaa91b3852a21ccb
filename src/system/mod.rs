//! Host shutdown script execution

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::{Error, Result};

/// Default timeout for each script line
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of running a shutdown script
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub succeeded: usize,
    /// Failed lines with the reason
    pub failed: Vec<(String, String)>,
}

/// Commands in a script: non-empty lines that are not `#` comments
#[must_use]
pub fn script_commands(script: &str) -> Vec<&str> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Run every command in the script at `path`, one after another
///
/// A failing line is logged and recorded; the remaining lines still run.
///
/// # Errors
///
/// Returns error if the script cannot be read
pub async fn run_shutdown_script(path: &Path, per_command: Duration) -> Result<ScriptReport> {
    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Script(format!("failed to read {}: {e}", path.display())))?;

    let mut report = ScriptReport::default();
    for line in script_commands(&script) {
        match run_command(line, per_command).await {
            Ok(()) => {
                tracing::info!(command = %line, "shutdown command finished");
                report.succeeded += 1;
            }
            Err(e) => {
                tracing::error!(command = %line, error = %e, "shutdown command failed");
                report.failed.push((line.to_string(), e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Run one shell command with a timeout
async fn run_command(line: &str, limit: Duration) -> Result<()> {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line).kill_on_drop(true);

    let output = timeout(limit, command.output())
        .await
        .map_err(|_| Error::Script(format!("timed out after {limit:?}")))?
        .map_err(|e| Error::Script(format!("failed to spawn: {e}")))?;

    if !output.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(command = %line, stderr = %stderr, "command stderr");
    }

    if output.status.success() {
        Ok(())
    } else {
        let code = output.status.code().unwrap_or(-1);
        Err(Error::Script(format!("exited with code {code}")))
    }
}
