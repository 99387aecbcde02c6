//! Shared subprocess execution helper used by the `bash`, code-search, and
//! `implement` tools: run a command with a timeout, and fold a non-zero
//! exit code into a `ToolError` so every caller's failure text reads the
//! same way once the dispatcher prefixes it with `Error:`.

use std::process::Stdio;
use std::time::Duration;

use probe_core::ToolError;
use tokio::process::Command;

/// Output of a subprocess that ran to completion (whether or not it
/// exited cleanly).
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run `command`, waiting at most `timeout`. A non-zero exit code is not
/// itself an error here — callers decide whether to surface stderr as
/// failure text; only spawn failures and timeouts are `Err`.
pub async fn run(mut command: Command, timeout: Duration) -> Result<CommandOutput, ToolError> {
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let child = command
        .spawn()
        .map_err(|e| ToolError::Custom(format!("failed to start process: {e}")))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ToolError::Custom(format!("process wait failed: {e}")))?,
        Err(_) => {
            return Err(ToolError::Custom(format!(
                "command timed out after {}s",
                timeout.as_secs()
            )))
        }
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Fold a [`CommandOutput`] into `Ok(stdout)` on success or `Err` carrying
/// both streams and the exit code on failure.
pub fn require_success(output: CommandOutput) -> Result<String, ToolError> {
    if output.exit_code == 0 {
        Ok(output.stdout)
    } else {
        let mut msg = format!("process exited with status {}", output.exit_code);
        if !output.stderr.trim().is_empty() {
            msg.push_str(&format!(": {}", output.stderr.trim()));
        } else if !output.stdout.trim().is_empty() {
            msg.push_str(&format!(": {}", output.stdout.trim()));
        }
        Err(ToolError::Custom(msg))
    }
}
