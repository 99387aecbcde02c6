//! The `bash` tool: runs a shell command via `sh -c`. Permission checking
//! (§4.4) happens one layer up, in the agent loop's dispatcher, before this
//! executor is ever reached — by the time `execute` runs, the command has
//! already cleared the allow/deny policy. This executor only owns running
//! the subprocess and enforcing the timeout ceiling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use probe_core::parser::ToolParams;
use probe_core::registry::{ToolDescriptor, ToolExecutor, ToolFlags, ToolOutput, ToolSourceKind};
use probe_core::ToolError;

use crate::exec;

/// Per-call default when no `timeout` parameter is given.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Hard ceiling a caller-supplied `timeout` cannot exceed.
const MAX_TIMEOUT_SECS: u64 = 300;

struct BashExecutor {
    working_dir: std::path::PathBuf,
}

#[async_trait]
impl ToolExecutor for BashExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let command_str = params
            .get("command")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'command'".to_string()))?;

        let timeout_secs = params
            .get_usize("timeout")
            .map(|n| (n as u64).min(MAX_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut command = Command::new(shell());
        command.arg(shell_flag()).arg(&command_str).current_dir(&self.working_dir);

        let output = exec::run(command, Duration::from_secs(timeout_secs)).await?;
        Ok(ToolOutput::text(exec::require_success(output)?))
    }
}

#[cfg(unix)]
fn shell() -> &'static str {
    "sh"
}
#[cfg(unix)]
fn shell_flag() -> &'static str {
    "-c"
}

#[cfg(windows)]
fn shell() -> &'static str {
    "cmd"
}
#[cfg(windows)]
fn shell_flag() -> &'static str {
    "/C"
}

pub fn tool_descriptor(working_dir: std::path::PathBuf) -> ToolDescriptor {
    ToolDescriptor {
        name: "bash".to_string(),
        source: ToolSourceKind::Native,
        xml_description: format!(
            "Execute a shell command. Subject to the session's shell permission policy: \
             read-only inspection commands are generally allowed, mutating commands are \
             generally denied.\n\n\
             Parameters:\n\
             - command: (required) the shell command to run\n\
             - timeout: (optional) seconds to wait before the command is killed, default \
             {DEFAULT_TIMEOUT_SECS}, hard ceiling {MAX_TIMEOUT_SECS}\n\n\
             Usage:\n<bash>\n<command>git status</command>\n</bash>"
        ),
        params_schema: None,
        executor: Arc::new(BashExecutor { working_dir }),
        flags: ToolFlags { suspends: true, mutates_repo: true, produces_images: false },
        primary_param: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::parser::ToolParams;
    use tempfile::TempDir;

    fn params(pairs: &[(&str, &str)]) -> ToolParams {
        ToolParams::Native(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[tokio::test]
    async fn runs_a_simple_command() {
        let tmp = TempDir::new().unwrap();
        let executor = BashExecutor { working_dir: tmp.path().to_path_buf() };
        let output = executor.execute(&params(&[("command", "echo hello")])).await.unwrap();
        assert_eq!(output.result.as_text().trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let executor = BashExecutor { working_dir: tmp.path().to_path_buf() };
        let err = executor.execute(&params(&[("command", "exit 7")])).await.unwrap_err();
        assert!(matches!(err, ToolError::Custom(_)));
    }

    #[tokio::test]
    async fn timeout_is_enforced() {
        let tmp = TempDir::new().unwrap();
        let executor = BashExecutor { working_dir: tmp.path().to_path_buf() };
        let err = executor
            .execute(&params(&[("command", "sleep 5"), ("timeout", "1")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Custom(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let executor = BashExecutor { working_dir: tmp.path().to_path_buf() };
        let err = executor.execute(&params(&[])).await.unwrap_err();
        assert!(matches!(err, ToolError::Custom(_)));
    }
}
