//! The `implement` tool: the out-of-core editing delegate (spec §1 Non-goals
//! — "editing is delegated to an external `implement` collaborator invoked
//! as a tool"). This crate does not contain an editor; it forwards the task
//! to whatever external command the deployment configures and reports
//! plainly when none is configured, rather than silently no-op'ing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use probe_core::parser::ToolParams;
use probe_core::registry::{ToolDescriptor, ToolExecutor, ToolFlags, ToolOutput, ToolSourceKind};
use probe_core::ToolError;

use crate::exec;

const DELEGATE_TIMEOUT: Duration = Duration::from_secs(600);

struct ImplementExecutor {
    delegate_command: Option<String>,
    working_dir: PathBuf,
}

#[async_trait]
impl ToolExecutor for ImplementExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let task = params
            .get("task")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'task'".to_string()))?;
        let auto_commits = params.get_bool("autoCommits", false);

        let Some(delegate) = &self.delegate_command else {
            return Err(ToolError::Custom(
                "no edit delegate configured for this session (set PROBE_IMPLEMENT_CMD to enable \
                 the `implement` tool)"
                    .to_string(),
            ));
        };

        let mut command = Command::new(delegate);
        command.current_dir(&self.working_dir).arg(&task);
        if auto_commits {
            command.arg("--auto-commit");
        }

        let output = exec::run(command, DELEGATE_TIMEOUT).await?;
        Ok(ToolOutput::text(exec::require_success(output)?))
    }
}

/// Descriptor for the `implement` delegate. `delegate_command` is read from
/// `PROBE_IMPLEMENT_CMD`; absent a configured delegate the tool still
/// registers (so the model can discover and call it) but every invocation
/// fails with a clear configuration error rather than editing anything.
pub fn tool_descriptor(working_dir: PathBuf) -> ToolDescriptor {
    let delegate_command = std::env::var("PROBE_IMPLEMENT_CMD").ok();
    ToolDescriptor {
        name: "implement".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Delegate a code-editing task to the external implement collaborator. \
                           This tool does not edit files itself — it hands the task off to a \
                           separate editing agent and returns its report.\n\n\
                           Parameters:\n\
                           - task: (required) description of the change to make\n\
                           - autoCommits: (optional) whether the delegate should commit its own \
                           changes, default false\n\n\
                           Usage:\n<implement>\n<task>Add a doc comment to parse_command</task>\n\
                           </implement>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(ImplementExecutor { delegate_command, working_dir }),
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
    async fn errors_clearly_when_no_delegate_is_configured() {
        let tmp = TempDir::new().unwrap();
        let executor = ImplementExecutor { delegate_command: None, working_dir: tmp.path().to_path_buf() };
        let err = executor.execute(&params(&[("task", "fix the bug")])).await.unwrap_err();
        assert!(matches!(err, ToolError::Custom(msg) if msg.contains("no edit delegate")));
    }

    #[tokio::test]
    async fn missing_task_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let executor = ImplementExecutor {
            delegate_command: Some("true".to_string()),
            working_dir: tmp.path().to_path_buf(),
        };
        let err = executor.execute(&params(&[])).await.unwrap_err();
        assert!(matches!(err, ToolError::Custom(_)));
    }
}
