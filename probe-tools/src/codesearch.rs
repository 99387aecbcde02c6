//! `search`, `query`, and `extract` — the `CodeSearch` capability (spec §6)
//! implemented by shelling out to an external code-search binary. The core
//! only needs the `{stdout, stderr, exitCode}` interface; this module is
//! the concrete collaborator that satisfies it for the CLI binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use probe_core::parser::ToolParams;
use probe_core::registry::{ToolDescriptor, ToolExecutor, ToolFlags, ToolOutput, ToolSourceKind};
use probe_core::ToolError;

use crate::exec;

const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the external binary invoked for `search`/`query`/`extract`.
/// Overridable so tests and alternate deployments can point at a stub.
#[derive(Clone)]
pub struct CodeSearchBinary {
    pub path: PathBuf,
}

impl Default for CodeSearchBinary {
    fn default() -> Self {
        Self {
            path: std::env::var("PROBE_CODESEARCH_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("probe")),
        }
    }
}

/// Descriptors for `search`, `query`, and `extract`, all invoking `binary`.
pub fn tool_descriptors(binary: CodeSearchBinary, working_dir: PathBuf) -> Vec<ToolDescriptor> {
    vec![
        search_descriptor(binary.clone(), working_dir.clone()),
        query_descriptor(binary.clone(), working_dir.clone()),
        extract_descriptor(binary, working_dir),
    ]
}

// ============================================================================
// search
// ============================================================================

struct SearchExecutor {
    binary: CodeSearchBinary,
    working_dir: PathBuf,
}

#[async_trait]
impl ToolExecutor for SearchExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let query = params
            .get("query")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'query'".to_string()))?;

        let mut command = Command::new(&self.binary.path);
        command.current_dir(&self.working_dir).arg("search").arg(&query);
        if let Some(path) = params.get("path") {
            command.arg(&path);
        }
        if params.get_bool("exact", false) {
            command.arg("--exact");
        }
        if params.get_bool("allow_tests", false) {
            command.arg("--allow-tests");
        }

        let output = exec::run(command, SUBPROCESS_TIMEOUT).await?;
        Ok(ToolOutput::text(exec::require_success(output)?))
    }
}

fn search_descriptor(binary: CodeSearchBinary, working_dir: PathBuf) -> ToolDescriptor {
    ToolDescriptor {
        name: "search".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Search the repository for code matching a query (token/BM25-ranked, \
                           not plain-text grep).\n\n\
                           Parameters:\n\
                           - query: (required) the search query\n\
                           - path: (optional) directory to restrict the search to\n\
                           - exact: (optional) require exact token matches, default false\n\
                           - allow_tests: (optional) include test files, default false\n\n\
                           Usage:\n<search>\n<query>parseCommand</query>\n</search>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(SearchExecutor { binary, working_dir }),
        flags: ToolFlags { suspends: true, mutates_repo: false, produces_images: false },
        primary_param: None,
    }
}

// ============================================================================
// query
// ============================================================================

struct QueryExecutor {
    binary: CodeSearchBinary,
    working_dir: PathBuf,
}

#[async_trait]
impl ToolExecutor for QueryExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let pattern = params
            .get("pattern")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'pattern'".to_string()))?;

        let mut command = Command::new(&self.binary.path);
        command.current_dir(&self.working_dir).arg("query").arg(&pattern);
        if let Some(path) = params.get("path") {
            command.arg(&path);
        }
        if let Some(language) = params.get("language") {
            command.arg("--language").arg(&language);
        }
        if params.get_bool("allow_tests", false) {
            command.arg("--allow-tests");
        }

        let output = exec::run(command, SUBPROCESS_TIMEOUT).await?;
        Ok(ToolOutput::text(exec::require_success(output)?))
    }
}

fn query_descriptor(binary: CodeSearchBinary, working_dir: PathBuf) -> ToolDescriptor {
    ToolDescriptor {
        name: "query".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Run an AST-grep style structural query against the repository.\n\n\
                           Parameters:\n\
                           - pattern: (required) the AST pattern to match\n\
                           - path: (optional) directory to restrict the query to\n\
                           - language: (optional) force a specific language parser\n\
                           - allow_tests: (optional) include test files, default false\n\n\
                           Usage:\n<query>\n<pattern>fn $NAME($$$ARGS) { $$$ }</pattern>\n</query>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(QueryExecutor { binary, working_dir }),
        flags: ToolFlags { suspends: true, mutates_repo: false, produces_images: false },
        primary_param: None,
    }
}

// ============================================================================
// extract
// ============================================================================

struct ExtractExecutor {
    binary: CodeSearchBinary,
    working_dir: PathBuf,
}

#[async_trait]
impl ToolExecutor for ExtractExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let file_path = params
            .get("file_path")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'file_path'".to_string()))?;

        let mut command = Command::new(&self.binary.path);
        command.current_dir(&self.working_dir).arg("extract").arg(&file_path);
        if let Some(line) = params.get_usize("line") {
            command.arg("--line").arg(line.to_string());
        }
        if let Some(end_line) = params.get_usize("end_line") {
            command.arg("--end-line").arg(end_line.to_string());
        }
        if let Some(context) = params.get_usize("context_lines") {
            command.arg("--context").arg(context.to_string());
        }
        if let Some(format) = params.get("format") {
            command.arg("--format").arg(&format);
        }

        let output = exec::run(command, SUBPROCESS_TIMEOUT).await?;
        Ok(ToolOutput::text(exec::require_success(output)?))
    }
}

fn extract_descriptor(binary: CodeSearchBinary, working_dir: PathBuf) -> ToolDescriptor {
    ToolDescriptor {
        name: "extract".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Extract the contents of a file or a specific line range from it, \
                           with optional surrounding context.\n\n\
                           Parameters:\n\
                           - file_path: (required) path to the file\n\
                           - line: (optional) starting line number\n\
                           - end_line: (optional) ending line number\n\
                           - context_lines: (optional) lines of context around the range\n\
                           - format: (optional) output format (e.g. `plain`, `markdown`)\n\n\
                           Usage:\n<extract>\n<file_path>src/main.rs</file_path>\n\
                           <line>42</line>\n</extract>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(ExtractExecutor { binary, working_dir }),
        flags: ToolFlags { suspends: true, mutates_repo: false, produces_images: false },
        primary_param: None,
    }
}
