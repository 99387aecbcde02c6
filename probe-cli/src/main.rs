//! `probe` command-line entry point: wires a model provider, the built-in
//! tool set, and (optionally) MCP servers and session persistence into an
//! [`Agent`] and runs one question to completion.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use probe_core::registry::AllowedToolSet;
use probe_core::{Agent, AnthropicProvider};
use probe_cli::SqliteStore;

const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_MODEL_NAME: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_CONTEXT_TOKENS: usize = 200_000;
const DEFAULT_MAX_OUTPUT_TOKENS: usize = 64_000;

#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(about = "Ask a code-search agent a question about a repository")]
struct Args {
    /// The question to ask the agent
    question: String,

    /// Directory the agent operates in (default: current directory)
    #[arg(long, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Extra instructions appended to the agent's system prompt
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Model provider (only "anthropic" is built in)
    #[arg(long, default_value = "anthropic")]
    provider: String,

    /// Model id to request from the provider
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Allow the `implement` tool to make edits
    #[arg(long)]
    allow_edit: bool,

    /// Comma-separated tool name/glob patterns to allow (e.g. "search,query,!bash")
    #[arg(long, value_name = "LIST")]
    allowed_tools: Option<String>,

    /// Disable all tools; the agent can only answer from the conversation itself
    #[arg(long)]
    disable_tools: bool,

    /// Maximum agent loop iterations before giving up
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// Verbose logging (equivalent to RUST_LOG=debug)
    #[arg(long)]
    verbose: bool,

    /// MCP server config file to load (repeatable); falls back to
    /// `MCP_CONFIG_PATH` and a fixed search path when omitted
    #[arg(long, value_name = "PATH")]
    mcp: Vec<PathBuf>,
}

/// Read an environment variable as a `usize`, tolerating absence or a
/// malformed value by falling back to `default` rather than erroring.
fn env_usize(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(var: &str) -> bool {
    matches!(std::env::var(var).as_deref(), Ok("1") | Ok("true") | Ok("yes"))
}

/// Resolve MCP config files: explicit `--mcp` flags first, then
/// `MCP_CONFIG_PATH`, then the platform config directory.
fn resolve_mcp_config_files(explicit: Vec<PathBuf>) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit;
    }

    if let Ok(path) = std::env::var("MCP_CONFIG_PATH") {
        return vec![PathBuf::from(path)];
    }

    let mut candidates = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("probe").join("mcp.json"));
    }
    candidates.push(PathBuf::from(".probe/mcp.json"));
    candidates.into_iter().filter(|p| p.exists()).collect()
}

fn allowed_tool_set(args: &Args) -> AllowedToolSet {
    if args.disable_tools {
        return AllowedToolSet::None;
    }

    let mut patterns: Vec<String> = match &args.allowed_tools {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => return if args.allow_edit {
            AllowedToolSet::All
        } else {
            AllowedToolSet::whitelist(vec!["*".to_string(), "!implement".to_string()])
        },
    };

    if !args.allow_edit {
        patterns.push("!implement".to_string());
    }
    AllowedToolSet::whitelist(patterns)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let log_level = if args.verbose || env_flag("DEBUG") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.provider != "anthropic" {
        anyhow::bail!("unknown provider '{}': only 'anthropic' is built in", args.provider);
    }

    let provider = AnthropicProvider::from_env(
        args.model.clone().unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
        DEFAULT_MODEL_NAME,
        DEFAULT_MAX_CONTEXT_TOKENS,
        DEFAULT_MAX_OUTPUT_TOKENS,
    )?;

    let working_dir = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
    let tools = probe_tools::builtin_tools(working_dir.clone(), &[]);

    let max_iterations = args
        .max_iterations
        .unwrap_or_else(|| env_usize("MAX_TOOL_ITERATIONS", probe_core::DEFAULT_MAX_ITERATIONS));
    let max_tool_output_tokens = env_usize(
        "PROBE_MAX_OUTPUT_TOKENS",
        probe_core::DEFAULT_MAX_TOOL_OUTPUT_TOKENS,
    );

    let mut builder = Agent::builder()
        .provider(provider)
        .working_dir(working_dir.clone())
        .add_tools(tools)
        .with_allowed_tools(allowed_tool_set(&args))
        .with_max_iterations(max_iterations)
        .with_max_tool_output_tokens(max_tool_output_tokens);

    if let Some(prompt) = &args.prompt {
        builder = builder.with_system_prompt(prompt.clone());
    }

    for config_file in resolve_mcp_config_files(args.mcp.clone()) {
        builder = builder.with_mcp_config_file(config_file);
    }

    if !env_flag("PROBE_NON_INTERACTIVE") {
        if let Ok(store) = SqliteStore::default_location() {
            builder = builder.with_session_store(Arc::new(store));
        }
    }

    let agent = builder.build().await?;
    let response = agent.run(args.question).await?;
    println!("{}", response.text());

    agent.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_usize_falls_back_on_missing() {
        std::env::remove_var("PROBE_TEST_USIZE_MISSING");
        assert_eq!(env_usize("PROBE_TEST_USIZE_MISSING", 42), 42);
    }

    #[test]
    fn env_usize_falls_back_on_malformed_value() {
        std::env::set_var("PROBE_TEST_USIZE_BAD", "not-a-number");
        assert_eq!(env_usize("PROBE_TEST_USIZE_BAD", 42), 42);
        std::env::remove_var("PROBE_TEST_USIZE_BAD");
    }

    #[test]
    fn env_usize_parses_a_valid_value() {
        std::env::set_var("PROBE_TEST_USIZE_OK", "7");
        assert_eq!(env_usize("PROBE_TEST_USIZE_OK", 42), 7);
        std::env::remove_var("PROBE_TEST_USIZE_OK");
    }

    #[test]
    fn allowed_tool_set_disable_tools_wins() {
        let args = Args {
            question: "q".to_string(),
            path: None,
            prompt: None,
            provider: "anthropic".to_string(),
            model: None,
            allow_edit: true,
            allowed_tools: Some("search".to_string()),
            disable_tools: true,
            max_iterations: None,
            verbose: false,
            mcp: vec![],
        };
        assert!(matches!(allowed_tool_set(&args), AllowedToolSet::None));
    }

    #[test]
    fn allowed_tool_set_excludes_implement_without_allow_edit() {
        let args = Args {
            question: "q".to_string(),
            path: None,
            prompt: None,
            provider: "anthropic".to_string(),
            model: None,
            allow_edit: false,
            allowed_tools: None,
            disable_tools: false,
            max_iterations: None,
            verbose: false,
            mcp: vec![],
        };
        match allowed_tool_set(&args) {
            AllowedToolSet::Whitelist { exclude, .. } => {
                assert!(exclude.contains(&"implement".to_string()));
            }
            other => panic!("expected a whitelist, got {other:?}"),
        }
    }

    #[test]
    fn resolve_mcp_config_files_prefers_explicit_paths() {
        let explicit = vec![PathBuf::from("/tmp/does-not-matter.json")];
        assert_eq!(resolve_mcp_config_files(explicit.clone()), explicit);
    }
}
