//! Tool registry & dispatcher, and the `AllowedToolSet` predicate.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::parser::{ToolParams, ToolTag};
use crate::tool::{ToolError, ToolResult};

/// Where a tool's definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSourceKind {
    /// Compiled into this workspace (`search`, `bash`, `attempt_completion`, ...).
    Native,
    /// Discovered over MCP from an external server (`mcp__server__tool`).
    Mcp,
    /// A provider-native built-in tool (e.g. Google search) whose events are
    /// re-presented as prose rather than dispatched.
    GeminiBuiltin,
}

/// Behavioural flags the loop and presentation layer consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolFlags {
    /// Execution suspends on an external resource (subprocess, network).
    pub suspends: bool,
    /// The tool can modify files in the repository.
    pub mutates_repo: bool,
    /// The tool's output can surface image attachments.
    pub produces_images: bool,
}

/// Outcome of executing a tool: the payload plus any images discovered in
/// it that should attach to the *following* synthetic user turn.
pub struct ToolOutput {
    pub result: ToolResult,
    pub discovered_images: Vec<PathBuf>,
}

impl ToolOutput {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            result: ToolResult::Text(s.into()),
            discovered_images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.discovered_images = images;
        self
    }
}

/// The execute capability bound to a [`ToolDescriptor`].
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError>;
}

/// A registered tool: name, source, rendered XML description, JSON schema
/// (for MCP tools), the execute capability, and behavioural flags.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub source: ToolSourceKind,
    pub xml_description: String,
    pub params_schema: Option<Value>,
    pub executor: Arc<dyn ToolExecutor>,
    pub flags: ToolFlags,
    /// Set for tools like `attempt_completion` where an un-tagged body is
    /// tolerated and assigned to this parameter name.
    pub primary_param: Option<String>,
}

impl ToolDescriptor {
    pub fn tag(&self) -> ToolTag {
        ToolTag {
            name: self.name.clone(),
            is_mcp: self.source == ToolSourceKind::Mcp,
            primary_param: self.primary_param.clone(),
        }
    }
}

/// The set of tools enabled for a session.
#[derive(Debug, Clone)]
pub enum AllowedToolSet {
    /// Every registered tool is enabled.
    All,
    /// Only tools matching an include pattern (and no exclude pattern).
    Whitelist {
        include: Vec<String>,
        exclude: Vec<String>,
    },
    /// No tools are enabled.
    None,
}

impl Default for AllowedToolSet {
    fn default() -> Self {
        AllowedToolSet::All
    }
}

impl AllowedToolSet {
    pub fn whitelist(include: impl IntoIterator<Item = String>) -> Self {
        let mut inc = Vec::new();
        let mut exc = Vec::new();
        for pattern in include {
            if let Some(stripped) = pattern.strip_prefix('!') {
                exc.push(stripped.to_string());
            } else {
                inc.push(pattern);
            }
        }
        AllowedToolSet::Whitelist {
            include: inc,
            exclude: exc,
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        match self {
            AllowedToolSet::None => false,
            AllowedToolSet::All => true,
            AllowedToolSet::Whitelist { include, exclude } => {
                let included = include.iter().any(|p| glob_match(p, name));
                let excluded = exclude.iter().any(|p| glob_match(p, name));
                included && !excluded
            }
        }
    }
}

/// Minimal `*`-glob matcher (the only wildcard form the pattern grammar
/// uses: `mcp__server__*`, `tool*`, etc.).
pub fn glob_match(pattern: &str, name: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix);
    }
    pattern == name
}

/// Holds every [`ToolDescriptor`] available to a session, native and MCP.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) {
        self.tools.retain(|t| t.name != descriptor.name);
        self.tools.push(descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn enabled_tags(&self, allowed: &AllowedToolSet) -> Vec<ToolTag> {
        self.tools
            .iter()
            .filter(|t| allowed.is_enabled(&t.name))
            .map(|t| t.tag())
            .collect()
    }

    /// Render the `## Available Tools` system-prompt section for every
    /// enabled tool.
    pub fn render_system_prompt_section(&self, allowed: &AllowedToolSet) -> String {
        let mut out = String::from("## Available Tools\n\n");
        for tool in self.tools.iter().filter(|t| allowed.is_enabled(&t.name)) {
            out.push_str(&format!("## {}\n\n{}\n\n", tool.name, tool.xml_description));
        }
        out
    }
}

/// Conservative regex-like scan for image-path references in a tool's
/// stdout: a path-like prefix followed by a common image extension.
/// Deliberately allowlist-based to err toward fewer
/// false positives.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

pub fn discover_image_paths(text: &str, already_seen: &HashMap<PathBuf, ()>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for token in text.split(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == '(' || c == ')') {
        let trimmed = token.trim_matches(|c| c == ',' || c == ':' || c == ';');
        if trimmed.is_empty() || !is_path_like(trimmed) {
            continue;
        }
        let Some(ext) = trimmed.rsplit('.').next() else {
            continue;
        };
        if !IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            continue;
        }
        let path = PathBuf::from(trimmed);
        if !already_seen.contains_key(&path) && !found.contains(&path) {
            found.push(path);
        }
    }
    found
}

fn is_path_like(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '_' | '-'))
        && s.contains('.')
}
