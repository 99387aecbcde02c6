//! Shell permission checker: decides whether a shell command string
//! may execute, against an allow/deny pattern policy with component-wise
//! evaluation of pipelines.

use std::fmt;

/// A single allow/deny pattern: `command`, `command:subcommand`,
/// `command:*`, or `mcp__server__*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Structural match against `{head, args}` — never the raw string.
    ///
    /// A subcommand pattern (e.g. `status`) matches only `args[0]`, since
    /// subcommand verbs are conventionally positional. A flag pattern (one
    /// starting with `-`, e.g. `-exec`) is scanned across every argument,
    /// since flags like `find`'s `-exec` can appear anywhere in the
    /// invocation, not just first.
    fn matches(&self, head: &str, args: &[String]) -> bool {
        let mut parts = self.0.splitn(2, ':');
        let pat_head = parts.next().unwrap_or("");
        let pat_rest = parts.next();

        if pat_head != head {
            return false;
        }

        match pat_rest {
            None => true,
            Some("*") => true,
            Some(sub) if sub.starts_with('-') => args.iter().any(|a| a == sub),
            Some(sub) => args.first().map(|a| a.as_str()) == Some(sub),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed shell command: head, argument vector, and whether it contains
/// shell metacharacters that make it a pipeline/compound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashCommand {
    pub head: String,
    pub args: Vec<String>,
    pub is_complex: bool,
}

const COMPLEX_MARKERS: &[&str] = &["|", "&&", "||", ";", "<", ">", "$(", "`"];

impl BashCommand {
    /// Parse a raw command string. Quoted arguments are always unquoted
    /// (the historical quote-preservation behaviour is a bug the spec
    /// mandates not reproducing).
    pub fn parse(raw: &str) -> Self {
        let is_complex = COMPLEX_MARKERS.iter().any(|m| raw.contains(m));
        let words = shell_words::split(raw).unwrap_or_else(|_| {
            raw.split_whitespace().map(|s| s.to_string()).collect()
        });
        let mut iter = words.into_iter();
        let head = iter.next().unwrap_or_default();
        let args: Vec<String> = iter.collect();
        Self {
            head,
            args,
            is_complex,
        }
    }

    /// Split a complex command into its component simple commands across
    /// `|`, `&&`, `||`, `;`. Returns `None` if the command contains
    /// substitution, redirection, or backticks — these cannot be split and
    /// so can never be allowed component-wise.
    pub fn split_components(raw: &str) -> Option<Vec<BashCommand>> {
        if raw.contains("$(") || raw.contains('`') || raw.contains('<') || raw.contains('>') {
            return None;
        }

        let mut components = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '|' => {
                    if chars.peek() == Some(&'|') {
                        chars.next();
                    }
                    components.push(std::mem::take(&mut current));
                }
                '&' if chars.peek() == Some(&'&') => {
                    chars.next();
                    components.push(std::mem::take(&mut current));
                }
                ';' => {
                    components.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }
        components.push(current);

        Some(
            components
                .into_iter()
                .map(|s| BashCommand::parse(s.trim()))
                .filter(|c| !c.head.is_empty())
                .collect(),
        )
    }
}

/// Outcome of a permission decision, plus enough detail for the telemetry
/// hook (`{command, parsedHead, isComplex, allowed, reason, matchedPattern}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub command: String,
    pub parsed_head: String,
    pub is_complex: bool,
    pub allowed: bool,
    pub reason: String,
    pub matched_pattern: Option<String>,
    /// Set when a custom-allow pattern overrode a default-deny pattern.
    pub overridden_deny: bool,
    /// Set for complex commands allowed because every component was
    /// individually allowed.
    pub allowed_by_components: bool,
}

/// The effective policy: default allow/deny lists plus caller-supplied
/// overrides. `customAllow` can override `defaultDeny` for exactly the
/// patterns it lists; `customDeny` always wins over everything else.
#[derive(Debug, Clone)]
pub struct BashPermissionPolicy {
    pub default_allow: Vec<Pattern>,
    pub default_deny: Vec<Pattern>,
    pub custom_allow: Vec<Pattern>,
    pub custom_deny: Vec<Pattern>,
}

impl Default for BashPermissionPolicy {
    fn default() -> Self {
        Self {
            default_allow: default_allow_list(),
            default_deny: default_deny_list(),
            custom_allow: Vec::new(),
            custom_deny: Vec::new(),
        }
    }
}

impl BashPermissionPolicy {
    pub fn with_custom_allow(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.custom_allow
            .extend(patterns.into_iter().map(Pattern::new));
        self
    }

    pub fn with_custom_deny(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.custom_deny
            .extend(patterns.into_iter().map(Pattern::new));
        self
    }

    /// Evaluate a single already-parsed simple command (never recurses into
    /// pipeline splitting — see [`Self::check`] for that).
    fn check_simple(&self, cmd: &BashCommand) -> (bool, String, Option<String>, bool) {
        let head = cmd.head.as_str();
        let args = cmd.args.as_slice();

        if let Some(p) = self.custom_deny.iter().find(|p| p.matches(head, args)) {
            return (
                false,
                format!("command '{}' matches custom deny pattern '{}'", head, p),
                Some(p.to_string()),
                false,
            );
        }

        let default_deny_match = self
            .default_deny
            .iter()
            .find(|p| p.matches(head, args));

        if let Some(deny_pattern) = default_deny_match {
            if let Some(allow) = self
                .custom_allow
                .iter()
                .find(|p| p.0 == deny_pattern.0)
            {
                return (
                    true,
                    format!(
                        "command '{}' overridden by custom allow pattern '{}'",
                        head, allow
                    ),
                    Some(allow.to_string()),
                    true,
                );
            }
            return (
                false,
                format!(
                    "command '{}' matches deny pattern '{}'",
                    head, deny_pattern
                ),
                Some(deny_pattern.to_string()),
                false,
            );
        }

        if let Some(p) = self.custom_allow.iter().find(|p| p.matches(head, args)) {
            return (
                true,
                format!("command '{}' matches custom allow pattern '{}'", head, p),
                Some(p.to_string()),
                false,
            );
        }

        if let Some(p) = self
            .default_allow
            .iter()
            .find(|p| p.matches(head, args))
        {
            return (
                true,
                format!("command '{}' matches allow pattern '{}'", head, p),
                Some(p.to_string()),
                false,
            );
        }

        (
            false,
            format!("command '{}' is not in allow list", head),
            None,
        false,
        )
    }

    /// Decide whether `raw` may execute.
    pub fn check(&self, raw: &str) -> Decision {
        let cmd = BashCommand::parse(raw);

        if !cmd.is_complex {
            let (allowed, reason, matched, overridden) = self.check_simple(&cmd);
            return Decision {
                command: raw.to_string(),
                parsed_head: cmd.head,
                is_complex: false,
                allowed,
                reason,
                matched_pattern: matched,
                overridden_deny: overridden,
                allowed_by_components: false,
            };
        }

        match BashCommand::split_components(raw) {
            None => Decision {
                command: raw.to_string(),
                parsed_head: cmd.head,
                is_complex: true,
                allowed: false,
                reason: "complex command contains substitution or redirection and cannot be split for evaluation".to_string(),
                matched_pattern: None,
                overridden_deny: false,
                allowed_by_components: false,
            },
            Some(components) if components.is_empty() => Decision {
                command: raw.to_string(),
                parsed_head: cmd.head,
                is_complex: true,
                allowed: false,
                reason: "complex command has no components".to_string(),
                matched_pattern: None,
                overridden_deny: false,
                allowed_by_components: false,
            },
            Some(components) => {
                let mut all_allowed = true;
                let mut last_reason = String::new();
                let mut any_overridden = false;
                for component in &components {
                    let (allowed, reason, _matched, overridden) = self.check_simple(component);
                    any_overridden |= overridden;
                    if !allowed {
                        all_allowed = false;
                        last_reason = reason;
                        break;
                    }
                    last_reason = reason;
                }

                Decision {
                    command: raw.to_string(),
                    parsed_head: cmd.head,
                    is_complex: true,
                    allowed: all_allowed,
                    reason: if all_allowed {
                        "every component of the pipeline is allowed".to_string()
                    } else {
                        format!("pipeline denied: {}", last_reason)
                    },
                    matched_pattern: None,
                    overridden_deny: any_overridden,
                    allowed_by_components: all_allowed,
                }
            }
        }
    }
}

fn pats(list: &[&str]) -> Vec<Pattern> {
    list.iter().map(|s| Pattern::new(*s)).collect()
}

fn default_allow_list() -> Vec<Pattern> {
    pats(&[
        "ls", "cat", "grep", "find", "head", "tail", "pwd", "echo",
        "git:status", "git:log", "git:diff", "git:show", "git:branch", "git:tag",
        "git:remote", "git:blame", "git:rev-parse", "git:rev-list", "git:ls-files",
        "git:ls-tree", "git:cat-file", "git:for-each-ref", "git:merge-base",
        "git:describe", "git:config", "git:stash:list", "git:worktree:list",
        "git:notes:list", "git:notes:show",
        "gh:auth:status", "gh:api",
    ])
}

fn default_deny_list() -> Vec<Pattern> {
    pats(&[
        "git:push", "git:commit", "git:reset", "git:clean", "git:rm", "git:merge",
        "git:rebase", "git:cherry-pick", "git:stash:drop", "git:stash:pop",
        "git:stash:clear", "git:stash:push", "git:branch:-d", "git:branch:-D",
        "git:branch:--delete", "git:tag:-d", "git:tag:--delete",
        "git:remote:remove", "git:remote:rm", "git:checkout:--force",
        "git:checkout:-f", "git:submodule:deinit", "git:worktree:remove",
        "git:worktree:add", "git:notes:add", "git:notes:remove",
        "gh:create", "gh:close", "gh:delete", "gh:edit", "gh:merge", "gh:reopen",
        "gh:review", "gh:comment", "gh:fork", "gh:rename", "gh:archive",
        "gh:clone", "gh:set",
        "rm", "sudo", "dd", "awk", "perl", "python", "node",
        "find:-exec",
    ])
}
