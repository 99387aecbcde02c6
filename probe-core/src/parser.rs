//! XML-embedded tool-call parser (hybrid native-XML + JSON-in-params dialect).
//!
//! The model's assistant turn is plain text that may interleave prose,
//! `<thinking>` blocks, and at most one tool invocation written as an XML
//! element. Two dialects are supported:
//!
//! - **Native**: `<toolname><param>value</param>...</toolname>` — each direct
//!   child element becomes a `param -> value` pair.
//! - **MCP**: `<mcp__server__tool><params>{ ...json... }</params></mcp__server__tool>`
//!   — the single `<params>` child is parsed as JSON.
//!
//! The load-bearing detail is locating the *matching* closing tag with a
//! last-occurrence search rather than a well-formed-XML parse: tool results
//! embedded in `result` values (JSON blobs, regexes) can contain substrings
//! that look like the tool's own closing tag.

use std::collections::HashMap;
use serde_json::Value;

/// Describes a tool tag the parser should recognize, as drawn from the
/// tool registry at call time (native tools + every discovered MCP tool).
#[derive(Debug, Clone)]
pub struct ToolTag {
    pub name: String,
    pub is_mcp: bool,
    /// If the tool has exactly one conventional "body" parameter (e.g.
    /// `attempt_completion`'s `result`), fallback parsing assigns the whole
    /// un-tagged inner body to this key when no child elements are found.
    pub primary_param: Option<String>,
}

/// A single parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolParams {
    /// Native dialect: ordered `param -> value` pairs (order preserved for
    /// debugging; lookups are by key).
    Native(HashMap<String, String>),
    /// MCP dialect: parsed JSON parameter object.
    Json(Value),
}

impl ToolParams {
    /// Look up a parameter as a string, regardless of dialect.
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            ToolParams::Native(map) => map.get(key).cloned(),
            ToolParams::Json(v) => v.get(key).map(|val| match val {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self {
            ToolParams::Native(map) => map
                .get(key)
                .map(|v| matches!(v.trim(), "true" | "1" | "yes"))
                .unwrap_or(default),
            ToolParams::Json(v) => v.get(key).and_then(Value::as_bool).unwrap_or(default),
        }
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        match self {
            ToolParams::Native(map) => map.get(key).and_then(|v| v.trim().parse().ok()),
            ToolParams::Json(v) => v.get(key).and_then(Value::as_u64).map(|n| n as usize),
        }
    }

    pub fn as_json(&self) -> Value {
        match self {
            ToolParams::Native(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect())
            }
            ToolParams::Json(v) => v.clone(),
        }
    }
}

/// A tool invocation extracted from assistant text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub params: ToolParams,
    /// Thinking text stripped from the response, exposed only for debugging.
    pub thinking: Vec<String>,
}

/// Errors the parser can surface for assistant text that looks like a tool
/// call but is malformed enough that no call could be extracted.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("tool '{0}' closing tag not found")]
    UnclosedTag(String),
    #[error("malformed MCP params JSON for tool '{0}': {1}")]
    InvalidJson(String, String),
    #[error("MCP tool '{0}' has no <params> element")]
    MissingParams(String),
}

/// Strip every `<thinking>...</thinking>` block from `text`, returning the
/// stripped text and the removed thinking bodies in order.
pub fn strip_thinking(text: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(text.len());
    let mut thinking = Vec::new();
    let mut rest = text;

    loop {
        match rest.find("<thinking>") {
            Some(open_idx) => {
                out.push_str(&rest[..open_idx]);
                let after_open = &rest[open_idx + "<thinking>".len()..];
                match after_open.find("</thinking>") {
                    Some(close_idx) => {
                        thinking.push(after_open[..close_idx].to_string());
                        rest = &after_open[close_idx + "</thinking>".len()..];
                    }
                    None => {
                        // Streaming truncation: an opened thinking block that
                        // never closed consumes the remainder silently.
                        thinking.push(after_open.to_string());
                        rest = "";
                        break;
                    }
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    (out, thinking)
}

/// Find the first opening tag among `known_tags` and return
/// `(tag_index_in_known_tags, open_tag_start, open_tag_end)`.
fn find_first_tool_open(text: &str, known_tags: &[ToolTag]) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    for (idx, tag) in known_tags.iter().enumerate() {
        let open = format!("<{}>", tag.name);
        if let Some(pos) = text.find(&open) {
            let candidate = (idx, pos, pos + open.len());
            match best {
                Some((_, best_pos, _)) if best_pos <= pos => {}
                _ => best = Some(candidate),
            }
        }
    }
    best
}

/// Extract direct child `<tag>value</tag>` elements from `inner`, using a
/// last-occurrence search for each child's closing tag so nested XML-like
/// text in the value is preserved verbatim.
fn parse_native_children(inner: &str) -> Vec<(String, String)> {
    let mut children = Vec::new();
    let bytes = inner.as_bytes();
    let mut cursor = 0usize;

    while cursor < inner.len() {
        // Find next '<' that starts a plausible opening tag.
        let Some(rel_lt) = inner[cursor..].find('<') else {
            break;
        };
        let lt = cursor + rel_lt;
        let Some(rel_gt) = inner[lt..].find('>') else {
            break;
        };
        let gt = lt + rel_gt;
        let tag_name = &inner[lt + 1..gt];
        if tag_name.is_empty()
            || !tag_name
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic() || c == '_')
                .unwrap_or(false)
            || !tag_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            // Not a plausible child tag; skip past this '<' and keep scanning.
            cursor = lt + 1;
            continue;
        }

        let close_tag = format!("</{}>", tag_name);
        let after_open = &inner[gt + 1..];
        match after_open.rfind(&close_tag) {
            Some(rel_close) => {
                let value = after_open[..rel_close].trim().to_string();
                children.push((tag_name.to_string(), value));
                cursor = gt + 1 + rel_close + close_tag.len();
            }
            None => {
                // No closing tag for this child at all; stop parsing children.
                break;
            }
        }
        let _ = bytes;
    }

    children
}

/// Normalize JS-style single-quoted arrays/objects inside fenced ```json
/// blocks to double-quoted JSON. Scoped to the fenced-block extraction step;
/// raw JSON outside fences is left untouched so strings containing single
/// quotes are never corrupted.
pub fn normalize_fenced_json_quotes(text: &str) -> String {
    const FENCE_OPEN: &str = "```json";
    const FENCE_CLOSE: &str = "```";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        match rest.find(FENCE_OPEN) {
            Some(open_idx) => {
                out.push_str(&rest[..open_idx]);
                let body_start = open_idx + FENCE_OPEN.len();
                let after_fence = &rest[body_start..];
                match after_fence.find(FENCE_CLOSE) {
                    Some(close_idx) => {
                        out.push_str(FENCE_OPEN);
                        out.push_str(&requote_js_literal(&after_fence[..close_idx]));
                        out.push_str(FENCE_CLOSE);
                        rest = &after_fence[close_idx + FENCE_CLOSE.len()..];
                    }
                    None => {
                        out.push_str(FENCE_OPEN);
                        out.push_str(after_fence);
                        rest = "";
                        break;
                    }
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}

/// Rewrite single-quoted JS-style string literals to double-quoted JSON
/// string literals, leaving already-double-quoted strings untouched.
fn requote_js_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices().peekable();
    let mut in_double = false;

    while let Some((_, c)) = chars.next() {
        match c {
            '"' if !in_double => {
                in_double = true;
                out.push(c);
            }
            '"' if in_double => {
                in_double = false;
                out.push(c);
            }
            '\\' if in_double => {
                out.push(c);
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
            }
            '\'' if !in_double => {
                // Start of a single-quoted literal: copy through its
                // unescaped closing quote, rewriting escapes and internal
                // double-quotes as needed.
                out.push('"');
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '\\' => out.push('\\'),
                        '\'' => {
                            out.push('"');
                            break;
                        }
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Parse at most one [`ToolCall`] out of assistant text.
///
/// `known_tags` should be built from the registry *at call time*, including
/// every currently-enabled native tool and every tool discovered over MCP,
/// because the set of recognized tags can change as MCP servers connect.
pub fn parse(text: &str, known_tags: &[ToolTag]) -> Result<Option<ToolCall>, ParseError> {
    let (stripped, thinking) = strip_thinking(text);

    let Some((tag_idx, _open_start, open_end)) = find_first_tool_open(&stripped, known_tags)
    else {
        return Ok(None);
    };
    let tag = &known_tags[tag_idx];

    let close_tag = format!("</{}>", tag.name);
    let after_open = &stripped[open_end..];
    let Some(close_rel) = after_open.rfind(&close_tag) else {
        return Err(ParseError::UnclosedTag(tag.name.clone()));
    };
    let inner = &after_open[..close_rel];

    if tag.is_mcp {
        let params_open = "<params>";
        let params_close = "</params>";
        let Some(po) = inner.find(params_open) else {
            return Err(ParseError::MissingParams(tag.name.clone()));
        };
        let after_params_open = &inner[po + params_open.len()..];
        let Some(pc) = after_params_open.rfind(params_close) else {
            return Err(ParseError::MissingParams(tag.name.clone()));
        };
        let raw_json = after_params_open[..pc].trim();
        let normalized = normalize_fenced_json_quotes(raw_json);
        // The params body itself is not inside a fence; try it verbatim
        // first, then fall back to the JS-requoting pass for models that
        // emit single-quoted object literals directly.
        let value: Value = serde_json::from_str(raw_json)
            .or_else(|_| serde_json::from_str(&requote_js_literal(&normalized)))
            .map_err(|e| ParseError::InvalidJson(tag.name.clone(), e.to_string()))?;

        return Ok(Some(ToolCall {
            name: tag.name.clone(),
            params: ToolParams::Json(value),
            thinking,
        }));
    }

    let mut children = parse_native_children(inner);
    if children.is_empty() {
        if let Some(primary) = &tag.primary_param {
            let body = inner.trim();
            if !body.is_empty() {
                children.push((primary.clone(), body.to_string()));
            }
        }
    }

    let mut map = HashMap::with_capacity(children.len());
    for (k, v) in children {
        map.insert(k, v);
    }

    Ok(Some(ToolCall {
        name: tag.name.clone(),
        params: ToolParams::Native(map),
        thinking,
    }))
}

/// Conservative entity encoder for `& < > " '`, matched by [`decode_entities`].
pub fn encode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Right-inverse of [`encode_entities`] on the characters it encodes.
pub fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> ToolTag {
        ToolTag {
            name: name.to_string(),
            is_mcp: false,
            primary_param: None,
        }
    }

    fn completion_tag() -> ToolTag {
        ToolTag {
            name: "attempt_completion".to_string(),
            is_mcp: false,
            primary_param: Some("result".to_string()),
        }
    }

    #[test]
    fn strips_single_thinking_block() {
        let (stripped, thinking) = strip_thinking("before <thinking>secret</thinking> after");
        assert_eq!(stripped, "before  after");
        assert_eq!(thinking, vec!["secret".to_string()]);
    }

    #[test]
    fn native_dialect_parses_direct_children() {
        let text = "<search><query>foo</query><path>./src</path></search>";
        let call = parse(text, &[tag("search")]).unwrap().unwrap();
        assert_eq!(call.name, "search");
        assert_eq!(call.params.get("query").as_deref(), Some("foo"));
        assert_eq!(call.params.get("path").as_deref(), Some("./src"));
    }

    #[test]
    fn last_occurrence_closing_tag_survives_embedded_substring() {
        // Strings of the form <attempt_completion>X</attempt_completion>
        // where X contains the literal substring "</attempt_completion>"
        // must parse with result == X verbatim.
        let x = r#"{"code": "if (x) { return '</attempt_completion>'; }"}"#;
        let text = format!("<attempt_completion>{x}</attempt_completion>");
        let call = parse(&text, &[completion_tag()]).unwrap().unwrap();
        assert_eq!(call.params.get("result").as_deref(), Some(x));
    }

    #[test]
    fn nested_result_child_preserved_verbatim() {
        let inner_result = "Defined in bashPermissions, see </result> in docs";
        let text = format!("<attempt_completion><result>{inner_result}</result></attempt_completion>");
        let call = parse(&text, &[completion_tag()]).unwrap().unwrap();
        assert_eq!(call.params.get("result").as_deref(), Some(inner_result));
    }

    #[test]
    fn mcp_dialect_parses_json_params() {
        let text = r#"<mcp__fs__read_file>
<params>
{ "path": "/abs/path" }
</params>
</mcp__fs__read_file>"#;
        let mcp_tag = ToolTag {
            name: "mcp__fs__read_file".to_string(),
            is_mcp: true,
            primary_param: None,
        };
        let call = parse(text, &[mcp_tag]).unwrap().unwrap();
        assert_eq!(call.params.get("path").as_deref(), Some("/abs/path"));
    }

    #[test]
    fn mcp_dialect_survives_closing_tag_substring_in_json() {
        let text = r#"<attempt_completion><result>{"code": "x</attempt_completion>y"}</result></attempt_completion>"#;
        let call = parse(text, &[completion_tag()]).unwrap().unwrap();
        let result = call.params.get("result").unwrap();
        assert!(result.contains("</attempt_completion>"));
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["code"], "x</attempt_completion>y");
    }

    #[test]
    fn only_first_tool_tag_is_honoured() {
        let text = "<search><query>a</query></search><search><query>b</query></search>";
        let call = parse(text, &[tag("search")]).unwrap().unwrap();
        assert_eq!(call.params.get("query").as_deref(), Some("a"));
    }

    #[test]
    fn no_known_tag_present_returns_none() {
        let text = "just some prose, no tool call here";
        assert_eq!(parse(text, &[tag("search")]).unwrap(), None);
    }

    #[test]
    fn unclosed_tag_is_parse_error() {
        let text = "<search><query>a</query>";
        assert!(matches!(
            parse(text, &[tag("search")]),
            Err(ParseError::UnclosedTag(_))
        ));
    }

    #[test]
    fn js_style_single_quotes_normalized_in_fence() {
        let text = "```json\n{'a': 'b', 'list': ['x', 'y']}\n```";
        let normalized = normalize_fenced_json_quotes(text);
        assert!(normalized.contains("\"a\""));
        assert!(normalized.contains("\"b\""));
        assert!(normalized.contains("[\"x\", \"y\"]") || normalized.contains("[\"x\",\"y\"]"));
    }

    #[test]
    fn raw_json_outside_fence_untouched() {
        let text = "prose with a contraction: it's fine, and {\"k\": \"it's\"} too";
        let normalized = normalize_fenced_json_quotes(text);
        assert_eq!(normalized, text);
    }

    #[test]
    fn entity_roundtrip_on_conservative_charset() {
        let samples = ["<tag>", "a & b", "\"quoted\"", "it's", "mix <&>\"'"];
        for s in samples {
            assert_eq!(decode_entities(&encode_entities(s)), s);
        }
    }
}
