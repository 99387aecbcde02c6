//! Schema validation & response cleaning.
//!
//! The bounded self-repair loop that dispatches an isolated sub-agent
//! lives in [`crate::agent::repair`], since it depends on `Agent`;
//! this module holds the pure, agent-independent pieces: cleaning,
//! draft-07 validation with strict-mode `additionalProperties` injection,
//! and the single-field auto-wrap heuristic.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::parser::normalize_fenced_json_quotes;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON Schema: {0}")]
    InvalidSchema(String),
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("schema validation failed:\n{0}")]
    ValidationFailed(String),
}

/// One structured validation error with a dot-notation path, the offending
/// value snippet, and an actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub snippet: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at '{}': {}", self.path, self.message)?;
        if let Some(s) = &self.snippet {
            write!(f, " (got: {s})")?;
        }
        Ok(())
    }
}

/// Strip an outer `<result>...</result>` wrapper if the *entire* trimmed
/// payload is one such element.
fn strip_result_wrapper(text: &str) -> &str {
    let t = text.trim();
    if let Some(inner) = t
        .strip_prefix("<result>")
        .and_then(|s| s.strip_suffix("</result>"))
    {
        inner.trim()
    } else {
        t
    }
}

/// Extract the first fenced ```json code block, but only when it spans
/// essentially the whole response (tolerant of surrounding whitespace,
/// intolerant of surrounding prose — to avoid harvesting `{{ template }}`
/// fragments from a documentation aside).
fn extract_whole_response_fence(text: &str) -> Option<&str> {
    let t = text.trim();
    let body = t.strip_prefix("```json")?.trim_start();
    let body = body.strip_suffix("```")?;
    Some(body.trim())
}

/// Clean a raw `attempt_completion` result string before validation
/// before validation. Idempotent: `clean(clean(x)) == clean(x)`.
pub fn clean_response(raw: &str) -> String {
    let unwrapped = strip_result_wrapper(raw);
    let candidate = extract_whole_response_fence(unwrapped).unwrap_or(unwrapped);
    let normalized = normalize_fenced_json_quotes(&format!("```json\n{candidate}\n```"));
    let reextracted = extract_whole_response_fence(&normalized).unwrap_or(candidate);
    reextracted.trim().to_string()
}

/// Recursively set `additionalProperties: false` on every object schema
/// that doesn't already specify it, walking through `allOf`/`anyOf`/`oneOf`,
/// `$ref` (resolved against `$defs`/`definitions` in the root), `properties`,
/// and tuple `items` arrays.
pub fn apply_strict_mode(schema: &mut Value) {
    let root = schema.clone();
    apply_strict_inner(schema, &root);
}

fn defs_lookup<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    // `$ref` values here are expected as "#/$defs/Name" or "#/definitions/Name".
    let pointer = pointer.strip_prefix('#')?;
    root.pointer(pointer)
}

fn apply_strict_inner(schema: &mut Value, root: &Value) {
    let Value::Object(obj) = schema else {
        return;
    };

    if let Some(Value::String(r)) = obj.get("$ref").cloned() {
        if let Some(resolved) = defs_lookup(root, &r) {
            let mut resolved = resolved.clone();
            apply_strict_inner(&mut resolved, root);
            *schema = resolved;
            return;
        }
    }

    if obj.get("type").and_then(Value::as_str) == Some("object") && !obj.contains_key("additionalProperties") {
        obj.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    if let Some(Value::Object(props)) = obj.get_mut("properties") {
        let keys: Vec<String> = props.keys().cloned().collect();
        for key in keys {
            if let Some(v) = props.get_mut(&key) {
                apply_strict_inner(v, root);
            }
        }
    }

    for combinator in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(items)) = obj.get_mut(combinator) {
            for item in items.iter_mut() {
                apply_strict_inner(item, root);
            }
        }
    }

    match obj.get_mut("items") {
        Some(Value::Array(items)) => {
            for item in items.iter_mut() {
                apply_strict_inner(item, root);
            }
        }
        Some(items @ Value::Object(_)) => apply_strict_inner(items, root),
        _ => {}
    }

    for defs_key in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = obj.get_mut(defs_key) {
            let keys: Vec<String> = defs.keys().cloned().collect();
            for key in keys {
                if let Some(v) = defs.get_mut(&key) {
                    apply_strict_inner(v, root);
                }
            }
        }
    }
}

/// True if `schema` is structurally `{ <field>: string }` — a bare object
/// with exactly one required string-typed property (in either the
/// shorthand or full JSON-Schema form).
pub fn single_string_field(schema: &Value) -> Option<String> {
    let obj = schema.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some("object") {
        return None;
    }
    let props = obj.get("properties")?.as_object()?;
    if props.len() != 1 {
        return None;
    }
    let (name, prop_schema) = props.iter().next()?;
    if prop_schema.get("type").and_then(Value::as_str) != Some("string") {
        return None;
    }
    Some(name.clone())
}

/// Validate `text` (already cleaned) against `schema`, in strict mode by
/// default. On success returns the parsed JSON value.
pub fn validate(text: &str, schema: &Value, strict: bool) -> Result<Value, SchemaError> {
    let parse_result: Result<Value, _> = serde_json::from_str(text);

    let value = match parse_result {
        Ok(v) => v,
        Err(e) => {
            if let Some(field) = single_string_field(schema) {
                // Auto-wrap as {"<field>": "<text>"} before failing.
                let mut map = Map::new();
                map.insert(field, Value::String(text.to_string()));
                Value::Object(map)
            } else {
                let pos = format!("line {} column {}", e.line(), e.column());
                let caret = format!("{}^", " ".repeat(e.column().saturating_sub(1)));
                return Err(SchemaError::InvalidJson(format!("{e} ({pos})\n{caret}")));
            }
        }
    };

    let mut compiled_schema = schema.clone();
    if strict {
        apply_strict_mode(&mut compiled_schema);
    }

    let validator = jsonschema::validator_for(&compiled_schema)
        .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

    let issues: Vec<ValidationIssue> = validator
        .iter_errors(&value)
        .map(|e| ValidationIssue {
            path: if e.instance_path.to_string().is_empty() {
                "$".to_string()
            } else {
                e.instance_path.to_string()
            },
            message: e.to_string(),
            snippet: Some(truncate(&e.instance.to_string(), 120)),
        })
        .collect();

    if issues.is_empty() {
        Ok(value)
    } else {
        let joined = issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Err(SchemaError::ValidationFailed(joined))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{truncated}...")
    }
}
