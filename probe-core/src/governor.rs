//! Output size governor: bounds the size of any individual tool
//! result that re-enters the conversation, spilling the full payload to disk
//! when it doesn't fit.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 20_000;
const TAIL_TOKENS: usize = 1_000;
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("failed to write spill file {path}: {source}")]
    Spill {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Approximate token count: `ceil(len / 4)` unless a provider tokenizer is
/// supplied by the caller (the core has no tokenizer dependency of its own).
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

/// Coerce a possibly-invalid limit (NaN is not representable in `usize`, but
/// zero/negative-via-parse is) to the default, per rule 4.
pub fn normalize_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(n) if n > 0 => n,
        _ => DEFAULT_MAX_OUTPUT_TOKENS,
    }
}

/// Outcome of running a payload through the governor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernedOutput {
    /// Text to re-enter the conversation: either the original payload
    /// unchanged, or a truncation notice.
    pub text: String,
    /// Whether truncation occurred.
    pub truncated: bool,
    /// Path the full payload was spilled to, if truncation occurred and the
    /// spill write succeeded.
    pub spill_path: Option<PathBuf>,
}

/// Where to write spill files: `${tmpdir}/probe-output/tool-output-${session}-${uuid}.txt`.
pub fn spill_path(base_tmp: &Path, session_id: &str, unique: &str) -> PathBuf {
    base_tmp
        .join("probe-output")
        .join(format!("tool-output-{session_id}-{unique}.txt"))
}

/// Run `payload` through the governor. `unique` should be a fresh random
/// token (e.g. a UUID) per call so concurrent sessions never collide on
/// spill file names.
pub fn govern(
    payload: &str,
    limit: Option<usize>,
    base_tmp: &Path,
    session_id: &str,
    unique: &str,
) -> GovernedOutput {
    let limit = normalize_limit(limit);
    let token_count = estimate_tokens(payload);

    if token_count <= limit {
        return GovernedOutput {
            text: payload.to_string(),
            truncated: false,
            spill_path: None,
        };
    }

    let path = spill_path(base_tmp, session_id, unique);
    let spill_result = std::fs::create_dir_all(path.parent().unwrap())
        .and_then(|_| std::fs::write(&path, payload));

    let spill_note = match &spill_result {
        Ok(()) => format!("full output spilled to: {}", path.display()),
        Err(e) => format!("warning: failed to spill full output to disk: {e}"),
    };

    let slice = if limit < 2_000 {
        let head_chars = limit * CHARS_PER_TOKEN;
        truncate_chars(payload, head_chars).to_string()
    } else {
        let tail_tokens = TAIL_TOKENS;
        let head_tokens = limit.saturating_sub(tail_tokens);
        let head_chars = head_tokens * CHARS_PER_TOKEN;
        let tail_chars = tail_tokens * CHARS_PER_TOKEN;
        let omitted_tokens = token_count.saturating_sub(head_tokens + tail_tokens);

        let head = truncate_chars(payload, head_chars);
        let tail = tail_chars_from_end(payload, tail_chars);

        format!(
            "{head}\n\n... [{omitted_tokens} tokens omitted] ...\n\n{tail}"
        )
    };

    let text = format!(
        "Output truncated: {token_count} tokens exceeds limit of {limit}. {spill_note}\n\n{slice}"
    );

    GovernedOutput {
        text,
        truncated: true,
        spill_path: spill_result.ok().map(|_| path),
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn tail_chars_from_end(s: &str, max_chars: usize) -> &str {
    let total = s.chars().count();
    if total <= max_chars {
        return s;
    }
    let skip = total - max_chars;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn payload_within_limit_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let payload = "short output";
        let out = govern(payload, Some(20_000), tmp.path(), "sess", "uuid1");
        assert_eq!(out.text, payload);
        assert!(!out.truncated);
        assert!(out.spill_path.is_none());
    }

    #[test]
    fn spill_writes_payload_bytes_equal() {
        let tmp = TempDir::new().unwrap();
        let payload = "x".repeat(400_000);
        let out = govern(&payload, Some(20_000), tmp.path(), "sess-1", "uuid-2");
        assert!(out.truncated);
        let path = out.spill_path.expect("spill path present");
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, payload);
        assert!(out.text.contains(&path.display().to_string()));
        assert!(out.text.contains(&estimate_tokens(&payload).to_string()));
    }

    #[test]
    fn head_tail_slice_sizes_match_limit_minus_tail() {
        let tmp = TempDir::new().unwrap();
        // 400KB of 'a's => 100_000 tokens at 4 chars/token.
        let payload = "a".repeat(400_000);
        let limit = 20_000;
        let out = govern(&payload, Some(limit), tmp.path(), "sess", "uuid3");
        assert!(out.truncated);
        let omitted = estimate_tokens(&payload) - (limit - TAIL_TOKENS) - TAIL_TOKENS;
        assert!(out.text.contains(&format!("{omitted} tokens omitted")));
    }

    #[test]
    fn tiny_limit_uses_plain_head_slice() {
        let tmp = TempDir::new().unwrap();
        let payload = "b".repeat(100_000);
        let out = govern(&payload, Some(500), tmp.path(), "sess", "uuid4");
        assert!(out.truncated);
        assert!(!out.text.contains("tokens omitted"));
    }

    #[test]
    fn invalid_limit_falls_back_to_default() {
        assert_eq!(normalize_limit(Some(0)), DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(normalize_limit(None), DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(normalize_limit(Some(500)), 500);
    }

    #[test]
    fn estimate_tokens_is_ceil_div_four() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
