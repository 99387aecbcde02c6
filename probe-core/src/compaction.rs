//! History compactor: shrinks a conversation History while preserving
//! semantic continuity across segments.
//!
//! A *segment* begins at a human (non-synthetic) user turn and runs until
//! the next one. Within all but the most recent `keep_last_segments`
//! segments, assistant/tool-result pairs are replaced by one synthetic
//! `<segment_summary>` user turn.

use crate::types::{ContentBlock, Message, Role};

/// Options controlling how much of the recent conversation survives
/// compaction verbatim.
#[derive(Debug, Clone, Copy)]
pub struct CompactionOptions {
    /// Number of most-recent segments kept verbatim.
    pub keep_last_segments: usize,
    /// Minimum number of segments a History must have before compaction is
    /// attempted at all.
    pub min_segments_to_keep: usize,
}

impl Default for CompactionOptions {
    fn default() -> Self {
        Self {
            keep_last_segments: 1,
            min_segments_to_keep: 1,
        }
    }
}

/// Statistics describing the effect of one compaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    pub original_count: usize,
    pub compacted_count: usize,
    pub removed: usize,
    /// Integer percentage, rounded down.
    pub reduction_percent: usize,
}

impl CompactionStats {
    fn compute(original_count: usize, compacted_count: usize) -> Self {
        let removed = original_count.saturating_sub(compacted_count);
        let reduction_percent = if original_count == 0 {
            0
        } else {
            removed * 100 / original_count
        };
        Self {
            original_count,
            compacted_count,
            removed,
            reduction_percent,
        }
    }
}

/// True if `msg` is a "human" user turn — a real question, not a synthetic
/// tool-result or segment-summary envelope we generated ourselves.
fn is_human_user_turn(msg: &Message) -> bool {
    if msg.role != Role::User {
        return false;
    }
    let text = msg.text();
    let t = text.trim_start();
    !(t.starts_with("<tool_result") || t.starts_with("<segment_summary"))
}

/// Extract the tool name a synthetic `<tool_result tool="X">` turn refers to.
fn tool_result_name(msg: &Message) -> Option<String> {
    let text = msg.text();
    let t = text.trim_start();
    if !t.starts_with("<tool_result") {
        return None;
    }
    let attr = "tool=\"";
    let start = t.find(attr)? + attr.len();
    let end = t[start..].find('"')? + start;
    Some(t[start..end].to_string())
}

fn is_tool_result_turn(msg: &Message) -> bool {
    msg.role == Role::User && msg.text().trim_start().starts_with("<tool_result")
}

/// One contiguous span of History: `[start, end)`, where `start` is a human
/// user turn (or 0, for the system message before the first segment).
struct Segment {
    start: usize,
    end: usize,
}

fn segment_history(history: &[Message]) -> Vec<Segment> {
    let mut starts: Vec<usize> = history
        .iter()
        .enumerate()
        .skip(1) // index 0 is the system message, never a segment start
        .filter(|(_, m)| is_human_user_turn(m))
        .map(|(i, _)| i)
        .collect();

    if starts.is_empty() {
        return Vec::new();
    }
    starts.push(history.len());

    starts
        .windows(2)
        .map(|w| Segment {
            start: w[0],
            end: w[1],
        })
        .collect()
}

/// Compact `history` in place, replacing every segment older than the last
/// `options.keep_last_segments` with a single synthetic summary turn.
///
/// Invariants preserved: index 0 (system message) and every human user turn
/// appear in the output in the same relative order.
pub fn compact(history: &[Message], options: CompactionOptions) -> (Vec<Message>, CompactionStats) {
    let segments = segment_history(history);

    if segments.len() <= options.min_segments_to_keep {
        return (history.to_vec(), CompactionStats::compute(history.len(), history.len()));
    }

    let keep_from = segments.len().saturating_sub(options.keep_last_segments);

    let mut out = Vec::with_capacity(history.len());
    if !history.is_empty() {
        out.push(history[0].clone());
    }

    for (idx, seg) in segments.iter().enumerate() {
        if idx >= keep_from {
            out.extend(history[seg.start..seg.end].iter().cloned());
            continue;
        }

        // Always keep the human question itself; summarize the rest.
        out.push(history[seg.start].clone());

        let mut used_tools: Vec<String> = Vec::new();
        let mut tool_result_count = 0usize;
        for msg in &history[seg.start + 1..seg.end] {
            if is_tool_result_turn(msg) {
                tool_result_count += 1;
                if let Some(name) = tool_result_name(msg) {
                    if !used_tools.contains(&name) {
                        used_tools.push(name);
                    }
                }
            }
        }

        if tool_result_count > 0 {
            let summary = format!(
                "<segment_summary>used tools: {}; produced {} tool results</segment_summary>",
                used_tools.join(", "),
                tool_result_count
            );
            out.push(Message {
                role: Role::User,
                content: vec![ContentBlock::Text(summary)],
            });
        }
    }

    let stats = CompactionStats::compute(history.len(), out.len());
    (out, stats)
}

/// Rough token estimate used to decide whether proactive compaction should
/// run before the next model call. Delegates to the
/// provider's own estimator when available; callers without one may use
/// [`crate::governor::estimate_tokens`] as a fallback.
pub fn should_compact(estimated_tokens: usize, context_window: usize, reserve_fraction: f64) -> bool {
    let threshold = (context_window as f64 * (1.0 - reserve_fraction)) as usize;
    estimated_tokens > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(text: &str) -> Message {
        Message::user(text)
    }
    fn assistant(text: &str) -> Message {
        Message::assistant(text)
    }
    fn tool_result(tool: &str, body: &str) -> Message {
        Message::user(format!("<tool_result tool=\"{tool}\">{body}</tool_result>"))
    }

    fn sample_history() -> Vec<Message> {
        vec![
            Message::assistant("system prompt"), // stand-in for a system message
            user("Where is parseCommand defined?"),
            assistant("<search><query>parseCommand</query></search>"),
            tool_result("search", "two hits"),
            assistant("<attempt_completion><result>It's in bash.rs</result></attempt_completion>"),
            user("Now show me the caller"),
            assistant("<search><query>caller</query></search>"),
            tool_result("search", "one hit"),
            assistant("<attempt_completion><result>run.rs line 10</result></attempt_completion>"),
        ]
    }

    #[test]
    fn keeps_system_message_and_every_human_turn_in_order() {
        let history = sample_history();
        let (compacted, _) = compact(&history, CompactionOptions::default());

        let texts: Vec<String> = history.iter().filter(|m| is_human_user_turn(m)).map(|m| m.text()).collect();
        let compacted_texts: Vec<String> = compacted.iter().filter(|m| is_human_user_turn(m)).map(|m| m.text()).collect();
        assert_eq!(texts, compacted_texts);
        assert_eq!(compacted[0].text(), "system prompt");
    }

    #[test]
    fn older_segment_replaced_with_summary() {
        let history = sample_history();
        let (compacted, stats) = compact(&history, CompactionOptions::default());

        assert!(stats.removed > 0);
        let joined = compacted
            .iter()
            .map(|m| m.text())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(joined.contains("<segment_summary>used tools: search; produced 1 tool results</segment_summary>"));
        // The most recent segment survives verbatim.
        assert!(joined.contains("run.rs line 10"));
    }

    #[test]
    fn too_few_segments_is_a_no_op() {
        let history = vec![
            Message::assistant("system"),
            user("only question"),
            assistant("<attempt_completion><result>done</result></attempt_completion>"),
        ];
        let (compacted, stats) = compact(&history, CompactionOptions::default());
        assert_eq!(stats.removed, 0);
        assert_eq!(compacted.len(), history.len());
    }

    #[test]
    fn should_compact_threshold() {
        assert!(should_compact(80_000, 100_000, 0.25));
        assert!(!should_compact(50_000, 100_000, 0.25));
    }
}
