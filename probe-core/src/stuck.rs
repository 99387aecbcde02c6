//! Stuck-loop detector: a semantic heuristic that classifies an
//! assistant response as "unable to proceed" so the agent loop can break out
//! before burning tokens cycling between near-identical phrasings.

/// Case-insensitive substrings/phrases that mark an assistant response as
/// a "stuck" admission of inability to proceed.
const STUCK_PATTERNS: &[&str] = &[
    "cannot proceed",
    "can't proceed",
    "cant proceed",
    "unable to proceed",
    "loop",
    "deadlock",
    "explained multiple times",
];

/// Phrases requiring the conjunction of an "exhausted" admission with a
/// mention of options/methods, since "exhausted" alone is too common in
/// legitimate responses (e.g. "exhausted the search results").
fn matches_exhausted_options(lower: &str) -> bool {
    lower.contains("exhausted") && (lower.contains("option") || lower.contains("method"))
}

/// Phrases of the shape "need X to proceed".
fn matches_need_to_proceed(lower: &str) -> bool {
    lower.contains("need") && lower.contains("to proceed")
}

/// Phrases of the shape "cannot find ... required".
fn matches_cannot_find_required(lower: &str) -> bool {
    (lower.contains("cannot find") || lower.contains("can't find")) && lower.contains("required")
}

/// Classify a single assistant response as stuck or not.
pub fn is_stuck(text: &str) -> bool {
    let lower = text.to_lowercase();

    if STUCK_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    matches_exhausted_options(&lower) || matches_need_to_proceed(&lower) || matches_cannot_find_required(&lower)
}

/// The loop terminates when two consecutive assistant turns are *both*
/// classified as stuck — even if their literal text differs — or when they
/// are exactly equal (a degenerate case of "stuck" that needs no semantic
/// classification).
pub fn is_stuck_alternation(previous: &str, current: &str) -> bool {
    previous == current || (is_stuck(previous) && is_stuck(current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cannot_proceed_variants() {
        assert!(is_stuck("I cannot proceed without more information."));
        assert!(is_stuck("Sorry, I can't proceed with this task."));
        assert!(is_stuck("We appear to be in a loop here."));
        assert!(is_stuck("It seems we are in a deadlock."));
    }

    #[test]
    fn detects_exhausted_options() {
        assert!(is_stuck("I have exhausted all available options."));
        assert!(is_stuck("I've exhausted every method I can think of."));
        assert!(!is_stuck("The search exhausted the index quickly.")); // no options/methods mention
    }

    #[test]
    fn detects_need_x_to_proceed() {
        assert!(is_stuck("I need the API key to proceed."));
    }

    #[test]
    fn detects_cannot_find_required() {
        assert!(is_stuck("Cannot find the required configuration file."));
    }

    #[test]
    fn ordinary_response_is_not_stuck() {
        assert!(!is_stuck("Here is the function you asked about."));
        assert!(!is_stuck("<search><query>foo</query></search>"));
    }

    #[test]
    fn cannot_find_without_required_is_not_stuck() {
        assert!(!is_stuck("I cannot find any other callers; here is the definition."));
        assert!(!is_stuck("I can't find a simpler way to phrase this, but here's my answer."));
    }

    #[test]
    fn stuck_alternation_requires_both_turns_stuck() {
        let a = "We are in a loop. I cannot proceed without the ID.";
        let b = "It seems we are in a deadlock. I cannot proceed without the ID.";
        assert!(is_stuck_alternation(a, b));
    }

    #[test]
    fn exact_equality_is_treated_as_stuck() {
        assert!(is_stuck_alternation("same text", "same text"));
    }

    #[test]
    fn one_stuck_one_normal_is_not_alternation() {
        let a = "I cannot proceed without the ID.";
        let b = "Let me try another search.";
        assert!(!is_stuck_alternation(a, b));
    }
}
