//! Persona preambles prepended to the system message.
//!
//! `AgentSession` carries a persona identifier drawn from a small fixed set;
//! this module is the lookup table from identifier to preamble text.

/// One of the fixed personas an `AgentSession` may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    /// Default code-search assistant voice.
    #[default]
    CodeSearch,
    /// Used internally for self-repair sub-agents (see [`super::repair`]).
    JsonRepairSpecialist,
    /// Used internally for Mermaid-diagram repair sub-agents.
    MermaidRepairSpecialist,
}

impl Persona {
    pub fn preamble(&self) -> &'static str {
        match self {
            Persona::CodeSearch => {
                "You are a code-search assistant. You answer questions about a \
                 repository by invoking the tools described below, one at a time, \
                 and reasoning over their output. Call `attempt_completion` exactly \
                 once you have a final answer; do not call it speculatively."
            }
            Persona::JsonRepairSpecialist => {
                "You are a JSON syntax correction specialist. You will be given text \
                 that was supposed to be valid JSON matching a schema, along with the \
                 validation errors. Return only the corrected JSON via \
                 `attempt_completion`. Do not explain your reasoning, do not call any \
                 other tool."
            }
            Persona::MermaidRepairSpecialist => {
                "You are a Mermaid diagram correction specialist. You will be given \
                 Mermaid source that failed to parse, along with the error. Return \
                 only the corrected Mermaid source via `attempt_completion`. Do not \
                 explain your reasoning, do not call any other tool."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_persona_has_a_nonempty_preamble() {
        for persona in [
            Persona::CodeSearch,
            Persona::JsonRepairSpecialist,
            Persona::MermaidRepairSpecialist,
        ] {
            assert!(!persona.preamble().is_empty());
        }
    }
}
