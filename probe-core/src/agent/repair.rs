//! Bounded schema self-repair: when `attempt_completion`'s payload fails
//! validation against the session's schema, a freshly constructed, isolated
//! sub-agent is given the invalid text and the validation errors and asked
//! to return corrected JSON via its own `attempt_completion`. The sub-agent
//! has no tool access beyond `attempt_completion` itself, cannot recurse
//! into repair again, and gets its own session id.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock as AsyncRwLock;

use crate::registry::{AllowedToolSet, ToolDescriptor, ToolExecutor, ToolOutput, ToolRegistry, ToolSourceKind};
use crate::schema::{self, SchemaError};
use crate::tool::ToolError;

use super::{Agent, Persona};

/// Total attempts allowed, including the original (unrepaired) one.
const MAX_REPAIR_ATTEMPTS: u32 = 3;

/// `attempt_completion`'s executor is never actually invoked: the loop
/// intercepts the tool call by name before dispatch. This is a placeholder
/// so the tool still has a descriptor to render in the system prompt and to
/// register in the parser's known-tag list.
struct NeverExecuted;

#[async_trait]
impl ToolExecutor for NeverExecuted {
    async fn execute(&self, _params: &crate::parser::ToolParams) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Custom(
            "attempt_completion is handled by the loop and should never be dispatched".to_string(),
        ))
    }
}

/// The descriptor every `Agent` registers for its terminal tool.
pub(super) fn attempt_completion_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "attempt_completion".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Present the final result of the task. Call this exactly once, \
                           after every other tool call has returned and you are confident \
                           the task is complete.\n\n\
                           Parameters:\n\
                           - result: (required) The final answer, written directly inside \
                           the tag (no nested `<result>` element required).\n\n\
                           Usage:\n<attempt_completion>\nYour final answer here\n</attempt_completion>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(NeverExecuted),
        flags: Default::default(),
        primary_param: Some("result".to_string()),
    }
}

impl Agent {
    /// Validate `raw_result` (the un-cleaned body of `attempt_completion`)
    /// against the session's schema, dispatching the bounded repair loop on
    /// failure. Returns the cleaned, validated JSON text to use as the final
    /// response. If no schema was configured, returns the cleaned text
    /// without attempting to parse it as JSON.
    pub(super) async fn validate_and_repair(&self, raw_result: &str) -> Result<String, SchemaError> {
        let Some((schema, strict)) = &self.schema else {
            return Ok(schema::clean_response(raw_result));
        };

        if self.disable_json_validation {
            return Ok(schema::clean_response(raw_result));
        }

        let mut candidate = schema::clean_response(raw_result);
        let mut last_err = match schema::validate(&candidate, schema, *strict) {
            Ok(_) => return Ok(candidate),
            Err(e) => e,
        };

        for attempt in 1..MAX_REPAIR_ATTEMPTS {
            log::warn!(
                "attempt_completion payload failed schema validation (attempt {attempt}/{MAX_REPAIR_ATTEMPTS}): {last_err}"
            );
            let prompt = format!(
                "The following text was supposed to be JSON matching a schema but failed \
                 validation.\n\nSchema:\n{}\n\nText:\n{}\n\nValidation errors:\n{}\n\n\
                 Return only the corrected JSON.",
                serde_json::to_string_pretty(schema).unwrap_or_default(),
                candidate,
                last_err,
            );

            let repaired = self.spawn_repair_agent(Persona::JsonRepairSpecialist).run(&prompt).await;
            let repaired_text = match repaired {
                Ok(response) => response.text,
                Err(e) => {
                    log::warn!("repair sub-agent failed: {e}");
                    return Err(last_err);
                }
            };

            candidate = schema::clean_response(&repaired_text);
            match schema::validate(&candidate, schema, *strict) {
                Ok(_) => return Ok(candidate),
                Err(e) => last_err = e,
            }
        }

        Err(last_err)
    }

    /// Validate Mermaid diagram source extracted from a response, repairing
    /// it through an isolated sub-agent on parse failure. `parse` is the
    /// caller's own Mermaid syntax check (kept outside this module since
    /// `probe-core` has no Mermaid grammar of its own).
    pub(super) async fn validate_and_repair_mermaid(
        &self,
        source: &str,
        parse: impl Fn(&str) -> Result<(), String>,
    ) -> Result<String, String> {
        if self.disable_mermaid_validation {
            return Ok(source.to_string());
        }

        let mut candidate = source.to_string();
        let mut last_err = match parse(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) => e,
        };

        for attempt in 1..MAX_REPAIR_ATTEMPTS {
            log::warn!("mermaid source failed to parse (attempt {attempt}/{MAX_REPAIR_ATTEMPTS}): {last_err}");
            let prompt = format!(
                "The following Mermaid diagram source failed to parse.\n\nSource:\n{candidate}\n\n\
                 Error:\n{last_err}\n\nReturn only the corrected Mermaid source.",
            );

            let repaired = self
                .spawn_repair_agent(Persona::MermaidRepairSpecialist)
                .run(&prompt)
                .await;
            let repaired_text = match repaired {
                Ok(response) => response.text,
                Err(e) => {
                    log::warn!("repair sub-agent failed: {e}");
                    return Err(last_err);
                }
            };

            candidate = repaired_text;
            match parse(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) => last_err = e,
            }
        }

        Err(last_err)
    }

    /// Build a fresh, isolated `Agent` for the self-repair sub-loop: its own
    /// session id, no schema (so it can't recurse into repair itself), no
    /// tool access beyond `attempt_completion`, and a specialised persona.
    fn spawn_repair_agent(&self, persona: Persona) -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(attempt_completion_descriptor());

        Agent {
            provider: Arc::clone(&self.provider),
            registry,
            allowed_tools: AllowedToolSet::whitelist(vec!["attempt_completion".to_string()]),
            bash_policy: self.bash_policy.clone(),
            system_prompt: None,
            persona,
            max_iterations: 3,
            max_tool_output_tokens: self.max_tool_output_tokens,
            working_directory: self.working_directory.clone(),
            allowed_folders: self.allowed_folders.clone(),
            schema: None,
            disable_json_validation: true,
            disable_mermaid_validation: true,
            session_id: format!("{}-repair-{}", self.session_id, uuid::Uuid::new_v4()),
            history: AsyncRwLock::new(Vec::new()),
            hooks: parking_lot::RwLock::new(Vec::new()),
            next_hook_id: AtomicU64::new(0),
            #[cfg(feature = "mcp")]
            mcp_clients: Vec::new(),
            #[cfg(feature = "session")]
            session_store: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockProvider;
    use serde_json::json;

    fn valid_schema() -> Value {
        json!({
            "type": "object",
            "properties": { "answer": { "type": "string" } },
            "required": ["answer"]
        })
    }

    #[tokio::test]
    async fn passes_through_when_already_valid() {
        let provider = MockProvider::new();
        let agent = Agent::builder()
            .provider(provider)
            .with_schema(valid_schema(), true)
            .build()
            .await
            .unwrap();

        let cleaned = agent
            .validate_and_repair(r#"{"answer": "42"}"#)
            .await
            .unwrap();
        assert_eq!(cleaned, r#"{"answer": "42"}"#);
    }

    #[tokio::test]
    async fn repairs_invalid_json_via_sub_agent() {
        let provider = MockProvider::new()
            .with_text("<attempt_completion>{\"answer\": \"42\"}</attempt_completion>");
        let agent = Agent::builder()
            .provider(provider)
            .with_schema(valid_schema(), true)
            .build()
            .await
            .unwrap();

        let repaired = agent.validate_and_repair("not json at all").await.unwrap();
        assert_eq!(repaired, r#"{"answer": "42"}"#);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let provider = MockProvider::new().with_text("<attempt_completion>still not json</attempt_completion>");
        let agent = Agent::builder()
            .provider(provider)
            .with_schema(valid_schema(), true)
            .build()
            .await
            .unwrap();

        let err = agent.validate_and_repair("not json at all").await.unwrap_err();
        assert!(matches!(err, SchemaError::InvalidJson(_)));
    }

    #[test]
    fn attempt_completion_descriptor_has_primary_param() {
        let descriptor = attempt_completion_descriptor();
        assert_eq!(descriptor.primary_param.as_deref(), Some("result"));
    }
}
