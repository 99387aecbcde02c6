//! The agent loop: drive the model, parse its reply for a tool call,
//! dispatch and govern the result, compact history under context pressure,
//! and finalize once `attempt_completion` is reached (or implied).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use crate::compaction::{self, CompactionOptions};
use crate::events::AgentEvent;
use crate::governor;
use crate::parser;
use crate::tool::ImageFormat;
use crate::types::Message;

use super::types::{AgentError, AgentResponse, TokenUsageStats, ToolCallInfo};
use super::Agent;

/// Fraction of the model's context window reserved as headroom before
/// proactive compaction runs.
const COMPACTION_RESERVE_FRACTION: f64 = 0.25;

impl Agent {
    /// Drive one `answer(question) -> string` operation to completion.
    pub async fn run(&self, input: impl Into<String>) -> Result<AgentResponse, AgentError> {
        self.run_with_images(input, Vec::new()).await
    }

    /// As [`Agent::run`], but attaches image parts to the initial user turn.
    pub async fn run_with_images(
        &self,
        input: impl Into<String>,
        images: Vec<(ImageFormat, String)>,
    ) -> Result<AgentResponse, AgentError> {
        let input = input.into();
        let start = Instant::now();
        self.emit_event(AgentEvent::RunStarted {
            input: input.clone(),
            timestamp: start,
        });

        let outcome = self.run_inner(input, images, start).await;

        #[cfg(feature = "session")]
        if outcome.is_ok() {
            if let Err(e) = self.save_session_history().await {
                log::warn!("failed to save session history: {e}");
            }
        }

        match &outcome {
            Ok(response) => self.emit_event(AgentEvent::RunCompleted {
                output: response.text.clone(),
                duration: start.elapsed(),
            }),
            Err(e) => self.emit_event(AgentEvent::RunFailed {
                error: e.to_string(),
                duration: start.elapsed(),
            }),
        }

        outcome
    }

    async fn run_inner(
        &self,
        input: String,
        images: Vec<(ImageFormat, String)>,
        start: Instant,
    ) -> Result<AgentResponse, AgentError> {
        #[cfg(feature = "session")]
        self.load_session_history().await?;

        let mut history = self.history.write().await;

        if history.is_empty() {
            history.push(Message::system(self.build_system_message()));
        }
        history.push(if images.is_empty() {
            Message::user(input)
        } else {
            Message::user_with_images(input, images)
        });

        let mut tool_calls: Vec<ToolCallInfo> = Vec::new();
        let mut total_usage = TokenUsageStats::default();
        let mut model_calls = 0usize;
        let mut previous_assistant_text: Option<String> = None;
        let mut seen_images: HashMap<PathBuf, ()> = HashMap::new();

        for _ in 0..self.max_iterations {
            let known_tags = self.registry.enabled_tags(&self.allowed_tools);

            // System message (index 0) is carried separately from the
            // message list, since providers take it out-of-band.
            let system_prompt = Some(history[0].text());
            let messages_for_model: Vec<Message> = history[1..].to_vec();

            self.emit_event(AgentEvent::ModelCallStarted {
                message_count: history.len(),
                tool_count: known_tags.len(),
                timestamp: Instant::now(),
            });

            let call_start = Instant::now();
            let response = self
                .provider
                .generate(messages_for_model, system_prompt)
                .await
                .map_err(AgentError::Provider)?;
            model_calls += 1;

            if let Some(usage) = &response.usage {
                total_usage.input_tokens += usage.input_tokens;
                total_usage.output_tokens += usage.output_tokens;
            }

            let assistant_text = response.message.text();
            self.emit_event(AgentEvent::ModelCallCompleted {
                response_content: assistant_text.clone(),
                tokens: response.usage,
                duration: call_start.elapsed(),
            });

            if assistant_text.trim().is_empty() {
                return Err(AgentError::NoResponse);
            }

            // 3b. Stuck-loop check: the prior and current turn both read as
            // a semantic admission of inability to proceed.
            if let Some(previous) = &previous_assistant_text {
                if crate::stuck::is_stuck_alternation(previous, &assistant_text) {
                    return Err(AgentError::StuckLoop(assistant_text));
                }
            }
            previous_assistant_text = Some(assistant_text.clone());

            // 3c. Append the assistant turn.
            history.push(Message::assistant(assistant_text.clone()));

            // 3d. Context pressure check.
            let estimated: usize = history.iter().map(|m| governor::estimate_tokens(&m.text())).sum();
            if compaction::should_compact(
                estimated,
                self.provider.max_context_tokens(),
                COMPACTION_RESERVE_FRACTION,
            ) {
                let (compacted, stats) = compaction::compact(&history, CompactionOptions::default());
                log::info!(
                    "compacted history: {} -> {} messages ({}% reduction)",
                    stats.original_count,
                    stats.compacted_count,
                    stats.reduction_percent
                );
                *history = compacted;
            }

            // 3e. Parse.
            let (stripped, _thinking) = parser::strip_thinking(&assistant_text);
            let call = match parser::parse(&stripped, &known_tags) {
                Ok(Some(call)) => call,
                Ok(None) => {
                    // A plain-prose reply that reads as an admission the
                    // model cannot proceed is not treated as a final answer:
                    // returning it here would make it the *only* stuck turn
                    // ever evaluated, since the alternation check at 3b
                    // compares a turn against the one before it. Prompt for
                    // another attempt instead, so a second consecutive stuck
                    // turn can trip the alternation check on the next pass.
                    if crate::stuck::is_stuck(&assistant_text) {
                        history.push(Message::user(
                            "<tool_result tool=\"loop\">No tool call was found, and this reads \
                             as an admission that you cannot proceed. If you are genuinely stuck, \
                             state precisely what information or access is missing; otherwise keep \
                             using the available tools toward a concrete answer.</tool_result>"
                                .to_string(),
                        ));
                        continue;
                    }

                    // No parseable tool call: the whole reply is the answer.
                    let cleaned = self.validate_and_repair(&assistant_text).await?;
                    return Ok(AgentResponse {
                        text: cleaned,
                        tool_calls,
                        token_usage: Some(total_usage),
                        duration: start.elapsed(),
                        model_calls,
                    });
                }
                Err(parse_err) => {
                    history.push(Message::user(format!(
                        "<tool_result tool=\"parser\">Error: {parse_err}. \
                         Re-emit a single, well-formed tool call.</tool_result>"
                    )));
                    continue;
                }
            };

            // 3f. Terminal tool reached.
            if call.name == "attempt_completion" {
                let raw_result = call.params.get("result").unwrap_or_default();
                let cleaned = self.validate_and_repair(&raw_result).await?;
                return Ok(AgentResponse {
                    text: cleaned,
                    tool_calls,
                    token_usage: Some(total_usage),
                    duration: start.elapsed(),
                    model_calls,
                });
            }

            // 3g-j. Dispatch, govern, harvest images, append the synthetic
            // tool-result turn.
            let tool_use_id = uuid::Uuid::new_v4().to_string();
            self.emit_event(AgentEvent::ToolRequested {
                tool_use_id: tool_use_id.clone(),
                call: call.clone(),
            });

            let call_input = call.params.as_json();
            self.emit_event(AgentEvent::ToolExecuting {
                tool_use_id: tool_use_id.clone(),
                name: call.name.clone(),
            });

            let dispatch_start = Instant::now();
            let outcome = self.dispatch_tool_call(&call, &mut seen_images).await;
            let dispatch_duration = dispatch_start.elapsed();

            let denied = (outcome.text.starts_with("Error: tool '") && outcome.text.contains("permitted"))
                || outcome.text.starts_with("Error: command '");
            let failed = outcome.text.starts_with("Error:");

            if denied {
                self.emit_event(AgentEvent::PermissionDenied {
                    tool_use_id: tool_use_id.clone(),
                    tool_name: call.name.clone(),
                    reason: outcome.text.clone(),
                });
            } else if failed {
                self.emit_event(AgentEvent::ToolFailed {
                    tool_use_id: tool_use_id.clone(),
                    name: call.name.clone(),
                    error: outcome.text.clone(),
                    duration: dispatch_duration,
                });
            } else {
                self.emit_event(AgentEvent::ToolCompleted {
                    tool_use_id: tool_use_id.clone(),
                    name: call.name.clone(),
                    output: crate::tool::ToolResult::Text(outcome.text.clone()),
                    duration: dispatch_duration,
                });
            }

            tool_calls.push(ToolCallInfo {
                name: call.name.clone(),
                input: call_input,
                output: outcome.text.clone(),
                success: !failed,
                duration: dispatch_duration,
            });

            let tool_result_turn = format!(
                "<tool_result tool=\"{}\">{}</tool_result>",
                call.name, outcome.text
            );
            history.push(if outcome.images.is_empty() {
                Message::user(tool_result_turn)
            } else {
                Message::user_with_images(tool_result_turn, outcome.images)
            });
        }

        Err(AgentError::IterationLimitExceeded(self.max_iterations))
    }

    /// The system message assembled once, at the start of the first `run`
    /// call: persona preamble, tool descriptions, schema instructions, and
    /// the working-directory/allowed-folders notice.
    fn build_system_message(&self) -> String {
        let mut sections = vec![self.persona.preamble().to_string()];

        if let Some(extra) = &self.system_prompt {
            sections.push(extra.clone());
        }

        sections.push(self.registry.render_system_prompt_section(&self.allowed_tools));

        if let Some((schema, _)) = &self.schema {
            sections.push(format!(
                "## Output Schema\n\nYour final `attempt_completion` result must be JSON matching \
                 this schema:\n\n{}",
                serde_json::to_string_pretty(schema).unwrap_or_default()
            ));
        }

        sections.push(format!(
            "## Working Directory\n\n{}\n\nAllowed folders: {}",
            self.working_directory.display(),
            if self.allowed_folders.is_empty() {
                self.working_directory.display().to_string()
            } else {
                self.allowed_folders
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        ));

        sections.join("\n\n")
    }
}
