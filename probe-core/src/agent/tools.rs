//! Tool dispatch: resolve a parsed `ToolCall` against the registry, enforce
//! permissions, run the output governor, and harvest discovered images.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::governor;
use crate::parser::ToolCall;
use crate::registry::discover_image_paths;
use crate::tool::ImageFormat;

use super::Agent;

/// The rendered text (and any newly discovered images) to append as the
/// synthetic `<tool_result>` user turn.
pub(super) struct DispatchOutcome {
    pub text: String,
    pub images: Vec<(ImageFormat, String)>,
}

const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

impl Agent {
    /// Resolve and run one tool call. Every failure mode here (unknown
    /// tool, permission denial, execution error) is formatted as ordinary
    /// text rather than propagated as a `Result::Err` — per the error
    /// handling design, the model sees recoverable failures as a normal
    /// tool result, never as a terminating error.
    pub(super) async fn dispatch_tool_call(
        &self,
        call: &ToolCall,
        seen_images: &mut HashMap<PathBuf, ()>,
    ) -> DispatchOutcome {
        let name = call.name.as_str();

        if !self.allowed_tools.is_enabled(name) {
            log::info!("tool '{name}' denied: not in the session's allowed-tool set");
            return DispatchOutcome {
                text: format!("Error: tool '{name}' is not permitted for this session"),
                images: Vec::new(),
            };
        }

        let Some(descriptor) = self.registry.get(name) else {
            log::warn!("tool '{name}' requested but not registered");
            return DispatchOutcome {
                text: format!("Error: tool '{name}' does not exist"),
                images: Vec::new(),
            };
        };

        if name == "bash" {
            if let Some(command) = call.params.get("command") {
                let decision = self.bash_policy.check(&command);
                log::info!(
                    "bash permission: command={:?} allowed={} reason={}",
                    decision.command,
                    decision.allowed,
                    decision.reason
                );
                if !decision.allowed {
                    return DispatchOutcome {
                        text: format!(
                            "Error: command '{}' {}",
                            decision.command, decision.reason
                        ),
                        images: Vec::new(),
                    };
                }
            }
        }

        let raw_text = match descriptor.executor.execute(&call.params).await {
            Ok(output) => {
                for path in output.discovered_images {
                    seen_images.insert(path, ());
                }
                output.result.as_text()
            }
            Err(e) => format!("Error: {e}"),
        };

        let unique = uuid::Uuid::new_v4().to_string();
        let governed = governor::govern(
            &raw_text,
            Some(self.max_tool_output_tokens),
            &std::env::temp_dir(),
            &self.session_id,
            &unique,
        );
        if governed.truncated {
            log::info!(
                "governor truncated tool '{name}' output, spill={:?}",
                governed.spill_path
            );
        }

        let mut images = Vec::new();
        if descriptor.flags.produces_images {
            for path in discover_image_paths(&governed.text, seen_images) {
                if let Some(block) = load_image(&path) {
                    seen_images.insert(path, ());
                    images.push(block);
                }
            }
        }

        DispatchOutcome {
            text: governed.text,
            images,
        }
    }
}

fn load_image(path: &Path) -> Option<(ImageFormat, String)> {
    let metadata = std::fs::metadata(path).ok()?;
    if metadata.len() > MAX_IMAGE_BYTES {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    let format = sniff_image_format(&bytes)?;
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Some((format, data))
}

fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    let kind = infer::get(bytes)?;
    match kind.mime_type() {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::Webp),
        _ => None,
    }
}
