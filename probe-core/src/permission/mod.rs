//! Permission system for tool execution.
//!
//! Two layers make up tool permissioning:
//!
//! - [`crate::registry::AllowedToolSet`] decides, per tool name, whether a
//!   tool is enabled at all (glob include/exclude patterns).
//! - [`bash`] additionally gates the `bash` tool's command strings against
//!   an allow/deny pattern policy, including component-wise evaluation of
//!   pipelines.
//!
//! There is no interactive human-in-the-loop approval step in this design —
//! every decision is made structurally, ahead of dispatch, against the
//! session's configured policy.

pub mod bash;

pub use bash::{BashCommand, BashPermissionPolicy, Decision as BashDecision, Pattern};
