//! Built-in tool implementations for the probe agent core (spec §4.3):
//! `search`/`query`/`extract` (the `CodeSearch` capability, over an
//! external binary), `listFiles`/`searchFiles`/`readImage` (confined to a
//! set of allowed folders), `bash`, and the `implement` edit delegate.
//!
//! `attempt_completion` is not here — it is registered automatically by
//! `probe_core::Agent::builder()` since the loop intercepts it by name
//! before dispatch ever reaches a registry lookup.

pub mod bash;
pub mod codesearch;
mod exec;
pub mod filesystem;
pub mod implement;

use std::path::PathBuf;

use probe_core::registry::ToolDescriptor;

/// Build the full built-in tool set for a session rooted at
/// `working_dir`, with `allowed_folders` granting access to additional
/// directories outside it. Each tool group can be dropped at compile time
/// via the matching cargo feature (`filesystem`, `search`, `bash`, `image`);
/// all are on by default.
pub fn builtin_tools(working_dir: PathBuf, allowed_folders: &[PathBuf]) -> Vec<ToolDescriptor> {
    let mut roots = vec![working_dir.clone()];
    roots.extend(allowed_folders.iter().cloned());

    let mut tools = Vec::new();

    #[cfg(feature = "filesystem")]
    tools.extend(filesystem::tool_descriptors(roots.clone()));

    #[cfg(feature = "image")]
    tools.push(filesystem::read_image_descriptor(roots));

    #[cfg(feature = "search")]
    tools.extend(codesearch::tool_descriptors(
        codesearch::CodeSearchBinary::default(),
        working_dir.clone(),
    ));

    #[cfg(feature = "bash")]
    tools.push(bash::tool_descriptor(working_dir.clone()));

    tools.push(implement::tool_descriptor(working_dir));

    tools
}
