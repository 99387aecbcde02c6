//! `listFiles`, `searchFiles`, and `readImage` — the three built-in tools
//! the spec groups under filesystem access (§4.3). All three resolve their
//! path parameter against a fixed set of allowed roots before touching the
//! disk; anything that escapes every root is a path-confinement error
//! rather than a tool error, so the model gets a clear remediation hint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ignore::WalkBuilder;

use probe_core::registry::{ToolDescriptor, ToolExecutor, ToolFlags, ToolOutput, ToolSourceKind};
use probe_core::parser::ToolParams;
use probe_core::ToolError;

/// Resolve `target` against `roots`, rejecting anything that canonicalizes
/// outside every one of them. Mirrors the behaviour the spec calls "path
/// confinement": relative paths are tried against each root in order,
/// absolute paths are checked for containment directly.
pub fn validate_path(roots: &[PathBuf], target: &Path) -> Result<PathBuf, ToolError> {
    if roots.is_empty() {
        return Err(ToolError::PathValidation(
            "no allowed folders configured".to_string(),
        ));
    }

    let candidates: Vec<PathBuf> = if target.is_absolute() {
        vec![target.to_path_buf()]
    } else {
        roots.iter().map(|r| r.join(target)).collect()
    };

    let mut last_err = None;
    for candidate in candidates {
        match check_within_any_root(&candidate, roots) {
            Ok(resolved) => return Ok(resolved),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        ToolError::PathValidation(format!("'{}' escapes every allowed folder", target.display()))
    }))
}

fn check_within_any_root(full_path: &Path, roots: &[PathBuf]) -> Result<PathBuf, ToolError> {
    let canonical_roots: Vec<PathBuf> = roots.iter().filter_map(|r| r.canonicalize().ok()).collect();

    if full_path.exists() {
        let canonical = full_path
            .canonicalize()
            .map_err(|e| ToolError::PathValidation(format!("failed to resolve '{}': {e}", full_path.display())))?;
        if canonical_roots.iter().any(|r| canonical.starts_with(r)) {
            return Ok(canonical);
        }
        return Err(ToolError::PathValidation(format!(
            "'{}' escapes the allowed folders",
            full_path.display()
        )));
    }

    // Non-existent path: walk up to the nearest existing ancestor and
    // validate that instead, so callers can still create new files/dirs.
    let mut probe = full_path.to_path_buf();
    loop {
        if probe.exists() {
            let canonical = probe
                .canonicalize()
                .map_err(|e| ToolError::PathValidation(format!("failed to resolve '{}': {e}", probe.display())))?;
            if canonical_roots.iter().any(|r| canonical.starts_with(r)) {
                return Ok(full_path.to_path_buf());
            }
            return Err(ToolError::PathValidation(format!(
                "'{}' escapes the allowed folders",
                full_path.display()
            )));
        }
        match probe.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => probe = parent.to_path_buf(),
            _ => {
                return Err(ToolError::PathValidation(format!(
                    "'{}' has no existing ancestor under the allowed folders",
                    full_path.display()
                )))
            }
        }
    }
}

/// `listFiles` and `searchFiles`, confined to `roots` (the session working
/// directory plus any `allow_folder` additions). `readImage` is registered
/// separately via [`read_image_descriptor`] since it is gated by its own
/// `image` cargo feature.
pub fn tool_descriptors(roots: Vec<PathBuf>) -> Vec<ToolDescriptor> {
    vec![list_files_descriptor(roots.clone()), search_files_descriptor(roots)]
}

// ============================================================================
// listFiles
// ============================================================================

struct ListFilesExecutor {
    roots: Vec<PathBuf>,
}

#[async_trait]
impl ToolExecutor for ListFilesExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let dir = params
            .get("directory")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let resolved = validate_path(&self.roots, &dir)?;

        if !resolved.is_dir() {
            return Err(ToolError::Custom(format!("'{}' is not a directory", dir.display())));
        }

        let mut entries = Vec::new();
        for result in WalkBuilder::new(&resolved).max_depth(Some(1)).hidden(false).build() {
            let entry = result.map_err(|e| ToolError::Custom(format!("directory walk failed: {e}")))?;
            if entry.path() == resolved {
                continue;
            }
            let kind = if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                "dir"
            } else {
                "file"
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(format!("{kind}\t{name}"));
        }
        entries.sort();

        Ok(ToolOutput::text(entries.join("\n")))
    }
}

fn list_files_descriptor(roots: Vec<PathBuf>) -> ToolDescriptor {
    ToolDescriptor {
        name: "listFiles".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "List the entries of a directory, respecting `.gitignore`.\n\n\
                           Parameters:\n\
                           - directory: (optional) path to list, relative to the working \
                           directory. Defaults to the working directory itself.\n\n\
                           Usage:\n<listFiles>\n<directory>src</directory>\n</listFiles>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(ListFilesExecutor { roots }),
        flags: ToolFlags { suspends: false, mutates_repo: false, produces_images: false },
        primary_param: None,
    }
}

// ============================================================================
// searchFiles
// ============================================================================

struct SearchFilesExecutor {
    roots: Vec<PathBuf>,
}

#[async_trait]
impl ToolExecutor for SearchFilesExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let pattern = params
            .get("pattern")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'pattern'".to_string()))?;
        let dir = params
            .get("directory")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let recursive = params.get_bool("recursive", true);
        let resolved = validate_path(&self.roots, &dir)?;

        let mut matches = Vec::new();
        let mut walker = WalkBuilder::new(&resolved);
        walker.hidden(false);
        if !recursive {
            walker.max_depth(Some(1));
        }
        for result in walker.build() {
            let entry = result.map_err(|e| ToolError::Custom(format!("directory walk failed: {e}")))?;
            if entry.path() == resolved {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if glob_matches(&pattern, &name) {
                matches.push(entry.path().display().to_string());
            }
        }
        matches.sort();

        if matches.is_empty() {
            Ok(ToolOutput::text("No files matched the given pattern."))
        } else {
            Ok(ToolOutput::text(matches.join("\n")))
        }
    }
}

/// Minimal glob matcher supporting `*` and `?` wildcards — the only forms
/// `searchFiles` patterns use (e.g. `*.rs`).
fn glob_matches(pattern: &str, name: &str) -> bool {
    glob::Pattern::new(pattern).map(|p| p.matches(name)).unwrap_or(false)
}

fn search_files_descriptor(roots: Vec<PathBuf>) -> ToolDescriptor {
    ToolDescriptor {
        name: "searchFiles".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Find files by name using a glob pattern (e.g. `*.rs`).\n\n\
                           Parameters:\n\
                           - pattern: (required) glob pattern to match file names against\n\
                           - directory: (optional) directory to search, defaults to the \
                           working directory\n\
                           - recursive: (optional) whether to descend into subdirectories, \
                           default true\n\n\
                           Usage:\n<searchFiles>\n<pattern>*.rs</pattern>\n</searchFiles>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(SearchFilesExecutor { roots }),
        flags: ToolFlags { suspends: false, mutates_repo: false, produces_images: false },
        primary_param: None,
    }
}

// ============================================================================
// readImage
// ============================================================================

struct ReadImageExecutor {
    roots: Vec<PathBuf>,
}

const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

#[async_trait]
impl ToolExecutor for ReadImageExecutor {
    async fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let path = params
            .get("path")
            .ok_or_else(|| ToolError::Custom("missing required parameter 'path'".to_string()))?;
        let resolved = validate_path(&self.roots, Path::new(&path))?;

        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| ToolError::Custom(format!("cannot read '{}': {e}", resolved.display())))?;
        if metadata.len() > MAX_IMAGE_BYTES {
            return Err(ToolError::Custom(format!(
                "'{}' is {} bytes, exceeding the {}-byte limit",
                resolved.display(),
                metadata.len(),
                MAX_IMAGE_BYTES
            )));
        }

        let bytes = tokio::fs::read(&resolved)
            .await
            .map_err(|e| ToolError::Custom(format!("failed to read '{}': {e}", resolved.display())))?;
        let kind = infer::get(&bytes)
            .filter(|k| matches!(k.mime_type(), "image/png" | "image/jpeg" | "image/gif" | "image/webp"))
            .ok_or_else(|| ToolError::Custom(format!("'{}' is not a supported image format", resolved.display())))?;

        // The dispatcher's generic image harvester re-scans this text for
        // path-like tokens and attaches the file to the *next* user turn —
        // see `registry::discover_image_paths` and `agent::tools::load_image`.
        Ok(ToolOutput::text(format!(
            "Loaded {} image: {}",
            kind.mime_type(),
            resolved.display()
        )))
    }
}

pub fn read_image_descriptor(roots: Vec<PathBuf>) -> ToolDescriptor {
    ToolDescriptor {
        name: "readImage".to_string(),
        source: ToolSourceKind::Native,
        xml_description: "Load an image file so you can see it. The image attaches to the \
                           next turn of the conversation.\n\n\
                           Parameters:\n\
                           - path: (required) path to the image file (png, jpeg, gif, or webp), \
                           at most 20 MB\n\n\
                           Usage:\n<readImage>\n<path>./screenshot.png</path>\n</readImage>"
            .to_string(),
        params_schema: None,
        executor: Arc::new(ReadImageExecutor { roots }),
        flags: ToolFlags { suspends: false, mutates_repo: false, produces_images: true },
        primary_param: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::parser::ToolParams;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn params(pairs: &[(&str, &str)]) -> ToolParams {
        ToolParams::Native(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn validate_path_rejects_escape() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![tmp.path().to_path_buf()];
        let err = validate_path(&roots, Path::new("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, ToolError::PathValidation(_)));
    }

    #[test]
    fn validate_path_allows_new_file_under_root() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![tmp.path().to_path_buf()];
        let resolved = validate_path(&roots, Path::new("new_file.txt")).unwrap();
        assert!(resolved.starts_with(tmp.path()));
    }

    #[tokio::test]
    async fn list_files_lists_top_level_entries() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "hi").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        let executor = ListFilesExecutor { roots: vec![tmp.path().to_path_buf()] };
        let output = executor.execute(&params(&[])).await.unwrap();
        let text = output.result.as_text();
        assert!(text.contains("a.txt"));
        assert!(text.contains("sub"));
    }

    #[tokio::test]
    async fn search_files_matches_glob() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("main.rs"), "").unwrap();
        std::fs::write(tmp.path().join("readme.md"), "").unwrap();

        let executor = SearchFilesExecutor { roots: vec![tmp.path().to_path_buf()] };
        let output = executor.execute(&params(&[("pattern", "*.rs")])).await.unwrap();
        let text = output.result.as_text();
        assert!(text.contains("main.rs"));
        assert!(!text.contains("readme.md"));
    }

    #[tokio::test]
    async fn read_image_rejects_oversized_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.png");
        std::fs::write(&path, vec![0u8; (MAX_IMAGE_BYTES + 1) as usize]).unwrap();

        let executor = ReadImageExecutor { roots: vec![tmp.path().to_path_buf()] };
        let err = executor.execute(&params(&[("path", "big.png")])).await.unwrap_err();
        assert!(matches!(err, ToolError::Custom(_)));
    }

    #[tokio::test]
    async fn read_image_rejects_non_image_bytes() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("fake.png"), b"not an image").unwrap();

        let executor = ReadImageExecutor { roots: vec![tmp.path().to_path_buf()] };
        let err = executor.execute(&params(&[("path", "fake.png")])).await.unwrap_err();
        assert!(matches!(err, ToolError::Custom(_)));
    }

    #[tokio::test]
    async fn read_image_accepts_png_and_mentions_path() {
        let tmp = TempDir::new().unwrap();
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        std::fs::write(tmp.path().join("real.png"), png_header).unwrap();

        let executor = ReadImageExecutor { roots: vec![tmp.path().to_path_buf()] };
        let output = executor.execute(&params(&[("path", "real.png")])).await.unwrap();
        assert!(output.result.as_text().contains("real.png"));
    }
}
