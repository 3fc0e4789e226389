//! Directory listing tool. Dotfiles are skipped.

use async_trait::async_trait;
use loopsmith_core::error::ToolError;
use loopsmith_core::tool::Tool;
use std::path::{Path, PathBuf};

use crate::sandbox::WorkspaceSandbox;

/// Hard cap so a recursive listing of a huge tree can't flood history.
const MAX_ENTRIES: usize = 500;

pub struct ListDirTool {
    sandbox: WorkspaceSandbox,
}

impl ListDirTool {
    pub fn new(sandbox: WorkspaceSandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories in the workspace. Set recursive to walk subdirectories."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace root (default: the root)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Walk subdirectories"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = arguments["path"].as_str().unwrap_or(".");
        let recursive = arguments["recursive"].as_bool().unwrap_or(false);

        let resolved = self.sandbox.resolve(path)?;
        if !resolved.is_dir() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "list_dir".into(),
                reason: format!("{path} is not a directory"),
            });
        }

        let mut entries = Vec::new();
        collect_entries(&resolved, &resolved, recursive, &mut entries).map_err(|e| {
            ToolError::ExecutionFailed {
                tool_name: "list_dir".into(),
                reason: e.to_string(),
            }
        })?;
        entries.sort();

        if entries.is_empty() {
            return Ok("(empty directory)".into());
        }

        let truncated = entries.len() > MAX_ENTRIES;
        entries.truncate(MAX_ENTRIES);
        let mut out = entries.join("\n");
        if truncated {
            out.push_str(&format!("\n(listing capped at {MAX_ENTRIES} entries)"));
        }
        Ok(out)
    }
}

/// Depth-first walk relative to `base`, skipping dotfiles.
fn collect_entries(
    base: &Path,
    dir: &Path,
    recursive: bool,
    out: &mut Vec<String>,
) -> std::io::Result<()> {
    let mut subdirs: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let display = path
            .strip_prefix(base)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();
        if path.is_dir() {
            out.push(format!("{display}/"));
            if recursive {
                subdirs.push(path);
            }
        } else {
            out.push(display);
        }
    }
    for subdir in subdirs {
        if out.len() > MAX_ENTRIES {
            break;
        }
        collect_entries(base, &subdir, recursive, out)?;
    }
    Ok(())
}
