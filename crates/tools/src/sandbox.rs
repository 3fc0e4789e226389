//! Workspace path sandbox.
//!
//! Every file-facing tool resolves paths through a shared
//! [`WorkspaceSandbox`]. Relative paths are anchored at the workspace
//! root; absolute paths are allowed only when they stay inside it.
//! Resolution is lexical (`..` components are collapsed without touching
//! the filesystem), so a path is rejected before any I/O happens.

use loopsmith_core::error::ToolError;
use std::path::{Component, Path, PathBuf};

/// Path prefixes that are never accessible, even if the workspace root
/// were placed under one of them by mistake.
const FORBIDDEN_PREFIXES: &[&str] = &["/etc", "/root", "/home", "/proc", "/sys", "/dev", "/boot"];

/// Confines tool file access to a single root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceSandbox {
    root: PathBuf,
}

impl WorkspaceSandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path to an absolute path inside the
    /// workspace, or reject it.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, ToolError> {
        let requested_path = Path::new(requested);

        for prefix in FORBIDDEN_PREFIXES {
            if requested_path.starts_with(prefix) {
                return Err(ToolError::SandboxViolation(format!(
                    "access to {prefix} is not allowed"
                )));
            }
        }

        let joined = if requested_path.is_absolute() {
            requested_path.to_path_buf()
        } else {
            self.root.join(requested_path)
        };

        let normalized = normalize(&joined);
        let root_normalized = normalize(&self.root);

        if !normalized.starts_with(&root_normalized) {
            return Err(ToolError::SandboxViolation(format!(
                "path '{requested}' escapes the workspace"
            )));
        }
        Ok(normalized)
    }
}

/// Collapse `.` and `..` components without hitting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
