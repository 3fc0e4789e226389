//! File read tool with offset/limit windowing.

use async_trait::async_trait;
use loopsmith_core::error::ToolError;
use loopsmith_core::tool::Tool;

use crate::sandbox::WorkspaceSandbox;

/// Lines returned per call unless the caller narrows the window.
const DEFAULT_LINE_LIMIT: usize = 2000;

pub struct FileReadTool {
    sandbox: WorkspaceSandbox,
}

impl FileReadTool {
    pub fn new(sandbox: WorkspaceSandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file from the workspace. Supports an optional line offset and limit for large files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace root"
                },
                "offset": {
                    "type": "integer",
                    "description": "1-based line number to start reading from"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let offset = arguments["offset"].as_u64().unwrap_or(1).max(1) as usize;
        let limit = arguments["limit"].as_u64().unwrap_or(DEFAULT_LINE_LIMIT as u64) as usize;

        let resolved = self.sandbox.resolve(path)?;
        let content =
            tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "read_file".into(),
                    reason: format!("cannot read {path}: {e}"),
                })?;

        let total_lines = content.lines().count();
        let window: Vec<&str> = content
            .lines()
            .skip(offset - 1)
            .take(limit)
            .collect();

        if window.is_empty() && total_lines > 0 {
            return Ok(format!(
                "(file has {total_lines} lines; offset {offset} is past the end)"
            ));
        }

        let mut out = window.join("\n");
        let shown_through = offset - 1 + window.len();
        if shown_through < total_lines {
            out.push_str(&format!(
                "\n(showing lines {offset}-{shown_through} of {total_lines})"
            ));
        }
        Ok(out)
    }
}
