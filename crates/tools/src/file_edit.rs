//! File edit tool. Exact-string replacement within a workspace file.

use async_trait::async_trait;
use loopsmith_core::error::ToolError;
use loopsmith_core::tool::Tool;

use crate::sandbox::WorkspaceSandbox;

pub struct FileEditTool {
    sandbox: WorkspaceSandbox,
}

impl FileEditTool {
    pub fn new(sandbox: WorkspaceSandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for FileEditTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Replace an exact text snippet in a workspace file. The old text must match exactly; \
         set replace_all to change every occurrence."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace root"
                },
                "old_text": {
                    "type": "string",
                    "description": "Exact text to find"
                },
                "new_text": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence instead of requiring a unique match"
                }
            },
            "required": ["path", "old_text", "new_text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let old_text = arguments["old_text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'old_text' argument".into()))?;
        let new_text = arguments["new_text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'new_text' argument".into()))?;
        let replace_all = arguments["replace_all"].as_bool().unwrap_or(false);

        if old_text.is_empty() {
            return Err(ToolError::InvalidArguments(
                "'old_text' must not be empty".into(),
            ));
        }

        let resolved = self.sandbox.resolve(path)?;
        let content =
            tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "edit_file".into(),
                    reason: format!("cannot read {path}: {e}"),
                })?;

        let occurrences = content.matches(old_text).count();
        if occurrences == 0 {
            return Err(ToolError::ExecutionFailed {
                tool_name: "edit_file".into(),
                reason: format!("old_text not found in {path}"),
            });
        }
        if occurrences > 1 && !replace_all {
            return Err(ToolError::ExecutionFailed {
                tool_name: "edit_file".into(),
                reason: format!(
                    "old_text matches {occurrences} places in {path}; provide more context or set replace_all"
                ),
            });
        }

        let updated = if replace_all {
            content.replace(old_text, new_text)
        } else {
            content.replacen(old_text, new_text, 1)
        };

        tokio::fs::write(&resolved, &updated)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "edit_file".into(),
                reason: format!("cannot write {path}: {e}"),
            })?;

        let replaced = if replace_all { occurrences } else { 1 };
        Ok(format!("Replaced {replaced} occurrence(s) in {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(dir: &std::path::Path) -> FileEditTool {
        FileEditTool::new(WorkspaceSandbox::new(dir))
    }

    #[tokio::test]
    async fn replaces_unique_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "let x = 1;").unwrap();

        tool(dir.path())
            .execute(serde_json::json!({
                "path": "f.txt", "old_text": "x = 1", "new_text": "x = 2"
            }))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "let x = 2;"
        );
    }

    #[tokio::test]
    async fn ambiguous_match_requires_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "aaa aaa").unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({
                "path": "f.txt", "old_text": "aaa", "new_text": "bbb"
            }))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));

        let out = tool(dir.path())
            .execute(serde_json::json!({
                "path": "f.txt", "old_text": "aaa", "new_text": "bbb", "replace_all": true
            }))
            .await
            .unwrap();
        assert!(out.contains("Replaced 2"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "bbb bbb"
        );
    }

    #[tokio::test]
    async fn missing_old_text_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "content").unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({
                "path": "f.txt", "old_text": "absent", "new_text": "x"
            }))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }
}
