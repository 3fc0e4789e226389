//! Regex search tool over workspace files.

use async_trait::async_trait;
use loopsmith_core::error::ToolError;
use loopsmith_core::tool::Tool;
use regex_lite::RegexBuilder;
use std::path::Path;

use crate::sandbox::WorkspaceSandbox;

const DEFAULT_MAX_RESULTS: usize = 50;

pub struct GrepSearchTool {
    sandbox: WorkspaceSandbox,
}

impl GrepSearchTool {
    pub fn new(sandbox: WorkspaceSandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for GrepSearchTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search workspace files for a regex pattern. Returns matching lines as path:line:text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search (default: the workspace root)"
                },
                "file_suffix": {
                    "type": "string",
                    "description": "Only search files ending with this suffix, e.g. '.rs'"
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Ignore case when matching"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum matching lines to return (default 50)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let pattern = arguments["pattern"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'pattern' argument".into()))?;
        let path = arguments["path"].as_str().unwrap_or(".");
        let file_suffix = arguments["file_suffix"].as_str();
        let case_insensitive = arguments["case_insensitive"].as_bool().unwrap_or(false);
        let max_results = arguments["max_results"]
            .as_u64()
            .unwrap_or(DEFAULT_MAX_RESULTS as u64) as usize;

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| ToolError::InvalidArguments(format!("invalid pattern: {e}")))?;

        let resolved = self.sandbox.resolve(path)?;
        let mut matches = Vec::new();
        search_path(&resolved, &resolved, &regex, file_suffix, max_results, &mut matches)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "grep".into(),
                reason: e.to_string(),
            })?;

        if matches.is_empty() {
            return Ok("(no matches)".into());
        }
        Ok(matches.join("\n"))
    }
}

fn search_path(
    base: &Path,
    path: &Path,
    regex: &regex_lite::Regex,
    file_suffix: Option<&str>,
    max_results: usize,
    out: &mut Vec<String>,
) -> std::io::Result<()> {
    if out.len() >= max_results {
        return Ok(());
    }
    if path.is_dir() {
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                !p.file_name()
                    .map(|n| n.to_string_lossy().starts_with('.'))
                    .unwrap_or(false)
            })
            .collect();
        entries.sort();
        for entry in entries {
            search_path(base, &entry, regex, file_suffix, max_results, out)?;
        }
        return Ok(());
    }

    if let Some(suffix) = file_suffix {
        if !path.to_string_lossy().ends_with(suffix) {
            return Ok(());
        }
    }

    // Binary or unreadable files are silently skipped
    let Ok(content) = std::fs::read_to_string(path) else {
        return Ok(());
    };
    let display = path.strip_prefix(base).unwrap_or(path).to_string_lossy();
    for (line_no, line) in content.lines().enumerate() {
        if out.len() >= max_results {
            break;
        }
        if regex.is_match(line) {
            out.push(format!("{display}:{}:{line}", line_no + 1));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(dir: &std::path::Path) -> GrepSearchTool {
        GrepSearchTool::new(WorkspaceSandbox::new(dir))
    }

    #[tokio::test]
    async fn finds_matching_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn main() {}\nlet x = 1;").unwrap();
        std::fs::write(dir.path().join("b.txt"), "nothing here").unwrap();

        let out = tool(dir.path())
            .execute(serde_json::json!({"pattern": "fn \\w+"}))
            .await
            .unwrap();
        assert_eq!(out, "a.rs:1:fn main() {}");
    }

    #[tokio::test]
    async fn suffix_filter_narrows_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "needle").unwrap();
        std::fs::write(dir.path().join("b.txt"), "needle").unwrap();

        let out = tool(dir.path())
            .execute(serde_json::json!({"pattern": "needle", "file_suffix": ".rs"}))
            .await
            .unwrap();
        assert!(out.contains("a.rs"));
        assert!(!out.contains("b.txt"));
    }

    #[tokio::test]
    async fn case_insensitive_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "HELLO world").unwrap();

        let miss = tool(dir.path())
            .execute(serde_json::json!({"pattern": "hello"}))
            .await
            .unwrap();
        assert_eq!(miss, "(no matches)");

        let hit = tool(dir.path())
            .execute(serde_json::json!({"pattern": "hello", "case_insensitive": true}))
            .await
            .unwrap();
        assert!(hit.contains("HELLO world"));
    }

    #[tokio::test]
    async fn max_results_cap() {
        let dir = tempfile::tempdir().unwrap();
        let many: String = (0..20).map(|i| format!("match {i}\n")).collect();
        std::fs::write(dir.path().join("f.txt"), many).unwrap();

        let out = tool(dir.path())
            .execute(serde_json::json!({"pattern": "match", "max_results": 5}))
            .await
            .unwrap();
        assert_eq!(out.lines().count(), 5);
    }

    #[tokio::test]
    async fn invalid_pattern_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = tool(dir.path())
            .execute(serde_json::json!({"pattern": "(unclosed"}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
