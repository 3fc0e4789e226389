//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! run shell commands, read/write files, search the workspace, store
//! scratch values. Tools return plain text; errors are reported as
//! strings beginning with `"Error:"` so the model can recover, with one
//! exception — the final-answer signal (`ToolError::FinalAnswer`), which
//! short-circuits the orchestration loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ToolError;
use crate::model::ToolDefinition;

/// Default per-tool execution timeout, used when a tool does not declare one.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// The outcome of one dispatched tool call.
///
/// Appended to the session's append-only result history, which the
/// placeholder resolver indexes by 0-based insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    /// The tool call this record answers
    pub tool_call_id: String,

    /// Name of the tool that ran
    pub name: String,

    /// The (already truncated) output text
    pub output: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Wall-clock execution time
    pub duration: Duration,
}

/// The core Tool trait.
///
/// Each tool (bash, read_file, grep, memory, ...) implements this trait
/// and is registered in the [`ToolRegistry`]. Execution may suspend; the
/// dispatcher enforces the timeout, so implementations don't need to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "bash", "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Default execution timeout for this tool. The dispatcher may
    /// override it with a caller-supplied `timeout` argument.
    fn default_timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS)
    }

    /// Execute the tool with the given (already resolved) arguments.
    async fn execute(&self, arguments: serde_json::Value)
        -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, keyed by name.
///
/// Shared read-mostly across sessions behind an `Arc`; registration
/// happens at startup, lookups are lock-free `&self` reads.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions (for sending to the model), sorted by name
    /// so the schema the model sees is stable across runs.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Tool definitions filtered by an allow-list, sorted by name. The
    /// wildcard `"*"` grants every registered tool.
    pub fn definitions_for(&self, allowed: &[String]) -> Vec<ToolDefinition> {
        if allowed.iter().any(|a| a == "*") {
            return self.definitions();
        }
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .filter(|t| allowed.iter().any(|a| a == t.name()))
            .map(|t| t.to_definition())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
            Ok(arguments["text"].as_str().unwrap_or("").to_string())
        }
    }

    struct ZipTool;

    #[async_trait]
    impl Tool for ZipTool {
        fn name(&self) -> &str {
            "zip"
        }
        fn description(&self) -> &str {
            "Archives files"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    struct AwkTool;

    #[async_trait]
    impl Tool for AwkTool {
        fn name(&self) -> &str {
            "awk"
        }
        fn description(&self) -> &str {
            "Transforms text"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn definitions_for_wildcard_grants_all() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions_for(&["*".to_string()]);
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn definitions_for_filters_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry
            .definitions_for(&["other".to_string()])
            .is_empty());
        assert_eq!(
            registry.definitions_for(&["echo".to_string()]).len(),
            1
        );
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(ZipTool));
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(AwkTool));

        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["awk", "echo", "zip"]);

        let filtered: Vec<String> = registry
            .definitions_for(&["zip".to_string(), "awk".to_string()])
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(filtered, vec!["awk", "zip"]);
    }

    #[tokio::test]
    async fn echo_executes() {
        let tool = EchoTool;
        let out = tool
            .execute(serde_json::json!({"text": "hello world"}))
            .await
            .unwrap();
        assert_eq!(out, "hello world");
    }
}
