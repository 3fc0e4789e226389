//! Orchestration outcomes and sub-agent configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The externally observable outcome of one orchestration run.
///
/// `error` is populated exactly when `success == false`; callers treat a
/// non-success result as a normal outcome, never as an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopResult {
    /// Whether the run reached a final answer
    pub success: bool,

    /// The final answer (or last assistant content on failure)
    pub content: String,

    /// Names of ordinary tools invoked, in dispatch order
    #[serde(default)]
    pub tool_calls_invoked: Vec<String>,

    /// Outcomes of sub-agent delegations made during the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subagent_results: Vec<SubAgentOutcome>,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Iterations consumed
    pub iterations: u32,

    /// Failure reason, when `success == false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoopResult {
    /// A failure result with the given error, before any iteration ran.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            tool_calls_invoked: Vec::new(),
            subagent_results: Vec::new(),
            duration: Duration::ZERO,
            iterations: 0,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a single sub-agent delegation, as recorded by the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentOutcome {
    /// The tool call that triggered the delegation
    pub tool_call_id: String,

    /// The sub-agent's name (without the `subagent_` prefix)
    pub name: String,

    /// The nested loop's result
    pub result: LoopResult,
}

/// Configuration for a registered sub-agent.
///
/// Immutable once registered; looked up by name at delegation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentConfig {
    /// Name used in the `subagent_<name>` tool and at lookup
    pub name: String,

    /// Description sent to the model as the delegation tool description
    pub description: String,

    /// System prompt for the nested loop; empty uses a generated default
    #[serde(default)]
    pub system_prompt: String,

    /// Tool allow-list; `"*"` grants every registered tool
    #[serde(default)]
    pub allowed_tools: Vec<String>,

    /// Iteration cap for the nested loop, independent of the parent's
    #[serde(default = "default_subagent_iterations")]
    pub max_iterations: u32,

    /// Whole-delegation timeout in seconds
    #[serde(default = "default_subagent_timeout")]
    pub timeout_secs: u64,
}

fn default_subagent_iterations() -> u32 {
    50
}
fn default_subagent_timeout() -> u64 {
    300
}

impl SubAgentConfig {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: String::new(),
            allowed_tools: Vec::new(),
            max_iterations: default_subagent_iterations(),
            timeout_secs: default_subagent_timeout(),
        }
    }

    /// The tool name this sub-agent is exposed under.
    pub fn tool_name(&self) -> String {
        format!("{}{}", crate::message::SUBAGENT_PREFIX, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_has_error_and_no_success() {
        let r = LoopResult::failed("Unknown subagent: ghost");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("Unknown subagent: ghost"));
        assert_eq!(r.iterations, 0);
    }

    #[test]
    fn subagent_tool_name_carries_prefix() {
        let cfg = SubAgentConfig::new("researcher", "Finds things");
        assert_eq!(cfg.tool_name(), "subagent_researcher");
    }

    #[test]
    fn subagent_config_defaults() {
        let json = r#"{"name":"r","description":"d"}"#;
        let cfg: SubAgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.max_iterations, 50);
        assert_eq!(cfg.timeout_secs, 300);
        assert!(cfg.allowed_tools.is_empty());
    }
}
