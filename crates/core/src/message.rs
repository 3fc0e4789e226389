//! Message domain types.
//!
//! These are the value objects that flow through the orchestration loop:
//! the user message enters, the model answers or requests tool calls, tool
//! results come back as `tool` messages, and the cycle repeats.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (identity, workspace, skills)
    System,
    /// The end user
    User,
    /// The language model
    Assistant,
    /// Tool execution result
    Tool,
}

/// A tool invocation requested by the model.
///
/// Names prefixed with `subagent_` identify a delegation to a registered
/// sub-agent rather than an ordinary tool. This is a naming convention and
/// must be checked before generic dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque call ID (matches the model API's tool_call.id)
    pub id: String,

    /// Name of the tool or `subagent_<name>` delegation target
    pub name: String,

    /// Arguments as raw JSON text, exactly as the model produced them
    pub arguments: String,
}

/// Prefix identifying a delegation rather than an ordinary tool call.
pub const SUBAGENT_PREFIX: &str = "subagent_";

impl ToolCall {
    /// Whether this call delegates to a sub-agent (`subagent_` prefix).
    pub fn is_subagent(&self) -> bool {
        self.name.starts_with(SUBAGENT_PREFIX)
    }

    /// The sub-agent name with the prefix stripped, if this is a delegation.
    pub fn subagent_name(&self) -> Option<&str> {
        self.name.strip_prefix(SUBAGENT_PREFIX)
    }
}

/// A single message in a session history.
///
/// Invariant: a `tool` message's `tool_call_id` references a `ToolCall`
/// carried by the closest preceding `assistant` message still in history.
/// History pruning must keep those groups whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new assistant message without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message paired with a tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn tool_result_references_call() {
        let msg = Message::tool_result("call_1", "output");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn subagent_prefix_detection() {
        let call = ToolCall {
            id: "c1".into(),
            name: "subagent_researcher".into(),
            arguments: "{}".into(),
        };
        assert!(call.is_subagent());
        assert_eq!(call.subagent_name(), Some("researcher"));

        let plain = ToolCall {
            id: "c2".into(),
            name: "grep".into(),
            arguments: "{}".into(),
        };
        assert!(!plain.is_subagent());
        assert_eq!(plain.subagent_name(), None);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant_with_calls(
            "Let me check.",
            vec![ToolCall {
                id: "call_1".into(),
                name: "grep".into(),
                arguments: r#"{"pattern":"foo"}"#.into(),
            }],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Assistant);
        assert_eq!(back.tool_calls.len(), 1);
        assert_eq!(back.tool_calls[0].name, "grep");
    }
}
