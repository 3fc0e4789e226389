//! Agent event system — fire-and-forget lifecycle notifications.
//!
//! The orchestration loop, dispatcher, and sub-agent runtime publish
//! events as they work. Observers (CLI rendering, logging, tests)
//! subscribe without coupling to the loop; a failing or absent subscriber
//! never aborts the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All lifecycle events published by the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    /// A chat session started
    SessionStart {
        session_id: String,
        message_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A chat session finished
    SessionStop {
        session_id: String,
        success: bool,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// A model request is about to be sent
    ModelStart {
        session_id: String,
        iteration: u32,
        timestamp: DateTime<Utc>,
    },

    /// A model response (or stream) completed
    ModelStop {
        session_id: String,
        iteration: u32,
        timestamp: DateTime<Utc>,
    },

    /// A streamed content chunk arrived
    StreamChunk {
        session_id: String,
        content: String,
    },

    /// A tool call is starting
    ToolCallStart {
        session_id: String,
        tool_name: String,
        arguments: serde_json::Value,
        timestamp: DateTime<Utc>,
    },

    /// A tool call finished
    ToolResult {
        session_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A sub-agent delegation started
    SubAgentStart {
        session_id: String,
        name: String,
        task_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A sub-agent delegation finished
    SubAgentStop {
        session_id: String,
        name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A skill file was discovered and loaded
    SkillLoaded {
        skill_name: String,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Publishing
/// with no subscribers is fine; slow subscribers may miss events, which
/// is acceptable for best-effort observability.
pub struct EventBus {
    sender: broadcast::Sender<Arc<AgentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: AgentEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AgentEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
