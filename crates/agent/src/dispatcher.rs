//! Tool dispatcher.
//!
//! One entry point for every ordinary tool call the model makes. The
//! dispatcher parses arguments tolerantly, resolves placeholders, runs
//! the tool under its timeout, and converts every tool failure into an
//! `"Error: ..."` result string. The only thing it ever propagates to
//! the loop is the final-answer signal.

use loopsmith_core::error::ToolError;
use loopsmith_core::event::{AgentEvent, EventBus};
use loopsmith_core::message::ToolCall;
use loopsmith_core::tool::{ToolRecord, ToolRegistry};
use loopsmith_memory::MemoryStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::resolver::resolve_placeholders;
use crate::truncate::truncate_tool_result;

/// Dispatches tool calls against a shared registry.
///
/// Cheap to clone; shared read-mostly across sessions and sub-agents.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    events: Arc<EventBus>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, events: Arc<EventBus>) -> Self {
        Self { registry, events }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch one tool call.
    ///
    /// Returns `Err` only for [`ToolError::FinalAnswer`]; every other
    /// failure comes back as a `ToolRecord` whose output starts with
    /// `"Error:"`.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        results: &[ToolRecord],
        memory: &MemoryStore,
        session_id: &str,
    ) -> Result<ToolRecord, ToolError> {
        let args = parse_arguments(&call.arguments);
        let args = resolve_placeholders(args, results, memory).await;

        self.events.publish(AgentEvent::ToolCallStart {
            session_id: session_id.to_string(),
            tool_name: call.name.clone(),
            arguments: args.clone(),
            timestamp: chrono::Utc::now(),
        });

        let started = Instant::now();
        let outcome = self.execute(call, args).await;
        let duration = started.elapsed();

        let (output, success) = match outcome {
            Ok(output) => {
                let success = !output.starts_with("Error:");
                (output, success)
            }
            Err(ToolError::FinalAnswer(answer)) => {
                // Still observable, then forwarded intact to the loop
                self.events.publish(AgentEvent::ToolResult {
                    session_id: session_id.to_string(),
                    tool_name: call.name.clone(),
                    success: true,
                    duration_ms: duration.as_millis() as u64,
                    timestamp: chrono::Utc::now(),
                });
                return Err(ToolError::FinalAnswer(answer));
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                (format!("Error: {e}"), false)
            }
        };

        let output = truncate_tool_result(&output);
        debug!(tool = %call.name, success, duration_ms = duration.as_millis() as u64, "Tool call finished");

        self.events.publish(AgentEvent::ToolResult {
            session_id: session_id.to_string(),
            tool_name: call.name.clone(),
            success,
            duration_ms: duration.as_millis() as u64,
            timestamp: chrono::Utc::now(),
        });

        Ok(ToolRecord {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            output,
            success,
            duration,
        })
    }

    async fn execute(
        &self,
        call: &ToolCall,
        args: serde_json::Value,
    ) -> Result<String, ToolError> {
        let Some(tool) = self.registry.get(&call.name) else {
            return Err(ToolError::NotFound(call.name.clone()));
        };

        // Caller-supplied timeout overrides the tool's default
        let timeout = args["timeout"]
            .as_u64()
            .map(Duration::from_secs)
            .unwrap_or_else(|| tool.default_timeout());

        match tokio::time::timeout(timeout, tool.execute(args)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }
}

/// Parse raw tool-call arguments, tolerating malformed JSON.
///
/// Empty text becomes an empty object; unparseable text is wrapped as
/// `{"raw": <original text>}` rather than failing the call.
pub fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loopsmith_core::tool::Tool;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
            Ok(arguments["text"].as_str().unwrap_or("").to_string())
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "sleeps"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn default_timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("never".into())
        }
    }

    struct AnswerTool;

    #[async_trait]
    impl Tool for AnswerTool {
        fn name(&self) -> &str {
            "answer"
        }
        fn description(&self) -> &str {
            "final answer"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
            Err(ToolError::FinalAnswer(
                arguments["answer"].as_str().unwrap_or("").to_string(),
            ))
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(SlowTool));
        registry.register(Box::new(AnswerTool));
        ToolDispatcher::new(Arc::new(registry), Arc::new(EventBus::default()))
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[tokio::test]
    async fn successful_dispatch_records_output() {
        let d = dispatcher();
        let record = d
            .dispatch(&call("echo", r#"{"text":"hi"}"#), &[], &MemoryStore::new(), "s")
            .await
            .unwrap();
        assert!(record.success);
        assert_eq!(record.output, "hi");
        assert_eq!(record.name, "echo");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_record() {
        let d = dispatcher();
        let record = d
            .dispatch(&call("ghost", "{}"), &[], &MemoryStore::new(), "s")
            .await
            .unwrap();
        assert!(!record.success);
        assert!(record.output.starts_with("Error:"));
        assert!(record.output.contains("ghost"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_error_record() {
        let d = dispatcher();
        let record = d
            .dispatch(&call("slow", "{}"), &[], &MemoryStore::new(), "s")
            .await
            .unwrap();
        assert!(!record.success);
        assert!(record.output.contains("timed out"));
    }

    #[tokio::test]
    async fn final_answer_propagates() {
        let d = dispatcher();
        let result = d
            .dispatch(
                &call("answer", r#"{"answer":"DONE"}"#),
                &[],
                &MemoryStore::new(),
                "s",
            )
            .await;
        match result {
            Err(ToolError::FinalAnswer(text)) => assert_eq!(text, "DONE"),
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn placeholders_resolved_before_execution() {
        let d = dispatcher();
        let memory = MemoryStore::new();
        memory.set("greeting", "hello from memory").await;
        let record = d
            .dispatch(
                &call("echo", r#"{"text":"${memory.greeting}"}"#),
                &[],
                &memory,
                "s",
            )
            .await
            .unwrap();
        assert_eq!(record.output, "hello from memory");
    }

    #[test]
    fn malformed_arguments_wrapped_as_raw() {
        let parsed = parse_arguments("not json {");
        assert_eq!(parsed["raw"], "not json {");
    }

    #[test]
    fn empty_arguments_become_empty_object() {
        let parsed = parse_arguments("");
        assert_eq!(parsed, serde_json::json!({}));
    }
}
