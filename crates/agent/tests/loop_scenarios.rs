//! End-to-end orchestration loop scenarios against a scripted model.

use async_trait::async_trait;
use loopsmith_agent::{Agent, ChatOptions};
use loopsmith_config::AppConfig;
use loopsmith_core::error::ModelError;
use loopsmith_core::message::ToolCall;
use loopsmith_core::model::{ChatRequest, ModelClient, ModelResponse, StopReason};
use loopsmith_core::outcome::SubAgentConfig;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

/// Serves a fixed sequence of responses; once exhausted it keeps
/// returning a contentless non-stop response, like a model that never
/// finishes.
struct ScriptedClient {
    responses: Mutex<VecDeque<ModelResponse>>,
}

impl ScriptedClient {
    fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ModelResponse, ModelError> {
        let next = self
            .responses
            .lock()
            .map_err(|_| ModelError::Network("poisoned script".into()))?
            .pop_front();
        Ok(next.unwrap_or_else(|| ModelResponse {
            content: "still thinking".into(),
            stop_reason: StopReason::Length,
            tool_calls: vec![],
            usage: None,
        }))
    }
}

fn stop(content: &str) -> ModelResponse {
    ModelResponse {
        content: content.into(),
        stop_reason: StopReason::Stop,
        tool_calls: vec![],
        usage: None,
    }
}

fn tool_use(calls: Vec<(&str, &str, &str)>) -> ModelResponse {
    ModelResponse {
        content: String::new(),
        stop_reason: StopReason::ToolUse,
        tool_calls: calls
            .into_iter()
            .map(|(id, name, arguments)| ToolCall {
                id: id.into(),
                name: name.into(),
                arguments: arguments.into(),
            })
            .collect(),
        usage: None,
    }
}

fn test_config(workspace: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.model.rate_limit_ms = 0;
    config.agent.enable_streaming = false;
    config.workspace.root_path = workspace.to_string_lossy().into_owned();
    config.skills_dir = workspace.join("skills").to_string_lossy().into_owned();
    config
}

fn agent(workspace: &Path, responses: Vec<ModelResponse>) -> Agent {
    Agent::new(
        test_config(workspace),
        Arc::new(ScriptedClient::new(responses)),
    )
}

#[tokio::test]
async fn immediate_stop_finishes_in_one_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent(dir.path(), vec![stop("hello")]);

    let result = agent.chat("hi", ChatOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.content, "hello");
    assert_eq!(result.iterations, 1);
    assert!(result.tool_calls_invoked.is_empty());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn tool_call_round_trip_then_stop() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello world\n").unwrap();

    let agent = agent(
        dir.path(),
        vec![
            tool_use(vec![("call_1", "grep", r#"{"pattern":"hello"}"#)]),
            stop("Found it."),
        ],
    );

    let result = agent.chat("search for hello", ChatOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.content, "Found it.");
    assert_eq!(result.tool_calls_invoked, vec!["grep"]);
    assert_eq!(result.iterations, 2);
}

#[tokio::test]
async fn final_answer_terminates_with_pending_calls_in_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello world\n").unwrap();

    // The grep call after the final answer still runs; its output does
    // not displace the answer.
    let agent = agent(
        dir.path(),
        vec![tool_use(vec![
            ("call_1", "final_answer", r#"{"answer":"DONE"}"#),
            ("call_2", "grep", r#"{"pattern":"hello"}"#),
        ])],
    );

    let result = agent.chat("finish up", ChatOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.content, "DONE");
    assert_eq!(result.iterations, 1);
    assert_eq!(result.tool_calls_invoked, vec!["final_answer", "grep"]);
}

#[tokio::test]
async fn never_stopping_model_hits_iteration_cap() {
    let dir = tempfile::tempdir().unwrap();
    // Empty script: every iteration gets a non-stop, no-tool response
    let agent = agent(dir.path(), vec![]);

    let result = agent.chat("loop forever", ChatOptions::default()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("max iterations reached"));
    assert_eq!(result.iterations, 100);
}

#[tokio::test]
async fn unknown_subagent_fails_delegation_but_session_continues() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent(
        dir.path(),
        vec![
            tool_use(vec![("call_1", "subagent_ghost", r#"{"task":"haunt"}"#)]),
            stop("carried on"),
        ],
    );

    let result = agent.chat("delegate to ghost", ChatOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.content, "carried on");
    assert_eq!(result.subagent_results.len(), 1);

    let outcome = &result.subagent_results[0];
    assert_eq!(outcome.name, "ghost");
    assert!(!outcome.result.success);
    assert_eq!(
        outcome.result.error.as_deref(),
        Some("Unknown subagent: ghost")
    );
}

#[tokio::test]
async fn registered_subagent_runs_nested_loop() {
    let dir = tempfile::tempdir().unwrap();
    // Script order: parent delegation request, nested loop's answer,
    // parent's final answer
    let agent = agent(
        dir.path(),
        vec![
            tool_use(vec![(
                "call_1",
                "subagent_helper",
                r#"{"task":"look into it"}"#,
            )]),
            stop("sub answer"),
            stop("done"),
        ],
    )
    .with_subagent(SubAgentConfig::new("helper", "Helps out"));

    let result = agent.chat("use the helper", ChatOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.content, "done");

    let outcome = &result.subagent_results[0];
    assert_eq!(outcome.name, "helper");
    assert!(outcome.result.success);
    assert_eq!(outcome.result.content, "sub answer");
}

#[tokio::test]
async fn exhausted_time_budget_fails_with_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    // Zero per-iteration budget makes the first elapsed check trip
    config.agent.per_iteration_budget_secs = 0;
    let agent = Agent::new(config, Arc::new(ScriptedClient::new(vec![])));

    let result = agent.chat("take your time", ChatOptions::default()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("timeout"));
    assert_eq!(result.iterations, 1);
}

#[tokio::test]
async fn exhausted_delegation_depth_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.agent.max_delegation_depth = 0;
    let agent = Agent::new(config, Arc::new(ScriptedClient::new(vec![stop("unreached")])));

    let result = agent.delegate("dig deeper", None, None).await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("delegation depth limit reached")
    );
    assert_eq!(result.iterations, 0);
}

#[tokio::test]
async fn subagent_memory_writes_resolve_in_its_own_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    // Nested script: store a value, reference it via ${memory.KEY},
    // answer. Parent wraps up once the delegation returns.
    let agent = agent(
        dir.path(),
        vec![
            tool_use(vec![(
                "call_1",
                "subagent_scribe",
                r#"{"task":"note the city"}"#,
            )]),
            tool_use(vec![(
                "call_2",
                "memory",
                r#"{"action":"set","key":"city","value":"Oslo"}"#,
            )]),
            tool_use(vec![(
                "call_3",
                "write_file",
                r#"{"path":"city.txt","content":"${memory.city}"}"#,
            )]),
            stop("noted"),
            stop("all done"),
        ],
    )
    .with_subagent({
        let mut config = SubAgentConfig::new("scribe", "Takes notes");
        config.allowed_tools = vec!["*".into()];
        config
    });

    let result = agent.chat("use the scribe", ChatOptions::default()).await;
    assert!(result.success);

    let written = std::fs::read_to_string(dir.path().join("city.txt")).unwrap();
    assert_eq!(written, "Oslo");
    // The parent session's store never sees the sub-agent's key
    assert!(agent.memory().get("city").await.is_none());
}

#[tokio::test]
async fn stream_end_without_tool_calls_is_success() {
    let dir = tempfile::tempdir().unwrap();
    // Streams carry no stop reason; exhaustion without tool calls means
    // the answer is final even though the scripted stop reason is Length.
    let agent = agent(
        dir.path(),
        vec![ModelResponse {
            content: "streamed answer".into(),
            stop_reason: StopReason::Length,
            tool_calls: vec![],
            usage: None,
        }],
    );

    let result = agent
        .chat(
            "stream it",
            ChatOptions {
                stream: Some(true),
                ..Default::default()
            },
        )
        .await;
    assert!(result.success);
    assert_eq!(result.content, "streamed answer");
}

#[tokio::test]
async fn direct_delegate_without_name_uses_default_subagent() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent(dir.path(), vec![stop("delegated result")]);

    let result = agent.delegate("do a thing", None, None).await;
    assert!(result.success);
    assert_eq!(result.content, "delegated result");
}

#[tokio::test]
async fn placeholder_chains_between_tool_calls() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.txt"), "the secret is 42\n").unwrap();

    // Second call writes the first call's output to a file via
    // ${tool_result.last}.
    let agent = agent(
        dir.path(),
        vec![
            tool_use(vec![("call_1", "read_file", r#"{"path":"data.txt"}"#)]),
            tool_use(vec![(
                "call_2",
                "write_file",
                r#"{"path":"copy.txt","content":"${tool_result.last}"}"#,
            )]),
            stop("copied"),
        ],
    );

    let result = agent.chat("copy the file", ChatOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.tool_calls_invoked, vec!["read_file", "write_file"]);

    let copied = std::fs::read_to_string(dir.path().join("copy.txt")).unwrap();
    assert!(copied.contains("the secret is 42"));
}
