//! The orchestration loop.
//!
//! One [`LoopRunner`] instance drives one session: it alternates model
//! calls with tool and sub-agent dispatch until the model produces a
//! final answer, a tool short-circuits with the final-answer signal, or
//! an iteration/time cap fires. Sub-agent delegations run the same
//! machinery as a nested runner with a restricted tool schema.

use loopsmith_core::error::{ModelError, ToolError};
use loopsmith_core::event::{AgentEvent, EventBus};
use loopsmith_core::message::{Message, ToolCall};
use loopsmith_core::model::{ChatRequest, ModelClient, StopReason, ToolDefinition};
use loopsmith_core::outcome::{LoopResult, SubAgentOutcome};
use loopsmith_memory::MemoryStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dispatcher::{parse_arguments, ToolDispatcher};
use crate::history;
use crate::prompt;
use crate::session::Session;
use crate::subagent::SubAgentRegistry;

/// Drives the model/tool iteration for one session.
///
/// Cheap to clone; delegation clones the runner with nested limits.
#[derive(Clone)]
pub struct LoopRunner {
    model: Arc<dyn ModelClient>,
    dispatcher: ToolDispatcher,
    subagents: Arc<SubAgentRegistry>,
    events: Arc<EventBus>,

    /// Workspace root, shown in sub-agent prompts
    workspace: String,

    model_name: String,
    temperature: f32,
    max_tokens: Option<u32>,

    /// Iteration cap for this loop
    max_iterations: u32,

    /// Whole-session wall-clock budget
    session_budget: Duration,

    /// Minimum gap between model requests
    rate_limit: Duration,

    /// Sliding-window history cap
    max_messages: usize,

    /// Delegation chains deeper than this fail closed
    max_delegation_depth: u32,

    /// Current delegation depth (0 = top-level session)
    depth: u32,
}

impl LoopRunner {
    pub fn new(
        model: Arc<dyn ModelClient>,
        dispatcher: ToolDispatcher,
        subagents: Arc<SubAgentRegistry>,
        events: Arc<EventBus>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            model,
            dispatcher,
            subagents,
            events,
            workspace: "./workspace".into(),
            model_name: model_name.into(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: 100,
            session_budget: Duration::from_secs(1000),
            rate_limit: Duration::from_millis(500),
            max_messages: 50,
            max_delegation_depth: 3,
            depth: 0,
        }
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the iteration cap and derive the session budget from it
    /// (`max × per_iteration_budget`).
    pub fn with_max_iterations(mut self, max: u32, per_iteration_budget: Duration) -> Self {
        self.max_iterations = max;
        self.session_budget = per_iteration_budget * max;
        self
    }

    pub fn with_rate_limit(mut self, gap: Duration) -> Self {
        self.rate_limit = gap;
        self
    }

    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    pub fn with_max_delegation_depth(mut self, depth: u32) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    /// Run the loop to completion.
    ///
    /// `history` must already contain the system and user messages.
    /// `memory` backs placeholder resolution for this session only.
    pub async fn run(
        &self,
        history: Vec<Message>,
        tools: Vec<ToolDefinition>,
        stream: bool,
        memory: &MemoryStore,
        session_id: &str,
    ) -> LoopResult {
        let mut session = Session::new(session_id, history);
        let mut content = String::new();
        let mut tool_calls_invoked: Vec<String> = Vec::new();
        let mut subagent_results: Vec<SubAgentOutcome> = Vec::new();
        let mut success = false;
        let mut error: Option<String> = None;

        while session.iterations < self.max_iterations {
            session.iterations += 1;

            session.rate_limit(self.rate_limit).await;
            history::prune(&mut session.history, self.max_messages);

            self.events.publish(AgentEvent::ModelStart {
                session_id: session_id.to_string(),
                iteration: session.iterations,
                timestamp: chrono::Utc::now(),
            });

            let request = ChatRequest {
                model: self.model_name.clone(),
                messages: session.history.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tools.clone(),
            };

            let turn = if stream {
                self.collect_stream(request, session_id).await
            } else {
                self.model.chat(request).await.map(|response| ModelTurn {
                    content: response.content,
                    tool_calls: response.tool_calls,
                    stop_reason: Some(response.stop_reason),
                })
            };

            self.events.publish(AgentEvent::ModelStop {
                session_id: session_id.to_string(),
                iteration: session.iterations,
                timestamp: chrono::Utc::now(),
            });

            let turn = match turn {
                Ok(turn) => turn,
                Err(e) => {
                    // Terminal: no internal retry, and no partial
                    // assistant message is appended
                    warn!(error = %e, "Model call failed");
                    error = Some(e.to_string());
                    break;
                }
            };

            session.history.push(if turn.tool_calls.is_empty() {
                Message::assistant(&turn.content)
            } else {
                Message::assistant_with_calls(&turn.content, turn.tool_calls.clone())
            });
            content = turn.content;

            if !turn.tool_calls.is_empty() {
                let mut final_answer: Option<String> = None;

                // Strictly sequential and in issue order: later calls may
                // reference earlier outputs via placeholders
                for call in &turn.tool_calls {
                    if let Some(name) = call.subagent_name() {
                        let outcome = self.delegate_call(call, name, session_id).await;
                        if final_answer.is_none() {
                            let summary = match &outcome.result.error {
                                None => outcome.result.content.clone(),
                                Some(err) => format!("Error: {err}"),
                            };
                            session.history.push(Message::tool_result(
                                &call.id,
                                format!("[{name}] {summary}"),
                            ));
                        }
                        subagent_results.push(outcome);
                        continue;
                    }

                    match self
                        .dispatcher
                        .dispatch(call, &session.result_history, memory, session_id)
                        .await
                    {
                        Ok(record) => {
                            tool_calls_invoked.push(record.name.clone());
                            if final_answer.is_none() {
                                session.history.push(Message::tool_result(
                                    &record.tool_call_id,
                                    &record.output,
                                ));
                                session.result_history.push(record);
                            }
                        }
                        Err(ToolError::FinalAnswer(answer)) => {
                            tool_calls_invoked.push(call.name.clone());
                            if final_answer.is_none() {
                                final_answer = Some(answer);
                            }
                        }
                        Err(e) => {
                            // Dispatcher contract: everything else comes
                            // back as an error record
                            tool_calls_invoked.push(call.name.clone());
                            if final_answer.is_none() {
                                session
                                    .history
                                    .push(Message::tool_result(&call.id, format!("Error: {e}")));
                            }
                        }
                    }
                }

                if let Some(answer) = final_answer {
                    info!(session_id, "Final answer signaled by tool");
                    content = answer;
                    success = true;
                    break;
                }

                if session.elapsed() > self.session_budget {
                    error = Some("timeout".into());
                    break;
                }
                continue;
            }

            // No tool calls: a non-streaming "stop" means the answer is
            // final; a stream reaching its end without tool calls means
            // the same (streams carry no stop reason).
            if stream || turn.stop_reason == Some(StopReason::Stop) {
                success = true;
                break;
            }

            if session.elapsed() > self.session_budget {
                error = Some("timeout".into());
                break;
            }
        }

        if !success && error.is_none() {
            error = Some("max iterations reached".into());
        }

        let duration = session.elapsed();
        debug!(
            session_id,
            success,
            iterations = session.iterations,
            duration_ms = duration.as_millis() as u64,
            "Loop finished"
        );

        LoopResult {
            success,
            content,
            tool_calls_invoked,
            subagent_results,
            duration,
            iterations: session.iterations,
            error: if success { None } else { error },
        }
    }

    /// Drain a model stream into a complete turn.
    ///
    /// Content accumulates chunk by chunk (each published as a
    /// `StreamChunk` event); tool calls are only known from the final
    /// chunk. A mid-stream error aborts the turn without yielding a
    /// partial assistant message.
    async fn collect_stream(
        &self,
        request: ChatRequest,
        session_id: &str,
    ) -> Result<ModelTurn, ModelError> {
        let mut rx = self.model.chat_stream(request).await?;
        let mut content = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();

        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(delta) = chunk.content {
                content.push_str(&delta);
                self.events.publish(AgentEvent::StreamChunk {
                    session_id: session_id.to_string(),
                    content: delta,
                });
            }
            if chunk.done {
                tool_calls = chunk.tool_calls;
                break;
            }
        }

        Ok(ModelTurn {
            content,
            tool_calls,
            stop_reason: None,
        })
    }

    /// Execute one `subagent_<name>` delegation.
    async fn delegate_call(
        &self,
        call: &ToolCall,
        name: &str,
        session_id: &str,
    ) -> SubAgentOutcome {
        let args = parse_arguments(&call.arguments);
        let task = args["task"].as_str().unwrap_or_default().to_string();
        let context = args["context"].as_str().map(str::to_string);

        self.events.publish(AgentEvent::SubAgentStart {
            session_id: session_id.to_string(),
            name: name.to_string(),
            task_preview: task.chars().take(80).collect(),
            timestamp: chrono::Utc::now(),
        });

        let result = self.delegate(name, &task, context.as_deref(), session_id).await;

        self.events.publish(AgentEvent::SubAgentStop {
            session_id: session_id.to_string(),
            name: name.to_string(),
            success: result.success,
            duration_ms: result.duration.as_millis() as u64,
            timestamp: chrono::Utc::now(),
        });

        SubAgentOutcome {
            tool_call_id: call.id.clone(),
            name: name.to_string(),
            result,
        }
    }

    /// Run a registered sub-agent as a nested loop.
    ///
    /// An unknown name or an exhausted delegation depth yields a failure
    /// result, never an error the parent has to catch.
    pub async fn delegate(
        &self,
        name: &str,
        task: &str,
        context: Option<&str>,
        session_id: &str,
    ) -> LoopResult {
        if self.depth >= self.max_delegation_depth {
            warn!(name, depth = self.depth, "Delegation depth limit reached");
            return LoopResult::failed("delegation depth limit reached");
        }

        let Some(config) = self.subagents.get(name) else {
            return LoopResult::failed(format!("Unknown subagent: {name}"));
        };

        // Independent scratchpad: a sub-agent never sees the parent's
        // placeholder state. The built-in registry is rebound to it so
        // the memory tool writes where the nested resolver reads.
        let memory = MemoryStore::new();
        let registry = Arc::new(loopsmith_tools::default_registry(
            Path::new(&self.workspace),
            memory.clone(),
        ));
        let dispatcher = ToolDispatcher::new(registry, self.events.clone());
        let definitions = dispatcher.registry().definitions_for(&config.allowed_tools);
        let tool_lines = definitions
            .iter()
            .map(|d| format!("- {}: {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n");
        let system = prompt::build_subagent_prompt(
            name,
            &config.system_prompt,
            &self.workspace,
            &tool_lines,
        );

        let mut history = vec![Message::system(system)];
        if let Some(context) = context {
            history.push(Message::user(format!("Context:\n{context}")));
        }
        history.push(Message::user(task));

        let nested = self
            .clone()
            .with_max_iterations(config.max_iterations, Duration::from_secs(1))
            .at_depth(self.depth + 1);
        // Budget comes from the sub-agent's own timeout, not its
        // iteration count
        let nested = LoopRunner {
            dispatcher,
            session_budget: Duration::from_secs(config.timeout_secs),
            ..nested
        };

        // Recursion through an async fn needs a boxed future
        Box::pin(nested.run(history, definitions, false, &memory, session_id)).await
    }

    fn at_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }
}

/// One completed model turn, streaming or not.
struct ModelTurn {
    content: String,
    tool_calls: Vec<ToolCall>,
    /// `None` for streamed turns — streams carry no stop reason
    stop_reason: Option<StopReason>,
}
