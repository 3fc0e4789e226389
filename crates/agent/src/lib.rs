//! The Loopsmith agent runtime.
//!
//! [`Agent`] is the public entry point: it owns the tool registry, skill
//! loader, memory store, and event bus, and spins up a [`LoopRunner`]
//! per chat or delegation. The submodules hold the moving parts of the
//! orchestration loop itself.

pub mod dispatcher;
pub mod history;
pub mod loop_runner;
pub mod prompt;
pub mod resolver;
pub mod session;
pub mod subagent;
pub mod truncate;

pub use dispatcher::ToolDispatcher;
pub use loop_runner::LoopRunner;
pub use subagent::SubAgentRegistry;

use loopsmith_config::AppConfig;
use loopsmith_core::event::{AgentEvent, EventBus};
use loopsmith_core::message::Message;
use loopsmith_core::model::ModelClient;
use loopsmith_core::outcome::{LoopResult, SubAgentConfig};
use loopsmith_core::tool::ToolRegistry;
use loopsmith_memory::MemoryStore;
use loopsmith_skills::SkillLoader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Per-chat options.
#[derive(Default)]
pub struct ChatOptions {
    /// Replaces the generated system prompt entirely when set
    pub system_prompt: Option<String>,

    /// Overrides the configured streaming default
    pub stream: Option<bool>,

    /// Prior conversation carried into this chat, between the system
    /// and user messages
    pub context: Vec<Message>,

    /// Fixed session ID; a fresh UUID is generated when absent
    pub session_id: Option<String>,
}

/// The top-level agent.
///
/// Holds everything shared across sessions. `chat()` and `delegate()`
/// take `&self`; concurrent sessions share tools, skills, events, and
/// the memory store.
pub struct Agent {
    config: AppConfig,
    model: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    subagents: SubAgentRegistry,
    events: Arc<EventBus>,
    skills: SkillLoader,
    memory: MemoryStore,
}

impl Agent {
    /// Build an agent from config and a model backend.
    ///
    /// Scans the skills directory immediately; loaded skills show up in
    /// the system prompt of every subsequent chat.
    pub fn new(config: AppConfig, model: Arc<dyn ModelClient>) -> Self {
        let memory = MemoryStore::new();
        let workspace = PathBuf::from(&config.workspace.root_path);
        let registry = Arc::new(loopsmith_tools::default_registry(
            &workspace,
            memory.clone(),
        ));
        let events = Arc::new(EventBus::default());

        let mut skills = SkillLoader::new(&config.skills_dir);
        for name in skills.scan() {
            info!(skill = %name, "Loaded skill");
            events.publish(AgentEvent::SkillLoaded {
                skill_name: name,
                timestamp: chrono::Utc::now(),
            });
        }

        Self {
            config,
            model,
            registry,
            subagents: SubAgentRegistry::new(),
            events,
            skills,
            memory,
        }
    }

    /// Register a sub-agent, exposed to the model as `subagent_<name>`.
    pub fn with_subagent(mut self, config: SubAgentConfig) -> Self {
        self.subagents.register(config);
        self
    }

    /// Replace the tool registry (for embedding with custom tools).
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn skills(&self) -> &SkillLoader {
        &self.skills
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one chat session to completion.
    pub async fn chat(&self, message: &str, options: ChatOptions) -> LoopResult {
        let session_id = options
            .session_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let stream = options.stream.unwrap_or(self.config.agent.enable_streaming);

        let system = options.system_prompt.unwrap_or_else(|| {
            prompt::build_system_prompt(
                &self.config.agent.name,
                &self.config.agent.description,
                &self.config.workspace.root_path,
                &self.skills.descriptions(),
            )
        });

        let mut history = Vec::with_capacity(options.context.len() + 2);
        history.push(Message::system(system));
        history.extend(options.context);
        history.push(Message::user(message));

        let mut tools = self.registry.definitions();
        if self.config.enable_sub_agents {
            tools.extend(self.subagents.definitions());
        }

        self.events.publish(AgentEvent::SessionStart {
            session_id: session_id.clone(),
            message_preview: message.chars().take(80).collect(),
            timestamp: chrono::Utc::now(),
        });

        let runner = self.runner(Arc::new(self.subagents.clone()));
        let result = runner
            .run(history, tools, stream, &self.memory, &session_id)
            .await;

        self.events.publish(AgentEvent::SessionStop {
            session_id,
            success: result.success,
            iterations: result.iterations,
            timestamp: chrono::Utc::now(),
        });

        result
    }

    /// Delegate a task directly to a sub-agent, outside any chat.
    ///
    /// With no `agent_name` a default sub-agent with full tool access is
    /// used. An unknown name yields a failure result, same as in-loop
    /// delegation.
    pub async fn delegate(
        &self,
        task: &str,
        agent_name: Option<&str>,
        context: Option<&str>,
    ) -> LoopResult {
        let session_id = uuid::Uuid::new_v4().to_string();
        match agent_name {
            Some(name) => {
                let runner = self.runner(Arc::new(self.subagents.clone()));
                runner.delegate(name, task, context, &session_id).await
            }
            None => {
                let mut fallback = SubAgentRegistry::new();
                let mut config = SubAgentConfig::new("default", "Default subagent");
                config.allowed_tools = vec!["*".into()];
                fallback.register(config);
                let runner = self.runner(Arc::new(fallback));
                runner.delegate("default", task, context, &session_id).await
            }
        }
    }

    fn runner(&self, subagents: Arc<SubAgentRegistry>) -> LoopRunner {
        let dispatcher = ToolDispatcher::new(self.registry.clone(), self.events.clone());
        LoopRunner::new(
            self.model.clone(),
            dispatcher,
            subagents,
            self.events.clone(),
            self.config.model.model.clone(),
        )
        .with_workspace(self.config.workspace.root_path.clone())
        .with_temperature(self.config.model.temperature)
        .with_max_tokens(self.config.model.max_tokens)
        .with_max_iterations(
            self.config.agent.max_iterations,
            Duration::from_secs(self.config.agent.per_iteration_budget_secs),
        )
        .with_rate_limit(Duration::from_millis(self.config.model.rate_limit_ms))
        .with_max_messages(self.config.model.max_messages)
        .with_max_delegation_depth(self.config.agent.max_delegation_depth)
    }
}
