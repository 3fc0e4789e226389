//! Configuration loading and validation for Loopsmith.
//!
//! Loads configuration from a `loopsmith.toml` file with environment
//! variable overrides (`LOOPSMITH_*`). All settings are validated at
//! load time; missing files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The root configuration structure.
///
/// Maps directly to `loopsmith.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model backend configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Workspace sandbox configuration
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Directory scanned for SKILL.md skill definitions
    #[serde(default = "default_skills_dir")]
    pub skills_dir: String,

    /// Whether sub-agent delegation tools are exposed to the model
    #[serde(default = "default_true")]
    pub enable_sub_agents: bool,
}

fn default_skills_dir() -> String {
    "./skills".into()
}
fn default_true() -> bool {
    true
}

/// Model backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (can also come from the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Sliding-window cap on history length (messages kept besides system)
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Minimum wall-clock gap between model requests per session, in ms
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    60
}
fn default_max_messages() -> usize {
    50
}
fn default_rate_limit_ms() -> u64 {
    500
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_request_timeout(),
            max_messages: default_max_messages(),
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name used in the system prompt
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// One-line agent description used in the system prompt
    #[serde(default = "default_agent_description")]
    pub description: String,

    /// Maximum loop iterations per chat
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Heuristic per-iteration wall-clock budget in seconds; the whole
    /// session fails once elapsed exceeds `max_iterations × budget`
    #[serde(default = "default_iteration_budget")]
    pub per_iteration_budget_secs: u64,

    /// Whether to stream model responses by default
    #[serde(default = "default_true")]
    pub enable_streaming: bool,

    /// Maximum nesting depth for sub-agent delegation chains
    #[serde(default = "default_delegation_depth")]
    pub max_delegation_depth: u32,
}

fn default_agent_name() -> String {
    "Loopsmith".into()
}
fn default_agent_description() -> String {
    "a capable AI agent that researches, edits files, and runs commands".into()
}
fn default_max_iterations() -> u32 {
    100
}
fn default_iteration_budget() -> u64 {
    10
}
fn default_delegation_depth() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            description: default_agent_description(),
            max_iterations: default_max_iterations(),
            per_iteration_budget_secs: default_iteration_budget(),
            enable_streaming: default_true(),
            max_delegation_depth: default_delegation_depth(),
        }
    }
}

/// Workspace sandbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory tools are confined to
    #[serde(default = "default_workspace_root")]
    pub root_path: String,
}

fn default_workspace_root() -> String {
    "./workspace".into()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root_path: default_workspace_root(),
        }
    }
}

/// Redact the API key for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("agent", &self.agent)
            .field("workspace", &self.workspace)
            .field("skills_dir", &self.skills_dir)
            .field("enable_sub_agents", &self.enable_sub_agents)
            .finish()
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_messages", &self.max_messages)
            .field("rate_limit_ms", &self.rate_limit_ms)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default locations, then apply
    /// environment overrides.
    ///
    /// Search order: `./loopsmith.toml`, then `~/.loopsmith/config.toml`,
    /// then built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_first_existing(&[
            PathBuf::from("loopsmith.toml"),
            dirs_home().join(".loopsmith").join("config.toml"),
        ])?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply
    /// environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn load_first_existing(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        for path in paths {
            if path.exists() {
                return Self::parse_file(path);
            }
        }
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply `LOOPSMITH_*` environment variable overrides.
    fn apply_env(&mut self) {
        if self.model.api_key.is_none() {
            self.model.api_key = std::env::var("LOOPSMITH_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(base_url) = std::env::var("LOOPSMITH_BASE_URL") {
            self.model.base_url = base_url;
        }
        if let Ok(model) = std::env::var("LOOPSMITH_MODEL") {
            self.model.model = model;
        }
        if let Ok(root) = std::env::var("LOOPSMITH_WORKSPACE") {
            self.workspace.root_path = root;
        }
        if let Ok(dir) = std::env::var("LOOPSMITH_SKILLS_DIR") {
            self.skills_dir = dir;
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.temperature < 0.0 || self.model.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.model.max_messages < 2 {
            return Err(ConfigError::ValidationError(
                "model.max_messages must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            agent: AgentConfig::default(),
            workspace: WorkspaceConfig::default(),
            skills_dir: default_skills_dir(),
            enable_sub_agents: true,
        }
    }
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
