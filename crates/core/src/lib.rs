//! # Loopsmith Core
//!
//! Domain types, traits, and error definitions for the Loopsmith agent
//! orchestration runtime. This crate has **zero framework dependencies**
//! — it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the orchestration loop (model backend,
//! tool capability, event sink) is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod model;
pub mod outcome;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ModelError, Result, SkillError, ToolError};
pub use event::{AgentEvent, EventBus};
pub use message::{Message, Role, ToolCall, SUBAGENT_PREFIX};
pub use model::{ChatRequest, ModelClient, ModelResponse, StopReason, StreamChunk, ToolDefinition};
pub use outcome::{LoopResult, SubAgentConfig, SubAgentOutcome};
pub use tool::{Tool, ToolRecord, ToolRegistry};
