//! Built-in tool implementations for Loopsmith.
//!
//! Tools give the agent the ability to act on a sandboxed workspace:
//! run shell commands, read/write/edit files, list and search the tree,
//! and keep session notes in memory. Every file-facing tool shares one
//! [`WorkspaceSandbox`] so path policy lives in a single place.

pub mod bash;
pub mod file_edit;
pub mod file_read;
pub mod file_write;
pub mod final_answer;
pub mod grep_search;
pub mod list_dir;
pub mod memory_tool;
pub mod sandbox;

pub use sandbox::WorkspaceSandbox;

use loopsmith_core::tool::ToolRegistry;
use loopsmith_memory::MemoryStore;
use std::path::Path;

/// Create a registry with every built-in tool, confined to the given
/// workspace root and sharing the given memory store.
pub fn default_registry(workspace_root: &Path, memory: MemoryStore) -> ToolRegistry {
    let sandbox = WorkspaceSandbox::new(workspace_root);

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(bash::BashTool::new(sandbox.clone())));
    registry.register(Box::new(file_read::FileReadTool::new(sandbox.clone())));
    registry.register(Box::new(file_write::FileWriteTool::new(sandbox.clone())));
    registry.register(Box::new(file_edit::FileEditTool::new(sandbox.clone())));
    registry.register(Box::new(list_dir::ListDirTool::new(sandbox.clone())));
    registry.register(Box::new(grep_search::GrepSearchTool::new(sandbox)));
    registry.register(Box::new(memory_tool::MemoryTool::new(memory)));
    registry.register(Box::new(final_answer::FinalAnswerTool));
    registry
}
