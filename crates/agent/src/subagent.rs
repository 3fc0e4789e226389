//! Sub-agent registry.
//!
//! Sub-agents are named, pre-registered configurations. Each one is
//! exposed to the model as a `subagent_<name>` tool taking a task string;
//! at delegation time the loop runner materializes the config into a
//! nested orchestration loop with a restricted tool schema.

use loopsmith_core::model::ToolDefinition;
use loopsmith_core::outcome::SubAgentConfig;
use std::collections::HashMap;

#[derive(Clone, Default)]
pub struct SubAgentRegistry {
    configs: HashMap<String, SubAgentConfig>,
}

impl SubAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-agent. Replaces any existing one with the same name.
    pub fn register(&mut self, config: SubAgentConfig) {
        self.configs.insert(config.name.clone(), config);
    }

    pub fn get(&self, name: &str) -> Option<&SubAgentConfig> {
        self.configs.get(name)
    }

    /// Delegation tool definitions for every registered sub-agent.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut configs: Vec<&SubAgentConfig> = self.configs.values().collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
            .into_iter()
            .map(|config| ToolDefinition {
                name: config.tool_name(),
                description: config.description.clone(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task": {
                            "type": "string",
                            "description": "The task to delegate to this sub-agent"
                        },
                        "context": {
                            "type": "string",
                            "description": "Optional extra context for the task"
                        }
                    },
                    "required": ["task"]
                }),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.configs.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = SubAgentRegistry::new();
        registry.register(SubAgentConfig::new("researcher", "Finds things"));
        assert!(registry.get("researcher").is_some());
        assert!(registry.get("ghost").is_none());
    }

    #[test]
    fn definitions_carry_prefix_and_task_parameter() {
        let mut registry = SubAgentRegistry::new();
        registry.register(SubAgentConfig::new("researcher", "Finds things"));

        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "subagent_researcher");
        assert_eq!(defs[0].parameters["required"], serde_json::json!(["task"]));
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let mut registry = SubAgentRegistry::new();
        registry.register(SubAgentConfig::new("zeta", "z"));
        registry.register(SubAgentConfig::new("alpha", "a"));

        let defs = registry.definitions();
        assert_eq!(defs[0].name, "subagent_alpha");
        assert_eq!(defs[1].name, "subagent_zeta");
    }
}
