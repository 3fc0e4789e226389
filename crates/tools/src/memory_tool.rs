//! Memory tool. Gives the model explicit access to the session scratchpad.
//!
//! The same store also backs `${memory.KEY}` placeholder resolution, so a
//! value written here can be referenced by later tool calls without the
//! model restating it.

use async_trait::async_trait;
use loopsmith_core::error::ToolError;
use loopsmith_core::tool::Tool;
use loopsmith_memory::MemoryStore;

const SEARCH_LIMIT: usize = 10;
const LIST_LIMIT: usize = 50;

pub struct MemoryTool {
    store: MemoryStore,
}

impl MemoryTool {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemoryTool {
    fn name(&self) -> &str {
        "memory"
    }

    fn description(&self) -> &str {
        "Store and recall session facts. Actions: set (key, value), get (key), delete (key), \
         search (query), list, clear. Stored values can be referenced later as ${memory.KEY}."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["set", "get", "delete", "search", "list", "clear"],
                    "description": "The memory operation to perform"
                },
                "key": {
                    "type": "string",
                    "description": "Key for set/get/delete"
                },
                "value": {
                    "type": "string",
                    "description": "Value for set"
                },
                "query": {
                    "type": "string",
                    "description": "Substring query for search"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let action = arguments["action"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'action' argument".into()))?;

        match action {
            "set" => {
                let key = require_str(&arguments, "key")?;
                let value = require_str(&arguments, "value")?;
                self.store.set(key, value).await;
                Ok(format!("Stored '{key}'"))
            }
            "get" => {
                let key = require_str(&arguments, "key")?;
                match self.store.get(key).await {
                    Some(value) => Ok(value),
                    None => Ok(format!("(no value stored under '{key}')")),
                }
            }
            "delete" => {
                let key = require_str(&arguments, "key")?;
                if self.store.delete(key).await {
                    Ok(format!("Deleted '{key}'"))
                } else {
                    Ok(format!("(no value stored under '{key}')"))
                }
            }
            "search" => {
                let query = require_str(&arguments, "query")?;
                let hits = self.store.search(query, SEARCH_LIMIT).await;
                if hits.is_empty() {
                    return Ok("(no matches)".into());
                }
                Ok(hits
                    .iter()
                    .map(|h| format!("{}: {}", h.key, h.value))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            "list" => {
                let keys = self.store.list_keys(LIST_LIMIT).await;
                if keys.is_empty() {
                    return Ok("(memory is empty)".into());
                }
                Ok(keys.join("\n"))
            }
            "clear" => {
                self.store.clear().await;
                Ok("Memory cleared".into())
            }
            other => Err(ToolError::InvalidArguments(format!(
                "Unknown action '{other}'"
            ))),
        }
    }
}

fn require_str<'a>(arguments: &'a serde_json::Value, field: &str) -> Result<&'a str, ToolError> {
    arguments[field]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{field}' argument")))
}
