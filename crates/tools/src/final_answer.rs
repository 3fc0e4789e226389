//! Final answer tool.
//!
//! Calling it raises [`ToolError::FinalAnswer`], which the dispatcher
//! forwards to the orchestration loop instead of stringifying. The loop
//! then terminates with success even if other tool calls in the same
//! batch are still pending.

use async_trait::async_trait;
use loopsmith_core::error::ToolError;
use loopsmith_core::tool::Tool;

pub struct FinalAnswerTool;

#[async_trait]
impl Tool for FinalAnswerTool {
    fn name(&self) -> &str {
        "final_answer"
    }

    fn description(&self) -> &str {
        "Submit the final answer and end the session immediately. \
         Use when the task is complete and no further tool calls are needed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The final answer text"
                }
            },
            "required": ["answer"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let answer = arguments["answer"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'answer' argument".into()))?;
        Err(ToolError::FinalAnswer(answer.to_string()))
    }
}
