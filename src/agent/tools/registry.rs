//! Tool trait and registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Description of a tool as offered to the model. `parameters` is a JSON
/// schema object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {0}")]
    Execution(String),
}

/// A tool the assistant can call while answering a question.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the model-supplied arguments, returning a JSON
    /// result that goes back into the conversation.
    async fn execute(&self, arguments: &serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// Registry of available tools, keyed by name.
#[derive(Default)]
pub struct AgentToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
}

impl AgentToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn AgentTool>) {
        self.tools.insert(tool.definition().name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl AgentTool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the arguments".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }
        }

        async fn execute(
            &self,
            arguments: &serde_json::Value,
        ) -> Result<serde_json::Value, ToolError> {
            Ok(arguments.clone())
        }
    }

    #[tokio::test]
    async fn register_and_execute() {
        let mut registry = AgentToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert_eq!(registry.definitions().len(), 1);
        let tool = registry.get("echo").unwrap();
        let result = tool
            .execute(&serde_json::json!({"hello": "world"}))
            .await
            .unwrap();
        assert_eq!(result["hello"], "world");
    }
}
