//! Tools that expose the catalog to the assistant.

use super::registry::{AgentTool, ToolDefinition, ToolError};
use crate::catalog_store::CatalogStore;
use crate::query::QueryItem;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Searches pinned singles by title, album, artists and recency.
pub struct QuerySinglesTool {
    store: Arc<dyn CatalogStore>,
}

impl QuerySinglesTool {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AgentTool for QuerySinglesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "query_singles".to_string(),
            description: "Search the singles the user has pinned. All fields are \
                optional; omitted fields do not constrain the search. Use 'duration' \
                together with optionally 'start_point' to restrict results to a time \
                window, e.g. duration \"7d\" for the last week."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Substring of the single's title"
                    },
                    "album": {
                        "type": "string",
                        "description": "Substring of the album the single belongs to"
                    },
                    "artists": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Artists that must all appear on the single"
                    },
                    "duration": {
                        "type": "string",
                        "description": "Window length such as \"10d\", \"1.5h\" or \"2w\""
                    },
                    "start_point": {
                        "type": "string",
                        "format": "date-time",
                        "description": "RFC 3339 start of the window; defaults to \
                            duration ago from now"
                    }
                }
            }),
        }
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let item: QueryItem = serde_json::from_value(arguments.clone())
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let filter = item.to_filter();
        debug!(conditions = filter.len(), "Querying singles for assistant");

        let singles = self
            .store
            .find_singles(&filter)
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        Ok(json!({
            "count": singles.len(),
            "singles": singles,
        }))
    }
}

/// Reports the current date and time, so the model can reason about
/// relative expressions like "last week".
pub struct TodayTool;

#[async_trait]
impl AgentTool for TodayTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_today".to_string(),
            description: "Get the current date and time in UTC.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(
        &self,
        _arguments: &serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let now = Utc::now();
        Ok(json!({
            "now": now.to_rfc3339(),
            "weekday": now.format("%A").to_string(),
        }))
    }
}
