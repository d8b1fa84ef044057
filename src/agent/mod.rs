//! Natural-language assistant over the catalog.

pub mod llm;
mod runner;
pub mod tools;

pub use runner::{AgentError, AgentHandle, CatalogAgent};

use crate::catalog_store::CatalogStore;
use crate::config::AgentSettings;
use llm::{CompletionOptions, OllamaProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tools::{AgentToolRegistry, QuerySinglesTool, TodayTool};

/// Wire up the assistant from its settings and spawn it.
pub fn start_agent(
    settings: &AgentSettings,
    store: Arc<dyn CatalogStore>,
    shutdown: CancellationToken,
) -> AgentHandle {
    let provider = OllamaProvider::new(settings.llm.base_url.clone(), settings.llm.model.clone());

    let mut registry = AgentToolRegistry::new();
    registry.register(Arc::new(QuerySinglesTool::new(store)));
    registry.register(Arc::new(TodayTool));

    let options = CompletionOptions {
        temperature: settings.llm.temperature,
        timeout: Duration::from_secs(settings.llm.timeout_secs),
    };

    CatalogAgent::new(Box::new(provider), registry, options, settings.max_iterations)
        .spawn(shutdown)
}
