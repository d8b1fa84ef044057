use axum::extract::FromRef;

use crate::agent::AgentHandle;
use crate::catalog_store::CatalogStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type OptionalAgentHandle = Option<AgentHandle>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub agent: OptionalAgentHandle,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        agent: OptionalAgentHandle,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            agent,
        }
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for OptionalAgentHandle {
    fn from_ref(input: &ServerState) -> Self {
        input.agent.clone()
    }
}
