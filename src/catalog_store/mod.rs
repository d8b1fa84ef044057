mod memory;
mod schema;
mod store;
mod trait_def;

pub use memory::InMemoryCatalogStore;
pub use store::SqliteCatalogStore;
pub use trait_def::{CatalogCounts, CatalogStore, UpsertOutcome};
