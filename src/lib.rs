pub mod agent;
pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod query;
pub mod server;
