mod assistant_routes;
mod catalog_routes;
pub mod config;
mod http_layers;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;

use assistant_routes::assistant_routes;
use catalog_routes::catalog_routes;
pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
