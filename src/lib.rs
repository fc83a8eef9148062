//! Static site server with configurable error pages.

pub mod config;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use errors::ErrorsLayer;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, StartupHooks};
