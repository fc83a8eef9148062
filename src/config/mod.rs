//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! directive file (site.directives)
//!     → lexer.rs → dispenser.rs
//!     → controller.rs (dispatch to directive setup)
//!     → Site (layers + startup hooks)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Directive errors carry file and line of the offending token

pub mod controller;
pub mod dispenser;
pub mod lexer;
pub mod loader;
pub mod schema;
pub mod validation;

pub use controller::{load_site, parse_site, Controller, Site};
pub use dispenser::{Dispenser, ParseError};
pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, ServerConfig, SiteConfig, TimeoutConfig};
