//! Errors middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Config load (setup.rs):
//!     `errors` tokens → parse_errors → ErrorsConfig
//!     → frozen into Arc<ErrorPages>
//!     → startup hook registered (captures the same Arc)
//!     → ErrorsLayer returned
//!
//! Startup (log.rs, roller.rs, rolling.rs, syslog.rs):
//!     hook → ErrorLog::open(log_file, roller) → OnceLock::set
//!
//! Chain assembly (handler.rs):
//!     ErrorsLayer::layer(next) → ErrorHandler { Arc<ErrorPages>, next }
//!
//! Request:
//!     next → 4xx/5xx? → error page + error log line
//! ```

pub mod handler;
pub mod log;
pub mod roller;
pub mod rolling;
pub mod setup;
pub mod syslog;

pub use handler::{ErrorHandler, ErrorPages, ErrorsLayer, HandlerError};
pub use log::ErrorLog;
pub use roller::LogRoller;
pub use setup::{parse_errors, setup_errors, ErrorsConfig, DEFAULT_LOG_FILENAME};
