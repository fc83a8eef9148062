//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → errors middleware (error pages, error log)
//!     → ServeDir over the document root
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;
