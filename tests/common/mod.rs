//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;

use errorpages::config::{Controller, Dispenser, ParseError, ServerConfig};
use errorpages::errors::{parse_errors, setup_errors, ErrorsConfig, ErrorsLayer};
use errorpages::{HttpServer, Shutdown, StartupHooks};
use tokio::net::TcpListener;

/// Parse a single `errors` directive against `root`.
#[allow(dead_code)]
pub fn parse_directive(input: &str, root: &Path) -> (ErrorsConfig, Result<(), ParseError>) {
    let mut hooks = StartupHooks::new();
    let dispenser = Dispenser::from_source("site.conf", input).unwrap();
    let mut c = Controller::new(dispenser, root, &mut hooks);
    let mut config = ErrorsConfig::default();
    let result = parse_errors(&mut c, &mut config);
    (config, result)
}

/// Run directive setup, returning the layer (if parsing succeeded) and the
/// registered startup hooks.
#[allow(dead_code)]
pub fn setup_directive(input: &str, root: &Path) -> (Result<ErrorsLayer, ParseError>, StartupHooks) {
    let mut hooks = StartupHooks::new();
    let dispenser = Dispenser::from_source("site.conf", input).unwrap();
    let result = {
        let mut c = Controller::new(dispenser, root, &mut hooks);
        setup_errors(&mut c)
    };
    (result, hooks)
}

/// Start a server for `root` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(root: &Path, errors: Option<ErrorsLayer>) -> (SocketAddr, Shutdown) {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.site.root = root.to_path_buf();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();

    let server = HttpServer::new(config, errors);
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    (addr, shutdown)
}
