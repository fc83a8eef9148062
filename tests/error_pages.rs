//! Request-time behaviour of the errors middleware.

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use errorpages::errors::{ErrorsLayer, HandlerError};

mod common;

async fn boom() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn refused() -> Response {
    let mut response = StatusCode::BAD_GATEWAY.into_response();
    response
        .extensions_mut()
        .insert(HandlerError("upstream refused connection".into()));
    response
}

async fn teapot() -> (StatusCode, &'static str) {
    (StatusCode::IM_A_TEAPOT, "short and stout")
}

async fn panics() -> StatusCode {
    panic!("handler exploded")
}

/// Build a layer from directive text and run its startup hook.
fn started_layer(input: &str, root: &Path) -> ErrorsLayer {
    let (layer, hooks) = common::setup_directive(input, root);
    hooks.run().unwrap();
    layer.unwrap()
}

fn app(layer: ErrorsLayer) -> Router {
    Router::new()
        .route("/boom", get(boom))
        .route("/refused", get(refused))
        .route("/teapot", get(teapot))
        .route("/panic", get(panics))
        .layer(layer)
}

async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_configured_page_replaces_body() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("500.html"), "<h1>our fault</h1>").unwrap();
    let layer = started_layer("errors {\n 500 500.html\n}", root.path());

    let (status, body) = get_path(app(layer), "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "<h1>our fault</h1>");
}

#[tokio::test]
async fn test_unconfigured_status_passes_through() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("500.html"), "<h1>our fault</h1>").unwrap();
    let layer = started_layer("errors {\n 500 500.html\n}", root.path());

    let (status, body) = get_path(app(layer), "/teapot").await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body, "short and stout");
}

#[tokio::test]
async fn test_server_errors_are_logged() {
    let root = tempfile::tempdir().unwrap();
    let log_path = root.path().join("error.log");
    let input = format!("errors {{\n log \"{}\"\n}}", log_path.display());
    let layer = started_layer(&input, root.path());

    get_path(app(layer.clone()), "/boom").await;
    get_path(app(layer), "/refused").await;

    let log = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[ERROR 500 /boom] Internal Server Error"));
    assert!(lines[1].ends_with("[ERROR 502 /refused] upstream refused connection"));
}

#[tokio::test]
async fn test_log_lines_carry_full_uri() {
    let root = tempfile::tempdir().unwrap();
    let log_path = root.path().join("error.log");
    let input = format!(
        "errors {{\n 418 missing.html\n log \"{}\"\n}}",
        log_path.display()
    );
    let layer = started_layer(&input, root.path());

    get_path(app(layer.clone()), "/boom?retry=1").await;
    get_path(app(layer), "/teapot?cup=2").await;

    let log = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("[ERROR 500 /boom?retry=1]"));
    assert!(lines[1].contains("[NOTICE 418 /teapot?cup=2]"));
}

#[tokio::test]
async fn test_client_errors_are_not_logged() {
    let root = tempfile::tempdir().unwrap();
    let log_path = root.path().join("error.log");
    let input = format!("errors {{\n log \"{}\"\n}}", log_path.display());
    let layer = started_layer(&input, root.path());

    get_path(app(layer), "/teapot").await;
    assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
}

#[tokio::test]
async fn test_unreadable_page_falls_back_and_notices() {
    let root = tempfile::tempdir().unwrap();
    let log_path = root.path().join("error.log");
    let input = format!(
        "errors {{\n 418 missing.html\n log \"{}\"\n}}",
        log_path.display()
    );
    let layer = started_layer(&input, root.path());

    let (status, body) = get_path(app(layer), "/teapot").await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body, "short and stout");

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("[NOTICE 418 /teapot] could not load error page"));
}

#[tokio::test]
async fn test_panic_is_recovered() {
    let root = tempfile::tempdir().unwrap();
    let log_path = root.path().join("error.log");
    let input = format!("errors {{\n log \"{}\"\n}}", log_path.display());
    let layer = started_layer(&input, root.path());

    let (status, body) = get_path(app(layer), "/panic").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("[PANIC /panic] handler exploded"));
}

#[tokio::test]
async fn test_end_to_end_not_found_page() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("index.html"), "welcome").unwrap();
    fs::write(root.path().join("404.html"), "<p>no such page</p>").unwrap();
    let layer = started_layer("errors {\n 404 /404.html\n}", root.path());

    let (addr, shutdown) = common::start_server(root.path(), Some(layer)).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{}/index.html", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "welcome");

    let res = client
        .get(format!("http://{}/nope.html", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 404);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "<p>no such page</p>");

    shutdown.trigger();
}
