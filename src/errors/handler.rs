//! Request-time error handling middleware.
//!
//! # Responsibilities
//! - Replace 4xx/5xx responses with the configured error page
//! - Log server errors and recovered panics to the error log
//!
//! # Design Decisions
//! - One `Arc<ErrorPages>` per directive, shared by the startup hook and
//!   every `ErrorHandler` the layer produces
//! - The log sink is a `OnceLock`: written by the startup hook, read-only after
//! - Responses without a configured page pass through untouched

use std::collections::HashMap;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tower::{Layer, Service};

use crate::errors::log::ErrorLog;
use crate::errors::roller::LogRoller;
use crate::errors::setup::ErrorsConfig;
use crate::lifecycle::StartupError;
use crate::observability::metrics;

const TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Detail a downstream handler can attach to a 5xx response; it is written
/// to the error log in place of the status reason.
#[derive(Debug, Clone)]
pub struct HandlerError(pub String);

/// Sealed, shared state of one `errors` directive.
#[derive(Debug)]
pub struct ErrorPages {
    pages: HashMap<u16, PathBuf>,
    log_file: String,
    log_roller: Option<LogRoller>,
    log: OnceLock<ErrorLog>,
}

impl ErrorPages {
    /// Freeze a parsed configuration.
    pub fn new(config: ErrorsConfig) -> Self {
        Self {
            pages: config.error_pages,
            log_file: config.log_file,
            log_roller: config.log_roller,
            log: OnceLock::new(),
        }
    }

    pub fn page(&self, status: u16) -> Option<&Path> {
        self.pages.get(&status).map(PathBuf::as_path)
    }

    pub fn pages(&self) -> &HashMap<u16, PathBuf> {
        &self.pages
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn log_roller(&self) -> Option<&LogRoller> {
        self.log_roller.as_ref()
    }

    /// The bound sink, once startup hooks have run.
    pub fn log(&self) -> Option<&ErrorLog> {
        self.log.get()
    }

    /// Resolve the log destination and bind the sink. Runs once, at startup.
    pub fn open_log(&self) -> Result<(), StartupError> {
        match ErrorLog::open(&self.log_file, self.log_roller.as_ref())? {
            Some(log) => self
                .log
                .set(log)
                .map_err(|_| StartupError::LogAlreadyBound),
            None => Ok(()),
        }
    }

    fn log_line(&self, line: &str) {
        match self.log.get() {
            Some(log) => log.println(line),
            None if !self.log_file.is_empty() => {
                tracing::error!(
                    log_file = %self.log_file,
                    "Error log used before startup hooks ran"
                );
            }
            None => {}
        }
    }

    async fn respond(&self, uri: &str, response: Response) -> Response {
        let status = response.status();

        if status.is_server_error() {
            let reason = response
                .extensions()
                .get::<HandlerError>()
                .map(|e| e.0.clone())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            self.log_line(&format!(
                "{} [ERROR {} {}] {}",
                timestamp(),
                status.as_u16(),
                uri,
                reason
            ));
        }

        if !(status.is_client_error() || status.is_server_error()) {
            return response;
        }
        let Some(page) = self.page(status.as_u16()) else {
            return response;
        };

        match tokio::fs::read(page).await {
            Ok(body) => {
                metrics::record_error_page(status.as_u16());
                let mut replaced = Response::new(Body::from(body));
                *replaced.status_mut() = status;
                replaced
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type(page));
                replaced
            }
            Err(e) => {
                self.log_line(&format!(
                    "{} [NOTICE {} {}] could not load error page: {}",
                    timestamp(),
                    status.as_u16(),
                    uri,
                    e
                ));
                response
            }
        }
    }

    fn recover(&self, uri: &str, panic: Box<dyn std::any::Any + Send>) -> Response {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        metrics::record_panic();
        self.log_line(&format!("{} [PANIC {}] {}", timestamp(), uri, message));

        let mut response = Response::new(Body::from("Internal Server Error"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    }
}

fn timestamp() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}

fn content_type(page: &Path) -> HeaderValue {
    match page.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => HeaderValue::from_static("text/html; charset=utf-8"),
        _ => HeaderValue::from_static("text/plain; charset=utf-8"),
    }
}

/// Binds the shared [`ErrorPages`] to the next service in the chain.
#[derive(Debug, Clone)]
pub struct ErrorsLayer {
    pages: Arc<ErrorPages>,
}

impl ErrorsLayer {
    pub fn new(pages: Arc<ErrorPages>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &Arc<ErrorPages> {
        &self.pages
    }
}

impl<S> Layer<S> for ErrorsLayer {
    type Service = ErrorHandler<S>;

    fn layer(&self, next: S) -> Self::Service {
        ErrorHandler {
            pages: Arc::clone(&self.pages),
            next,
        }
    }
}

/// The errors middleware for one position in the chain.
#[derive(Debug, Clone)]
pub struct ErrorHandler<S> {
    pages: Arc<ErrorPages>,
    next: S,
}

impl<S> Service<Request<Body>> for ErrorHandler<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The clone is not necessarily ready; keep the one that was polled.
        let clone = self.next.clone();
        let mut next = std::mem::replace(&mut self.next, clone);
        let pages = Arc::clone(&self.pages);
        let uri = req.uri().to_string();

        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { next.call(req).await })
                .catch_unwind()
                .await;
            let response = match outcome {
                Ok(Ok(response)) => response,
                Ok(Err(never)) => match never {},
                Err(panic) => return Ok(pages.recover(&uri, panic)),
            };
            Ok(pages.respond(&uri, response).await)
        })
    }
}
