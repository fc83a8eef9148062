//! Startup orchestration.
//!
//! # Responsibilities
//! - Collect deferred initializers registered while directives are parsed
//! - Run them once, in registration order, before listeners bind
//!
//! # Design Decisions
//! - Fail fast: the first hook error aborts startup
//! - `run` consumes the registry, so a hook can never run twice
//! - Listeners start last (traffic only when ready)

use std::fmt;
use std::path::PathBuf;

/// Fatal error raised by a startup hook.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("unable to connect to syslog: {0}")]
    Syslog(#[source] std::io::Error),

    #[error("unable to open log file {path}: {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error log already bound")]
    LogAlreadyBound,
}

type Hook = Box<dyn FnOnce() -> Result<(), StartupError> + Send>;

/// Ordered list of callbacks that run before the server accepts traffic.
#[derive(Default)]
pub struct StartupHooks {
    hooks: Vec<Hook>,
}

impl StartupHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook. Hooks run in the order they were registered.
    pub fn register<F>(&mut self, hook: F)
    where
        F: FnOnce() -> Result<(), StartupError> + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook once, stopping at the first error.
    pub fn run(self) -> Result<(), StartupError> {
        let total = self.hooks.len();
        for (i, hook) in self.hooks.into_iter().enumerate() {
            tracing::debug!(hook = i + 1, total, "Running startup hook");
            hook()?;
        }
        Ok(())
    }
}

impl fmt::Debug for StartupHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartupHooks")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
