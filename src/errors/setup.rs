//! `errors` directive setup.
//!
//! # Grammar
//! ```text
//! errors                      # log to error.log
//! errors /var/log/errors.txt  # log to the given destination
//! errors {
//!     404 /404.html           # status code → page, relative to the root
//!     500 /500.html
//!     log stdout | stderr | syslog | <file> [ { size 10MB  age 14  keep 5 } ]
//! }
//! ```
//!
//! Parsing fills an [`ErrorsConfig`]. Setup then freezes it into the shared
//! [`ErrorPages`], registers the startup hook that binds the log sink, and
//! hands back the [`ErrorsLayer`] that places the handler in the chain.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::config::controller::Controller;
use crate::config::dispenser::ParseError;
use crate::errors::handler::{ErrorPages, ErrorsLayer};
use crate::errors::roller::{parse_roller, LogRoller};

/// Log destination used by the bare `errors` form without an argument.
pub const DEFAULT_LOG_FILENAME: &str = "error.log";

/// Mutable, parse-time view of an `errors` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorsConfig {
    pub error_pages: HashMap<u16, PathBuf>,
    /// `""` means no log; otherwise `stdout`, `stderr`, `syslog` or a path.
    pub log_file: String,
    pub log_roller: Option<LogRoller>,
}

/// Set up the errors middleware for the directive under the controller.
///
/// The startup hook is registered even when parsing fails; it then acts on
/// whatever was parsed before the error. A parse error aborts configuration
/// loading, so in practice the hook never runs in that case.
pub fn setup_errors(c: &mut Controller<'_>) -> Result<ErrorsLayer, ParseError> {
    let mut config = ErrorsConfig::default();
    let parsed = parse_errors(c, &mut config);

    let pages = Arc::new(ErrorPages::new(config));
    let shared = Arc::clone(&pages);
    c.startup().register(move || shared.open_log());

    parsed?;
    Ok(ErrorsLayer::new(pages))
}

/// Parse every occurrence of the directive into `config`.
///
/// On error, `config` keeps whatever was parsed up to that point.
pub fn parse_errors(c: &mut Controller<'_>, config: &mut ErrorsConfig) -> Result<(), ParseError> {
    while c.next() {
        // A closing brace left over from a previous block is not a directive.
        // Site files never get here (grouping rejects a top-level `}`); this
        // covers dispensers built directly from source.
        if c.val() == "}" {
            continue;
        }

        if c.block_follows() {
            parse_block(c, config)?;
            continue;
        }

        if c.next_arg() {
            config.log_file = c.val().to_string();
            if c.next_arg() {
                return Err(c.arg_err());
            }
        } else {
            config.log_file = DEFAULT_LOG_FILENAME.to_string();
        }
    }
    Ok(())
}

fn parse_block(c: &mut Controller<'_>, config: &mut ErrorsConfig) -> Result<(), ParseError> {
    while c.next_block() {
        let what = c.val().to_string();
        if !c.next_arg() {
            return Err(c.arg_err());
        }
        let place = c.val().to_string();

        if what == "log" {
            config.log_file = place;
            if c.block_follows() {
                c.next_arg();
                c.incr_nest();
                let mut roller = parse_roller(c)?;
                roller.filename = PathBuf::from(&config.log_file);
                config.log_roller = Some(roller);
            } else {
                reject_extra_args(c)?;
            }
            continue;
        }

        let status: u16 = what.parse().map_err(|_| {
            c.err(format!(
                "Expecting a numeric status code, got '{}'",
                what
            ))
        })?;
        reject_extra_args(c)?;

        let page = join_root(c.root(), &place);
        if let Err(e) = probe_page(&page) {
            tracing::warn!(
                page = %page.display(),
                "Warning: Unable to open error page '{}': {}",
                page.display(),
                e
            );
        }
        config.error_pages.insert(status, page);
    }
    Ok(())
}

/// Fail on a surplus argument. A `}` closing the block on the same line is
/// left for `next_block`.
fn reject_extra_args(c: &mut Controller<'_>) -> Result<(), ParseError> {
    let surplus = matches!(c.peek_arg(), Some(token) if token != "}");
    if surplus {
        c.next_arg();
        return Err(c.arg_err());
    }
    Ok(())
}

/// Join a page path onto the document root.
///
/// The page is always treated as relative to the root, and `.`/`..` are
/// resolved lexically.
fn join_root(root: &Path, page: &str) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in Path::new(page).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::ParentDir => {
                joined.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    joined
}

/// Check that an error page can be opened. Nothing is read.
fn probe_page(page: &Path) -> io::Result<()> {
    File::open(page).map(drop)
}
