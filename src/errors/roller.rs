//! Log rotation policy.
//!
//! A `log <file> { ... }` line inside an `errors` block may carry a nested
//! block describing when the file rotates:
//!
//! ```text
//! log /var/log/site/error.log {
//!     size 10MB   # rotate once the file would exceed this size
//!     age  14     # delete backups older than this many days
//!     keep 5      # keep at most this many backups
//! }
//! ```
//!
//! The filename is never read from the sub-block; the caller binds it from
//! the `log` line once both are known.

use std::path::PathBuf;

use crate::config::dispenser::{Dispenser, ParseError};
use crate::errors::rolling::RollingWriter;

const MEGABYTE: u64 = 1024 * 1024;

/// Size used when the policy does not name one.
pub const DEFAULT_MAX_SIZE: u64 = 100 * MEGABYTE;

/// Rotation parameters for a file-backed error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRoller {
    pub filename: PathBuf,
    /// Maximum file size in bytes before rotating. Zero means the default.
    pub max_size: u64,
    /// Maximum age of a backup in days. Zero keeps backups regardless of age.
    pub max_age: u32,
    /// Maximum number of backups. Zero keeps every backup.
    pub max_backups: usize,
    /// Name backups using local time instead of UTC.
    pub local_time: bool,
}

impl Default for LogRoller {
    fn default() -> Self {
        Self {
            filename: PathBuf::new(),
            max_size: 0,
            max_age: 0,
            max_backups: 0,
            local_time: true,
        }
    }
}

impl LogRoller {
    /// Effective size threshold in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        if self.max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            self.max_size
        }
    }

    /// Open a rotation-aware writer over `filename`.
    pub fn writer(&self) -> std::io::Result<RollingWriter> {
        RollingWriter::open(self.clone())
    }
}

/// Parse a roller sub-block.
///
/// The dispenser must already be inside the block (the caller consumed `{`
/// and called `incr_nest`). Returns once the matching `}` is reached.
pub fn parse_roller(c: &mut Dispenser) -> Result<LogRoller, ParseError> {
    let mut roller = LogRoller::default();

    while c.next_block() {
        let what = c.val().to_string();
        if !c.next_arg() {
            return Err(c.arg_err());
        }
        let value = c.val().to_string();

        match what.as_str() {
            "size" => {
                roller.max_size = parse_size(&value).ok_or_else(|| {
                    c.err(format!("Invalid rotation size '{}'", value))
                })?;
            }
            "age" => {
                roller.max_age = value.parse().map_err(|_| {
                    c.err(format!("Expecting a number of days for age, got '{}'", value))
                })?;
            }
            "keep" => {
                roller.max_backups = value.parse().map_err(|_| {
                    c.err(format!("Expecting a backup count for keep, got '{}'", value))
                })?;
            }
            other => {
                tracing::warn!(
                    file = c.file(),
                    line = c.line(),
                    option = other,
                    "Ignoring unknown log rotation option"
                );
            }
        }
    }

    Ok(roller)
}

/// Parse a rotation size. Bare numbers are megabytes.
fn parse_size(value: &str) -> Option<u64> {
    let s = value.trim().to_uppercase();

    if let Ok(num) = s.parse::<u64>() {
        return num.checked_mul(MEGABYTE);
    }

    let pos = s.find(|c: char| !c.is_ascii_digit())?;
    let (num_str, unit) = s.split_at(pos);
    let num: u64 = num_str.parse().ok()?;

    let multiplier = match unit.trim() {
        "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => MEGABYTE,
        "G" | "GB" | "GIB" => 1024 * MEGABYTE,
        _ => return None,
    };

    num.checked_mul(multiplier)
}
