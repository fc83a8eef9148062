//! Size-triggered rotating file writer.
//!
//! # Responsibilities
//! - Append to the configured log file
//! - Move the file aside to a timestamped backup once it would grow past
//!   the size threshold
//! - Prune backups by count and by age after each rotation
//!
//! # Design Decisions
//! - Not internally synchronised; `ErrorLog` serialises writers behind a mutex
//! - Backups live next to the file: `error.log` → `error-2024-05-01T10-00-00.000.log`

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime, Utc};

use crate::errors::log::open_append;
use crate::errors::roller::LogRoller;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Writer that rotates its file according to a [`LogRoller`] policy.
#[derive(Debug)]
pub struct RollingWriter {
    policy: LogRoller,
    file: File,
    size: u64,
}

impl RollingWriter {
    /// Open (or create) the policy's file for appending.
    pub fn open(policy: LogRoller) -> io::Result<Self> {
        if let Some(dir) = policy.filename.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = open_append(&policy.filename)?;
        let size = file.metadata()?.len();
        Ok(Self { policy, file, size })
    }

    pub fn policy(&self) -> &LogRoller {
        &self.policy
    }

    fn now(&self) -> NaiveDateTime {
        if self.policy.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    /// Split `dir/stem.ext` into its parts. `ext` keeps the leading dot.
    fn name_parts(&self) -> (PathBuf, String, String) {
        let path = &self.policy.filename;
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (dir, stem, ext)
    }

    fn backup_path(&self, at: NaiveDateTime) -> PathBuf {
        let (dir, stem, ext) = self.name_parts();
        dir.join(format!("{}-{}{}", stem, at.format(BACKUP_TIME_FORMAT), ext))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let backup = self.backup_path(self.now());
        fs::rename(&self.policy.filename, &backup)?;
        self.file = open_append(&self.policy.filename)?;
        self.size = 0;
        tracing::debug!(backup = %backup.display(), "Rotated error log");
        self.prune()
    }

    /// Existing backups, newest first.
    fn backups(&self) -> io::Result<Vec<(NaiveDateTime, PathBuf)>> {
        let (dir, stem, ext) = self.name_parts();
        let prefix = format!("{}-", stem);
        let mut found = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(ext.as_str()))
            else {
                continue;
            };
            if let Ok(at) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                found.push((at, entry.path()));
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found)
    }

    fn prune(&self) -> io::Result<()> {
        let mut backups = self.backups()?;

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            for (_, path) in backups.split_off(self.policy.max_backups) {
                fs::remove_file(path)?;
            }
        }

        if self.policy.max_age > 0 {
            let cutoff = self.now() - Duration::days(i64::from(self.policy.max_age));
            for (at, path) in backups {
                if at < cutoff {
                    fs::remove_file(path)?;
                }
            }
        }

        Ok(())
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let incoming = buf.len() as u64;
        if self.size > 0 && self.size + incoming > self.policy.max_size_bytes() {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
