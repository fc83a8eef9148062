//! Error log sink.
//!
//! The destination named by the `errors` directive is resolved into an
//! [`ErrorLog`] exactly once, by the startup hook the directive registers.
//! Lines are written verbatim: no prefix, no timestamp. Callers format the
//! whole line themselves.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::errors::roller::LogRoller;
use crate::errors::syslog::SyslogWriter;
use crate::lifecycle::StartupError;

/// Tag attached to syslog messages.
pub const SYSLOG_TAG: &str = "errorpages";

/// Open a file for appending, creating it with mode 0644 if needed.
pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

/// A line-oriented writer shared by every request task.
pub struct ErrorLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl ErrorLog {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    /// Resolve a log destination into a sink.
    ///
    /// Returns `Ok(None)` for an empty destination: nothing is logged.
    pub fn open(log_file: &str, roller: Option<&LogRoller>) -> Result<Option<Self>, StartupError> {
        let log = match log_file {
            "" => return Ok(None),
            "stdout" => Self::new(io::stdout()),
            "stderr" => Self::new(io::stderr()),
            "syslog" => {
                Self::new(SyslogWriter::connect(SYSLOG_TAG).map_err(StartupError::Syslog)?)
            }
            path => {
                let open_err = |source| StartupError::OpenLog {
                    path: path.into(),
                    source,
                };
                let file = open_append(Path::new(path)).map_err(open_err)?;
                match roller {
                    Some(roller) => {
                        // The plain handle only proves the path is writable.
                        drop(file);
                        let mut policy = roller.clone();
                        policy.filename = path.into();
                        Self::new(policy.writer().map_err(open_err)?)
                    }
                    None => Self::new(file),
                }
            }
        };
        tracing::info!(log_file, rotating = roller.is_some(), "Error log opened");
        Ok(Some(log))
    }

    /// Write one line. Failures are reported through tracing and dropped.
    pub fn println(&self, line: &str) {
        let mut out = String::with_capacity(line.len() + 1);
        out.push_str(line);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        let mut sink = self.sink.lock();
        let written = sink.write_all(out.as_bytes());
        if let Err(e) = written.and_then(|()| sink.flush()) {
            tracing::warn!(error = %e, "Failed to write to error log");
        }
    }
}

impl std::fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_println_adds_newline_only() {
        let buf = Buffer::default();
        let log = ErrorLog::new(buf.clone());
        log.println("first");
        log.println("second\n");
        assert_eq!(&*buf.0.lock(), b"first\nsecond\n");
    }

    #[test]
    fn test_empty_destination_is_quiescent() {
        assert!(ErrorLog::open("", None).unwrap().is_none());
    }

    #[test]
    fn test_streams() {
        assert!(ErrorLog::open("stdout", None).unwrap().is_some());
        assert!(ErrorLog::open("stderr", None).unwrap().is_some());
    }

    #[test]
    fn test_plain_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        fs::write(&path, "existing\n").unwrap();

        let log = ErrorLog::open(path.to_str().unwrap(), None).unwrap().unwrap();
        log.println("appended");
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_created_with_0644() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.log");
        open_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // The process umask may clear bits but never adds any.
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o600, 0);
    }

    #[test]
    fn test_roller_takes_file_name_from_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolled.log");
        let roller = LogRoller {
            filename: "ignored.log".into(),
            max_size: 1024,
            ..LogRoller::default()
        };

        let log = ErrorLog::open(path.to_str().unwrap(), Some(&roller)).unwrap().unwrap();
        log.println("rolled line");
        assert_eq!(fs::read_to_string(&path).unwrap(), "rolled line\n");
        assert!(!dir.path().join("ignored.log").exists());
    }

    #[test]
    fn test_unwritable_path_is_fatal() {
        let err = ErrorLog::open("/no/such/dir/error.log", None).unwrap_err();
        assert!(matches!(err, StartupError::OpenLog { .. }));
    }
}
