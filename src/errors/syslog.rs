//! Minimal syslog client.
//!
//! Sends each written line as one datagram to the local syslog socket with
//! facility local0 and severity err: `<131>tag[pid]: message`.

use std::io::{self, Write};

/// local0 (16) * 8 + err (3)
const PRIORITY: u8 = 131;

#[cfg(unix)]
const SOCKET_PATHS: &[&str] = &["/dev/log", "/var/run/syslog", "/var/run/log"];

/// Writer that forwards each line to syslog.
#[derive(Debug)]
pub struct SyslogWriter {
    #[cfg(unix)]
    socket: std::os::unix::net::UnixDatagram,
    tag: String,
    pid: u32,
}

impl SyslogWriter {
    /// Connect to the first reachable local syslog socket.
    #[cfg(unix)]
    pub fn connect(tag: &str) -> io::Result<Self> {
        use std::os::unix::net::UnixDatagram;

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no syslog socket found");
        for path in SOCKET_PATHS {
            let socket = UnixDatagram::unbound()?;
            match socket.connect(path) {
                Ok(()) => {
                    return Ok(Self {
                        socket,
                        tag: tag.to_string(),
                        pid: std::process::id(),
                    })
                }
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    #[cfg(not(unix))]
    pub fn connect(_tag: &str) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "syslog is only available on unix",
        ))
    }

    fn format(&self, message: &str) -> String {
        format!("<{}>{}[{}]: {}", PRIORITY, self.tag, self.pid, message)
    }
}

impl Write for SyslogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let message = String::from_utf8_lossy(buf);
        let packet = self.format(message.trim_end_matches('\n'));
        #[cfg(unix)]
        self.socket.send(packet.as_bytes())?;
        #[cfg(not(unix))]
        let _ = packet;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
