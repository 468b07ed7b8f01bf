//! Log sinks
//!
//! Two streams, access and error, each going to a standard stream or an
//! append-mode file. Installed once at startup; until then callers print
//! directly.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

enum Sink {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl Sink {
    /// `path` if given, otherwise the standard stream `fallback`
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        let Some(path) = path else {
            return Ok(fallback);
        };

        let path = Path::new(path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(Mutex::new(file)))
    }

    fn line(&self, message: &str) {
        // Logging never fails a request, so write errors are dropped
        match self {
            Self::Stdout => {
                let _ = writeln!(io::stdout().lock(), "{message}");
            }
            Self::Stderr => {
                let _ = writeln!(io::stderr().lock(), "{message}");
            }
            Self::File(file) => {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(file, "{message}");
            }
        }
    }
}

pub struct LogWriter {
    /// Access lines and lifecycle messages
    access: Sink,
    /// Warnings and errors
    error: Sink,
}

impl LogWriter {
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            access: Sink::open(access_log_file, Sink::Stdout)?,
            error: Sink::open(error_log_file, Sink::Stderr)?,
        })
    }

    pub fn write_access(&self, message: &str) {
        self.access.line(message);
    }

    pub fn write_error(&self, message: &str) {
        self.error.line(message);
    }
}

/// Install the process-wide writer; fails if a log file cannot be opened or
/// a writer is already installed
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file)?;
    LOG_WRITER
        .set(writer)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "log writer already installed"))
}

pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
