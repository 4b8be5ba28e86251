//! Log sink shared by the worker threads of one dispatch run.
//!
//! All log lines go through a single non-blocking writer into one file named
//! `geomatch-worker-<timestamp>.log`. Nothing is installed globally: each
//! thread that should log into the file installs a thread-scoped subscriber
//! from a [`LogHandle`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use geomatch_core::error::Result;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// File name prefix of worker logs
pub const LOG_FILE_PREFIX: &str = "geomatch-worker-";

/// File name for a log started now, e.g. `geomatch-worker-19-October-2026-02-15PM.log`
pub fn log_file_name() -> String {
    format!("{}.log", log_file_stem())
}

fn log_file_stem() -> String {
    format!("{}{}", LOG_FILE_PREFIX, chrono::Local::now().format("%d-%B-%Y-%I-%M%p"))
}

/// An open log file and the background writer feeding it.
///
/// Stopping the sink, or dropping it, flushes every queued line.
pub struct LogSink {
    path: PathBuf,
    writer: NonBlocking,
    _guard: WorkerGuard,
}

impl LogSink {
    /// Start a sink in `log_dir`, or the working directory when `None`.
    ///
    /// Runs started within the same minute append to the same file.
    pub fn start(log_dir: Option<&Path>) -> Result<Self> {
        let dir = log_dir.unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let stem = log_file_stem();
        let path = dir.join(format!("{stem}.log"));
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(stem)
            .filename_suffix("log")
            .build(dir)
            .map_err(io::Error::other)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        Ok(Self { path, writer, _guard: guard })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A cloneable handle for threads that log into this sink
    pub fn handle(&self) -> LogHandle {
        LogHandle { writer: self.writer.clone() }
    }

    /// Flush and close the log file
    pub fn stop(self) {
        tracing::debug!(path = %self.path.display(), "Stopping log sink");
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").field("path", &self.path).finish()
    }
}

/// Writer end of a [`LogSink`], passed to each worker thread
#[derive(Clone)]
pub struct LogHandle {
    writer: NonBlocking,
}

impl LogHandle {
    /// Route this thread's log lines into the sink until the guard drops.
    ///
    /// The level filter comes from `RUST_LOG` and defaults to `info`.
    pub fn install(&self) -> DefaultGuard {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.writer.clone())
            .with_ansi(false)
            .with_thread_names(true)
            .with_env_filter(filter)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle").finish_non_exhaustive()
    }
}
