//! Log session of one CLI run.
//!
//! Everything logged through `tracing` goes to the console and, without
//! ANSI colors, into an in-memory [`CapturedLog`]. When the run ends,
//! [`LogSession::finish`] saves that capture to `<dir>/<program> <date>.log`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE_DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Shared byte buffer receiving formatted log lines.
#[derive(Clone, Default, Debug)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log buffer lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything captured so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// A plain subscriber writing only into this capture, for use with
    /// `tracing::subscriber::with_default`.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A panic while holding the lock leaves complete lines behind.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct LogSession {
    program: String,
    directory: PathBuf,
    captured: CapturedLog,
}

impl LogSession {
    /// Installs the global subscriber. `RUST_LOG` overrides the default `info` level.
    pub fn start(program: impl Into<String>, directory: impl Into<PathBuf>) -> Result<Self> {
        let captured = CapturedLog::new();
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(captured.clone())
                    .with_ansi(false)
                    .with_target(false),
            )
            .try_init()
            .context("failed to initialize tracing subscriber")?;

        Ok(LogSession {
            program: program.into(),
            directory: directory.into(),
            captured,
        })
    }

    /// Saves the captured log and returns the file written.
    pub fn finish(self) -> Result<PathBuf> {
        save_log(
            &self.directory,
            &self.program,
            &self.captured.contents(),
            Local::now(),
        )
    }
}

/// Writes `contents` to `<directory>/<program> <dd-mm-YYYY HH:MM>.log`,
/// creating the directory. A run in the same minute overwrites the file.
pub fn save_log(
    directory: &Path,
    program: &str,
    contents: &str,
    at: DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {:?}", directory))?;
    let path = directory.join(format!(
        "{} {}.log",
        program,
        at.format(LOG_FILE_DATE_FORMAT)
    ));
    fs::write(&path, contents).with_context(|| format!("failed to write log file {:?}", path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn capture_collects_events_without_colors() {
        let log = CapturedLog::new();
        tracing::subscriber::with_default(log.subscriber(), || {
            tracing::info!(token = "abc", "SPL transfer completed");
            tracing::warn!("SPL transfer failed");
        });

        let text = log.contents();
        assert!(text.contains("INFO"));
        assert!(text.contains("SPL transfer completed"));
        assert!(text.contains("token=\"abc\""));
        assert!(text.contains("WARN"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn log_file_is_named_after_program_and_minute() {
        let dir = tempfile::tempdir().unwrap();
        let at = Local.with_ymd_and_hms(2022, 3, 7, 9, 5, 42).unwrap();
        let path = save_log(&dir.path().join("logs"), "herbs", "line\n", at).unwrap();

        assert_eq!(
            path.file_name().and_then(|s| s.to_str()),
            Some("herbs 07-03-2022 09:05.log")
        );
        assert_eq!(fs::read_to_string(path).unwrap(), "line\n");
    }
}
