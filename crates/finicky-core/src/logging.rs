//! Logging init: one timestamped file per run, mirrored to stdout, or
//! graceful fallback to stdout only.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,finicky_core=debug,finicky=debug";

/// Writes every record to stdout and, when available, to the run's log file.
struct Tee {
    file: Option<fs::File>,
}

impl io::Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(f) = self.file.as_mut() {
            f.write_all(buf)?;
        }
        io::stdout().lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(f) = self.file.as_mut() {
            f.flush()?;
        }
        io::stdout().lock().flush()
    }
}

/// Platform log directory: `~/Library/Logs/Finicky` on macOS, the XDG state
/// directory elsewhere.
pub fn log_dir() -> Result<PathBuf> {
    if cfg!(target_os = "macos") {
        let home = dirs::home_dir().context("no home directory")?;
        return Ok(home.join("Library").join("Logs").join("Finicky"));
    }
    let xdg_dirs = xdg::BaseDirectories::with_prefix("finicky")?;
    Ok(xdg_dirs.get_state_home().join("finicky").join("logs"))
}

/// File name for a run started at `now`, e.g. `Finicky_2024-05-01_09-30-12.345.log`.
pub fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("Finicky_{}.log", now.format("%Y-%m-%d_%H-%M-%S%.3f"))
}

/// Initialize logging to a new per-run file, mirrored to stdout.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back.
pub fn init_logging() -> Result<PathBuf> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("create log dir {}", dir.display()))?;
    let log_file_path = dir.join(log_file_name(chrono::Local::now()));

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("open log file {}", log_file_path.display()))?;

    struct TeeMakeWriter(fs::File);

    impl<'a> MakeWriter<'a> for TeeMakeWriter {
        type Writer = Tee;

        fn make_writer(&'a self) -> Self::Writer {
            Tee {
                file: self.0.try_clone().ok(),
            }
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(TeeMakeWriter(file));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("logging to {}", log_file_path.display());

    Ok(log_file_path)
}

/// Initialize logging to stdout only. Use when init_logging() fails so the daemon still runs.
pub fn init_logging_stdout() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stdout)
        .with_ansi(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_file_name_includes_millisecond_timestamp() {
        let at = chrono::Local
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 12)
            .unwrap()
            + chrono::Duration::milliseconds(345);
        assert_eq!(log_file_name(at), "Finicky_2024-05-01_09-30-12.345.log");
    }

    #[test]
    fn tee_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let file = fs::File::create(&path).unwrap();
        let mut tee = Tee { file: Some(file) };
        tee.write_all(b"hello\n").unwrap();
        tee.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
