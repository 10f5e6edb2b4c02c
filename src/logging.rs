//! Tracing setup: compact stdout output plus an optional non-blocking file sink.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "mjs-adapter.log";

/// `MJS_LOG_DIR`, or `.logs` under the working directory.
pub fn log_dir() -> PathBuf {
    std::env::var_os("MJS_LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".logs"))
}

/// Creates `dir` and, when `clean` is set, empties the log file left by the previous run.
pub fn prepare_log_dir(dir: &Path, clean: bool) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    if clean {
        std::fs::OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
    }
    Ok(path)
}

/// Installs the global subscriber. The returned guard flushes the file writer and must
/// live until shutdown; `None` means file logging is off.
pub fn init(dir: &Path, clean: bool) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter).with(fmt::layer().with_target(false).compact());

    match prepare_log_dir(dir, clean) {
        Ok(_) => {
            let (writer, guard) = tracing_appender::non_blocking(rolling::never(dir, LOG_FILE));
            registry.with(fmt::layer().with_ansi(false).with_target(false).with_writer(writer).compact()).init();
            Some(guard)
        }
        Err(e) => {
            registry.init();
            tracing::warn!(dir = %dir.display(), error = %e, "File logging disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_start_truncates_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let path = prepare_log_dir(&logs, false).unwrap();
        assert!(!path.exists(), "file is only touched when cleaning");

        std::fs::write(&path, "old run\n").unwrap();
        prepare_log_dir(&logs, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old run\n");

        prepare_log_dir(&logs, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unusable_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        assert!(prepare_log_dir(&blocker.join("logs"), true).is_err());
    }
}
