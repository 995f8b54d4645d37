//! Tracing setup: console plus an append-only log file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file used when `LOG_FILE` is not set.
pub const DEFAULT_LOG_FILE: &str = "axewatch.log";

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "axewatch_agent=info,axewatch_events=info,axewatch_core=info";

/// Install the global subscriber.
///
/// Must run before configuration is loaded so configuration errors are
/// logged. A log file that cannot be opened downgrades to console-only
/// logging rather than aborting startup.
pub fn init() {
    let log_path = std::env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.into());

    let (file_layer, file_error) = match open_log_file(Path::new(&log_path)) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(path = %log_path, error = %e, "Could not open log file, logging to console only");
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn log_file_is_appended_not_truncated() {
        let path = std::env::temp_dir().join(format!("axewatch-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unopenable_path_is_an_error() {
        let dir = std::env::temp_dir();
        assert!(open_log_file(&dir).is_err());
    }
}
