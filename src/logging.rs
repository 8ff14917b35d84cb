//! Tracing setup shared by the server and the batch tool.
//!
//! Everything goes to stdout; a second, ANSI-free layer appends to the file chosen by
//! [`LogDestination`].
use std::path::Path;
use std::sync::OnceLock;

use crate::config::LogDestination;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "kbgateway.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. `RUST_LOG` filters both layers (default `info`).
pub fn init_tracing(destination: &LogDestination) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = file_writer(destination).map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}

fn file_writer(destination: &LogDestination) -> Option<NonBlocking> {
    let opened = match destination {
        LogDestination::Disabled => return None,
        LogDestination::Default => std::fs::create_dir_all(DEFAULT_LOG_DIR)
            .map(|()| tracing_appender::rolling::never(DEFAULT_LOG_DIR, DEFAULT_LOG_FILE))
            .map(tracing_appender::non_blocking),
        LogDestination::File(path) => open_append(path).map(tracing_appender::non_blocking),
    };
    match opened {
        Ok((writer, guard)) => {
            let _ = LOG_GUARD.set(guard);
            Some(writer)
        }
        Err(err) => {
            // The subscriber is not installed yet.
            eprintln!("File logging disabled ({destination:?}): {err}");
            None
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::file_writer;
    use crate::config::LogDestination;

    #[test]
    fn disabled_destination_has_no_file_writer() {
        assert!(file_writer(&LogDestination::Disabled).is_none());
    }

    #[test]
    fn explicit_file_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateway.log");
        assert!(file_writer(&LogDestination::File(path.clone())).is_some());
        assert!(path.exists());
    }

    #[test]
    fn unopenable_file_falls_back_to_stdout_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("gateway.log");
        assert!(file_writer(&LogDestination::File(path)).is_none());
    }
}
