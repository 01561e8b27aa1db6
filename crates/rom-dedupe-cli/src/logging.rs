use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/rom-dedupe.log";

/// Default filter when `TRACING_LEVEL` is unset.
fn default_level(debug: bool, quiet: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Log to stderr and to `LOG_FILE_PATH`. Keep the returned guard alive until
/// exit so buffered file output is flushed.
pub fn init_logger(debug: bool, quiet: bool) -> impl Drop {
    let filter =
        env::var("TRACING_LEVEL").unwrap_or_else(|_| default_level(debug, quiet).to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path =
        PathBuf::from(env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()));
    let log_dir = log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let log_name = log_file_path
        .file_name()
        .unwrap_or_else(|| OsStr::new("rom-dedupe.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    debug!("Logging to stderr and {}", log_file_path.display());

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), "info");
        assert_eq!(default_level(false, true), "warn");
        assert_eq!(default_level(true, true), "debug");
    }
}
