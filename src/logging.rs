use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{LOG_DIR, LOG_FILE_PREFIX};

/// Initializes logging to the console (stderr) and a daily JSON log file.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `info`, or `debug` when
/// the debug flag is on so that widget diagnostics show up.
pub fn init_logging(debug: bool) {
    // Ensure logs directory exists
    let _ = fs::create_dir_all(LOG_DIR);

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // stdout carries command output, so the console layer goes to stderr
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("review_confidence={}", default_level)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the guard alive so the file writer flushes on exit
    std::mem::forget(guard);
}
