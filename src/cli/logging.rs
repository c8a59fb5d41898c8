//! Logging initialization

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr
///
/// `RUST_LOG` takes precedence. Otherwise only warnings are shown, or
/// everything from debug up when `debug` is set.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };

    // stdout carries the report, so logs never go there
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .init();
}
