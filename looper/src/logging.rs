//! Development-time tracing for debugging the loop controller.
//!
//! Tracing is dev diagnostics only, driven by `RUST_LOG` and written to
//! stderr. Product artifacts (the progress log, archives, the task list)
//! are always written and are unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn` if unset. Output goes to stderr in
/// compact format so it interleaves cleanly with streamed agent output.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
