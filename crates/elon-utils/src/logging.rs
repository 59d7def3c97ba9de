//! Structured logging setup for the `elon` sidecar.
//!
//! Compact human-readable output by default; verbose mode adds
//! `cycle_id`/`spec_id`/target fields. `RUST_LOG` always wins when set.

use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the global tracing subscriber. Safe to call once at
/// process start; a second call is a no-op error that we swallow.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("elon=debug,info")
        } else {
            EnvFilter::new("elon=info,warn")
        }
    });

    let layer = fmt::layer()
        .with_target(verbose)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init();
}
