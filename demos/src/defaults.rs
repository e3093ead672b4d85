use testing_framework_core::IS_DEBUG_TRACING;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the fmt subscriber. `RUST_LOG` wins when set; otherwise `debug`
/// under debug tracing and `info` otherwise.
pub fn init_tracing() {
    let fallback = if *IS_DEBUG_TRACING { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
