use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Already installed (tests, repeated init): keep the existing one.
    let _ = Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
