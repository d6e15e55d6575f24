use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Installs the global subscriber: `fmt` output filtered by `RUST_LOG`,
/// defaulting to `INFO`. Panics if a subscriber is already installed.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter())
        .init();
    tracing::info!("Logger initialized successfully.");
}

/// Like [`init_tracing`] but reports an already-installed subscriber instead
/// of panicking. Output goes through the test writer so `cargo test`
/// captures it.
pub fn try_init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(env_filter())
        .try_init()
}
