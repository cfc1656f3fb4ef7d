use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global fmt subscriber. `RUST_LOG` wins over `log_level` when set.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding); keep it.
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
        return;
    }

    tracing::info!(log_level = %config.log_level, "tracing initialized");
}
