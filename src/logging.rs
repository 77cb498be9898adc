//! Tracing setup shared by both binaries.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive: `debug` when requested, `info` otherwise.
pub fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install a stdout `fmt` subscriber. `RUST_LOG` overrides the default level.
///
/// The MTA captures the script's stdout into its own log, so there is no
/// file layer.
pub fn setup(debug: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init();
}
