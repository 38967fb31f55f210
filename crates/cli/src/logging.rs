//! stderr logging for the CLI.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! picks those records up through its `tracing-log` bridge.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// `RUST_LOG` wins when no `-v` is given; otherwise `-v` selects info and
/// `-vv` debug.
pub fn init(verbosity: u8) {
    let env_filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .without_time()
                .with_filter(env_filter),
        )
        .try_init();

    tracing::debug!("logging initialized at verbosity {verbosity}");
}
