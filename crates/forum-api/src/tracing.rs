//! Tracing and logging configuration.
//!
//! Development gets pretty, colored logs at debug level; production gets
//! flattened JSON lines at info level for log aggregation. `RUST_LOG` always
//! wins over the defaults (e.g. `RUST_LOG=debug,tower_http=trace`).

use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

use crate::config::Environment;

const DEVELOPMENT_DIRECTIVES: &str = "debug,tower_http=debug,sqlx=warn";
const PRODUCTION_DIRECTIVES: &str = "info,tower_http=info,sqlx=warn";

fn env_filter(env: Environment) -> EnvFilter {
    let defaults = if env.is_development() {
        DEVELOPMENT_DIRECTIVES
    } else {
        PRODUCTION_DIRECTIVES
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(defaults))
}

/// Install the global subscriber for `env`.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(env: Environment) -> Result<(), TryInitError> {
    let filter = env_filter(env);

    if env.is_development() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .pretty()
                    .with_filter(filter),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(filter),
            )
            .try_init()?;
    }

    tracing::info!(environment = ?env, "Tracing initialized");
    Ok(())
}
