//! Tracing initialization.

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter, prelude::*};

const DEFAULT_FILTER: &str = "info,adedonha=debug,tower_http=info,axum=info";

/// Install the global subscriber: env filter plus a fmt layer.
///
/// `RUST_LOG` overrides the default, e.g.
/// RUST_LOG=debug,adedonha::room=trace,tower_http=warn
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).compact())
        .try_init()
        .context("installing tracing subscriber")
}
