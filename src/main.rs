use std::net::SocketAddr;

use adedonha::config::{self, GameSettings};
use adedonha::http::routes::{self, AppState};
use adedonha::telemetry;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init()?;

    let settings = GameSettings::from_env();
    let app = routes::router(AppState::new(settings));

    let addr: SocketAddr = config::server_addr();
    tracing::info!(%addr, round_secs = settings.default_duration, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
