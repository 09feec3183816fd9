use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tracing::info;

use mockrise_backend::{
    app::create_router,
    app_state::AppState,
    config,
    db::{self, Repositories},
    scheduling::clock::SystemClock,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let telemetry = telemetry::init_telemetry(None).await?;
    let config = config::init().context("Failed to load configuration")?;

    let pool = db::init_pool(&config.database).await?;
    info!("Database pool ready, migrations applied");

    let state = AppState::new(
        Some(pool.clone()),
        Repositories::postgres(pool),
        config.clone(),
        Arc::new(SystemClock),
    )?;
    let app = create_router(state);

    let addr = config.server_addr();
    info!("{} listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    info!("Server shut down");
    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
