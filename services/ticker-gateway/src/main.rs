use price_feed::TickerService;
use std::sync::Arc;
use ticker_gateway::auth::UserStore;
use ticker_gateway::config::GatewayConfig;
use ticker_gateway::{AppState, create_router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting Ticker Gateway service");

    let config = GatewayConfig::from_env()?;
    let service = Arc::new(TickerService::new(config.feed.clone())?);
    let users = Arc::new(UserStore::from_pairs(config.users.clone()));
    let state = AppState::new(Arc::clone(&service), users, config.session.clone());

    let app = create_router(state);

    service.start().await;

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    service.stop().await;
    tracing::info!("Ticker Gateway stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
