//! Server setup and routing.

use std::net::SocketAddr;

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{handlers, state::AppState};

/// Create the API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/infer", get(handlers::handle_infer))
        .route("/metrics", get(handlers::handle_metrics))
        .route("/history/:session_id", get(handlers::handle_history))
        .route("/sessions", get(handlers::handle_sessions))
        .route(
            "/messages/:message_id/feedback",
            put(handlers::handle_feedback),
        )
        .route("/health", get(handlers::handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C, then drain queued writes.
pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = state.dispatcher.clone();
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let slots = dispatcher.slots().clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!(active = slots.active_count(), "shutting down");
            slots.cancel_all();
        })
        .await?;

    dispatcher.writer().flush().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
