//! HTTP server for Prometheus metrics endpoint.
//!
//! Runs on a separate tokio task and serves `/metrics` for Prometheus scraping.

use axum::{Router, routing::get};
use std::net::SocketAddr;
use tokio::sync::broadcast;

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

pub fn router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Run the HTTP server for Prometheus metrics until shutdown is broadcast.
///
/// Binds to `0.0.0.0:port` and serves the `/metrics` endpoint.
pub async fn run_http_server(port: u16, mut shutdown_rx: broadcast::Receiver<()>) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind metrics HTTP server");
            return;
        }
    };
    tracing::info!(%addr, "Prometheus HTTP server listening");

    let shutdown = async move {
        let _ = shutdown_rx.recv().await;
    };
    if let Err(e) = axum::serve(listener, router())
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "Metrics HTTP server error");
    }
}
