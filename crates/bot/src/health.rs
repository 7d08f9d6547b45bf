//! Health endpoints for the process supervisor.
//!
//! - `GET /health` answers as long as the process runs.
//! - `GET /health/ready` also checks the database.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

/// Router serving both endpoints.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

/// Serve the health endpoints until `shutdown` resolves.
///
/// # Errors
///
/// Returns error if the address cannot be bound.
pub async fn serve(
    addr: SocketAddr,
    pool: PgPool,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Health endpoints listening");
    axum::serve(listener, router(pool))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Liveness: does not touch dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness: 503 while the database is unreachable.
async fn readiness(State(pool): State<PgPool>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(&pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
