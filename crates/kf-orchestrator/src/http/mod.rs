//! HTTP surface
//!
//! Thin axum layer over [`ClusterService`](crate::service::ClusterService).
//! Handlers translate paths and bodies into service calls and map
//! [`KfError`](kf_core::KfError) variants onto status codes.

mod error;
pub mod handlers;

pub use error::{api_error, status_for, ApiError};

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::state::OrchestratorState;

const CLUSTER_PATH: &str = "/api/v1/providers/:provider/regions/:region/clusters/:name";

/// Build the API router
pub fn router(state: Arc<OrchestratorState>) -> Router {
    Router::new()
        .route("/api/v1/ping", get(handlers::ping))
        .route(
            "/api/v1/clusters",
            get(handlers::list_clusters).post(handlers::create_cluster),
        )
        .route("/api/v1/clusters/node-group", put(handlers::resize_node_group))
        .route(
            CLUSTER_PATH,
            get(handlers::get_cluster).delete(handlers::delete_cluster),
        )
        .route(&format!("{CLUSTER_PATH}/token"), get(handlers::access_token))
        .with_state(state)
}

/// Serve the API on `bind_addr` until `cancel` fires
pub async fn serve(
    state: Arc<OrchestratorState>,
    bind_addr: &str,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("HTTP API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
