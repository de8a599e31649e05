use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;

use kf_core::api::{AccessTokenResponse, PingResponse};
use kf_core::model::{Cluster, ClusterSpec, NodeGroupSpec};
use kf_core::{CloudProvider, ClusterKey};

use super::error::{api_error, bad_request, ApiError};
use crate::state::OrchestratorState;

type AppState = Arc<OrchestratorState>;

fn cluster_key((provider, region, name): (String, String, String)) -> Result<ClusterKey, ApiError> {
    let provider = provider
        .parse::<CloudProvider>()
        .map_err(|e| bad_request(e.to_string()))?;
    Ok(ClusterKey::new(provider, name, region))
}

pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(state.clusters.ping().await)
}

pub async fn list_clusters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Cluster>>, ApiError> {
    state.clusters.list_clusters().await.map(Json).map_err(api_error)
}

pub async fn create_cluster(
    State(state): State<AppState>,
    Json(spec): Json<ClusterSpec>,
) -> Result<(StatusCode, Json<Cluster>), ApiError> {
    let cluster = state.clusters.create_cluster(spec).await.map_err(api_error)?;
    Ok((StatusCode::ACCEPTED, Json(cluster)))
}

pub async fn resize_node_group(
    State(state): State<AppState>,
    Json(node_group): Json<NodeGroupSpec>,
) -> Result<(StatusCode, Json<Cluster>), ApiError> {
    let cluster = state
        .clusters
        .resize_node_group(node_group)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::ACCEPTED, Json(cluster)))
}

pub async fn get_cluster(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
) -> Result<Json<Cluster>, ApiError> {
    let key = cluster_key(segments)?;
    state.clusters.get_cluster(&key).await.map(Json).map_err(api_error)
}

pub async fn delete_cluster(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
) -> Result<(StatusCode, Json<Cluster>), ApiError> {
    let key = cluster_key(segments)?;
    let cluster = state.clusters.delete_cluster(&key).await.map_err(api_error)?;
    Ok((StatusCode::ACCEPTED, Json(cluster)))
}

pub async fn access_token(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let key = cluster_key(segments)?;
    let token = state.clusters.access_token(&key).await.map_err(api_error)?;
    Ok(Json(token.into()))
}
