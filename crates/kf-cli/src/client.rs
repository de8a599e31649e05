//! HTTP client for the orchestrator API

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use kf_core::api::{cluster_path, AccessTokenResponse, ErrorResponse, PingResponse, API_PREFIX};
use kf_core::model::{Cluster, ClusterSpec, NodeGroupSpec};
use kf_core::ClusterKey;

/// Default orchestrator address
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure or undecodable body
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The orchestrator answered with a non-success status
    #[error("{status}: {error}{}", .message.as_ref().map(|m| format!(" ({})", m)).unwrap_or_default())]
    Api {
        status: StatusCode,
        error: String,
        message: Option<String>,
    },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Client for one orchestrator instance
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn ping(&self) -> Result<PingResponse, ClientError> {
        self.send::<(), _>(Method::GET, &format!("{API_PREFIX}/ping"), None)
            .await
    }

    pub async fn list_clusters(&self) -> Result<Vec<Cluster>, ClientError> {
        self.send::<(), _>(Method::GET, &format!("{API_PREFIX}/clusters"), None)
            .await
    }

    pub async fn get_cluster(&self, key: &ClusterKey) -> Result<Cluster, ClientError> {
        self.send::<(), _>(Method::GET, &cluster_path(key), None).await
    }

    pub async fn create_cluster(&self, spec: &ClusterSpec) -> Result<Cluster, ClientError> {
        self.send(Method::POST, &format!("{API_PREFIX}/clusters"), Some(spec))
            .await
    }

    pub async fn resize_node_group(
        &self,
        node_group: &NodeGroupSpec,
    ) -> Result<Cluster, ClientError> {
        self.send(
            Method::PUT,
            &format!("{API_PREFIX}/clusters/node-group"),
            Some(node_group),
        )
        .await
    }

    pub async fn delete_cluster(&self, key: &ClusterKey) -> Result<Cluster, ClientError> {
        self.send::<(), _>(Method::DELETE, &cluster_path(key), None)
            .await
    }

    pub async fn access_token(&self, key: &ClusterKey) -> Result<AccessTokenResponse, ClientError> {
        self.send::<(), _>(Method::GET, &format!("{}/token", cluster_path(key)), None)
            .await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let http_err = |source| ClientError::Http {
            url: url.clone(),
            source,
        };

        let response = request.send().await.map_err(http_err)?;
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(http_err);
        }

        let body = response.text().await.unwrap_or_default();
        let (error, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => (parsed.error, parsed.message),
            Err(_) => (
                status.canonical_reason().unwrap_or("Request failed").to_string(),
                (!body.is_empty()).then_some(body),
            ),
        };
        Err(ClientError::Api {
            status,
            error,
            message,
        })
    }
}
