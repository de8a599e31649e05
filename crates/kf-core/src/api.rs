//! HTTP wire types shared by the orchestrator and its clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::AccessToken;
use crate::types::ClusterKey;

/// Prefix of every API route
pub const API_PREFIX: &str = "/api/v1";

/// Response to a health probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub message: String,
    pub terraform_available: bool,
}

impl PingResponse {
    pub fn new(terraform_available: bool) -> Self {
        let message = if terraform_available {
            "Kubernetes provisioning server is working"
        } else {
            "Terraform is not installed or is not working properly"
        };
        Self {
            message: message.to_string(),
            terraform_available,
        }
    }
}

/// Access token as returned to API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
    pub description: String,
}

impl From<AccessToken> for AccessTokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            token: token.token,
            expiration: token.expiration,
            description: token.description,
        }
    }
}

/// Error body for non-2xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Path of a single cluster resource
pub fn cluster_path(key: &ClusterKey) -> String {
    format!(
        "{}/providers/{}/regions/{}/clusters/{}",
        API_PREFIX,
        key.provider.as_str(),
        key.region,
        key.name
    )
}
