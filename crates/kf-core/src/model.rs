//! Persisted records and transient request specifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{CloudProvider, ClusterKey, ClusterStatus};

/// A provisioned (or provisioning) Kubernetes cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub region: String,
    pub provider: CloudProvider,
    pub kubernetes_version: String,
    pub desired_node_count: u32,
    pub minimum_node_count: u32,
    pub maximum_node_count: u32,
    pub instance_type: String,
    pub ami_type: String,
    pub credential_id: String,
    #[serde(default)]
    pub access_token_id: Option<String>,
    #[serde(default)]
    pub outputs: Option<ClusterOutputs>,
    pub status: ClusterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    /// Project a spec into a fresh record in `NEW`
    pub fn from_spec(spec: &ClusterSpec, credential_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: spec.name.clone(),
            region: spec.region.clone(),
            provider: spec.provider,
            kubernetes_version: spec.kubernetes_version.clone(),
            desired_node_count: spec.desired_node_count,
            minimum_node_count: spec.minimum_node_count,
            maximum_node_count: spec.maximum_node_count,
            instance_type: spec.instance_type.clone(),
            ami_type: spec.ami_type.clone(),
            credential_id: credential_id.into(),
            access_token_id: None,
            outputs: None,
            status: ClusterStatus::New,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> ClusterKey {
        ClusterKey::new(self.provider, &self.name, &self.region)
    }

    /// Apply new scale bounds from a node-group request
    pub fn apply_node_group(&mut self, node_group: &NodeGroupSpec) {
        self.desired_node_count = node_group.desired_node_count;
        self.minimum_node_count = node_group.minimum_node_count;
        self.maximum_node_count = node_group.maximum_node_count;
        self.updated_at = Utc::now();
    }
}

/// Values captured from the provisioning engine after a successful apply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOutputs {
    pub endpoint: Option<String>,
    pub ca_certificate: Option<String>,
    pub security_group_id: Option<String>,
}

/// Cloud account secret material bound to one cluster
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub account_id: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn from_spec(spec: &ClusterSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("{}_credential", spec.name),
            description: format!("Credential for cluster {}", spec.name),
            account_id: spec.account_id.clone(),
            access_key: spec.access_key.clone(),
            secret_key: spec.secret_key.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("account_id", &self.account_id)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Short-lived bearer token for a cluster's control plane
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub id: String,
    pub token: String,
    pub description: String,
    pub expiration: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: String, expiration: DateTime<Utc>, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token,
            description,
            expiration,
            updated_at: Utc::now(),
        }
    }

    /// A token is usable while its expiration is strictly after `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration > now
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .field("description", &self.description)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Everything needed to provision a cluster
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub provider: CloudProvider,
    #[serde(default)]
    pub kubernetes_version: String,
    #[serde(default)]
    pub desired_node_count: u32,
    #[serde(default)]
    pub minimum_node_count: u32,
    #[serde(default)]
    pub maximum_node_count: u32,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub ami_type: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
}

impl ClusterSpec {
    pub fn key(&self) -> ClusterKey {
        ClusterKey::new(self.provider, &self.name, &self.region)
    }

    /// Rebuild the spec of an existing cluster from its records
    pub fn from_records(cluster: &Cluster, credential: &Credential) -> Self {
        Self {
            name: cluster.name.clone(),
            region: cluster.region.clone(),
            provider: cluster.provider,
            kubernetes_version: cluster.kubernetes_version.clone(),
            desired_node_count: cluster.desired_node_count,
            minimum_node_count: cluster.minimum_node_count,
            maximum_node_count: cluster.maximum_node_count,
            instance_type: cluster.instance_type.clone(),
            ami_type: cluster.ami_type.clone(),
            account_id: credential.account_id.clone(),
            access_key: credential.access_key.clone(),
            secret_key: credential.secret_key.clone(),
        }
    }
}

impl fmt::Debug for ClusterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSpec")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("provider", &self.provider)
            .field("kubernetes_version", &self.kubernetes_version)
            .field("desired_node_count", &self.desired_node_count)
            .field("minimum_node_count", &self.minimum_node_count)
            .field("maximum_node_count", &self.maximum_node_count)
            .field("instance_type", &self.instance_type)
            .field("ami_type", &self.ami_type)
            .finish_non_exhaustive()
    }
}

/// Resize request for an existing cluster's node group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub provider: CloudProvider,
    #[serde(default)]
    pub desired_node_count: u32,
    #[serde(default)]
    pub minimum_node_count: u32,
    #[serde(default)]
    pub maximum_node_count: u32,
}

impl NodeGroupSpec {
    pub fn key(&self) -> ClusterKey {
        ClusterKey::new(self.provider, &self.name, &self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn spec() -> ClusterSpec {
        ClusterSpec {
            name: "demo".to_string(),
            region: "us-west-1".to_string(),
            provider: CloudProvider::Aws,
            kubernetes_version: "1.29".to_string(),
            desired_node_count: 3,
            minimum_node_count: 1,
            maximum_node_count: 5,
            instance_type: "t3.medium".to_string(),
            ami_type: "AL2_x86_64".to_string(),
            account_id: None,
            access_key: "AKIA".to_string(),
            secret_key: "very-secret".to_string(),
        }
    }

    #[test]
    fn test_cluster_from_spec_starts_new() {
        let cluster = Cluster::from_spec(&spec(), "cred-1");
        assert_eq!(cluster.status, ClusterStatus::New);
        assert_eq!(cluster.credential_id, "cred-1");
        assert!(cluster.access_token_id.is_none());
        assert_eq!(cluster.key(), spec().key());
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::from_spec(&spec());
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("very-secret"));
        assert_eq!(credential.name, "demo_credential");
    }

    #[test]
    fn test_spec_debug_redacts_secret() {
        assert!(!format!("{:?}", spec()).contains("very-secret"));
    }

    #[test]
    fn test_token_validity_is_strict() {
        let now = Utc::now();
        let token = AccessToken::new("t".into(), now, "d".into());
        assert!(!token.is_valid_at(now));
        assert!(token.is_valid_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_spec_deserializes_camel_case() {
        let json = r#"{"name":"demo","region":"eu-central-1","provider":"AWS","desiredNodeCount":2}"#;
        let spec: ClusterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.desired_node_count, 2);
        assert_eq!(spec.provider, CloudProvider::Aws);
        assert!(spec.access_key.is_empty());
    }

    #[test]
    fn test_spec_round_trips_through_records() {
        let original = spec();
        let credential = Credential::from_spec(&original);
        let cluster = Cluster::from_spec(&original, &credential.id);
        assert_eq!(ClusterSpec::from_records(&cluster, &credential), original);
    }
}
