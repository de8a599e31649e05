//! In-memory record store with optional JSON snapshots

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{ClusterStore, CredentialStore, TokenStore};
use crate::error::StoreError;
use crate::model::{AccessToken, Cluster, Credential};
use crate::types::ClusterKey;

/// Record store backed by concurrent maps
///
/// When opened with a snapshot path, the full content is rewritten to that
/// file after every mutation and reloaded on the next start.
#[derive(Default)]
pub struct MemoryStore {
    clusters: DashMap<String, Cluster>,
    credentials: DashMap<String, Credential>,
    tokens: DashMap<String, AccessToken>,
    snapshot: Option<SnapshotFile>,
}

struct SnapshotFile {
    path: PathBuf,
    /// Serializes writers so snapshots are never interleaved
    write_lock: Mutex<()>,
}

#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    clusters: Vec<Cluster>,
    #[serde(default)]
    credentials: Vec<Credential>,
    #[serde(default)]
    tokens: Vec<AccessToken>,
}

impl MemoryStore {
    /// Create an empty store without persistence
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`, loading existing records
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = Self {
            snapshot: Some(SnapshotFile {
                path: path.clone(),
                write_lock: Mutex::new(()),
            }),
            ..Self::default()
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                tracing::info!(
                    "Loaded {} clusters, {} credentials, {} tokens from {:?}",
                    snapshot.clusters.len(),
                    snapshot.credentials.len(),
                    snapshot.tokens.len(),
                    path
                );
                for cluster in snapshot.clusters {
                    store.clusters.insert(cluster.id.clone(), cluster);
                }
                for credential in snapshot.credentials {
                    store.credentials.insert(credential.id.clone(), credential);
                }
                for token in snapshot.tokens {
                    store.tokens.insert(token.id.clone(), token);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No record snapshot at {:?}, starting empty", path);
            }
            Err(source) => return Err(StoreError::Snapshot { path, source }),
        }

        Ok(store)
    }

    /// Path of the snapshot file, if persistence is enabled
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_ref().map(|s| s.path.as_path())
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let Some(snapshot_file) = &self.snapshot else {
            return Ok(());
        };
        let _guard = snapshot_file.write_lock.lock().await;

        let snapshot = Snapshot {
            clusters: self.clusters.iter().map(|r| r.value().clone()).collect(),
            credentials: self.credentials.iter().map(|r| r.value().clone()).collect(),
            tokens: self.tokens.iter().map(|r| r.value().clone()).collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let path = &snapshot_file.path;
        let io_err = |source| StoreError::Snapshot {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn cluster(&self, id: &str) -> Result<Option<Cluster>, StoreError> {
        Ok(self.clusters.get(id).map(|r| r.value().clone()))
    }

    async fn cluster_by_key(&self, key: &ClusterKey) -> Result<Option<Cluster>, StoreError> {
        Ok(self
            .clusters
            .iter()
            .find(|r| {
                let c = r.value();
                c.provider == key.provider && c.name == key.name && c.region == key.region
            })
            .map(|r| r.value().clone()))
    }

    async fn clusters(&self) -> Result<Vec<Cluster>, StoreError> {
        Ok(self.clusters.iter().map(|r| r.value().clone()).collect())
    }

    async fn save_cluster(&self, cluster: Cluster) -> Result<Cluster, StoreError> {
        self.clusters.insert(cluster.id.clone(), cluster.clone());
        self.persist().await?;
        Ok(cluster)
    }

    async fn delete_cluster(&self, id: &str) -> Result<(), StoreError> {
        if self.clusters.remove(id).is_some() {
            self.persist().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn credential(&self, id: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.get(id).map(|r| r.value().clone()))
    }

    async fn credential_by_name(&self, name: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .credentials
            .iter()
            .find(|r| r.value().name == name)
            .map(|r| r.value().clone()))
    }

    async fn save_credential(&self, credential: Credential) -> Result<Credential, StoreError> {
        self.credentials
            .insert(credential.id.clone(), credential.clone());
        self.persist().await?;
        Ok(credential)
    }

    async fn delete_credential(&self, id: &str) -> Result<(), StoreError> {
        if self.credentials.remove(id).is_some() {
            self.persist().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn token(&self, id: &str) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.tokens.get(id).map(|r| r.value().clone()))
    }

    async fn save_token(&self, token: AccessToken) -> Result<AccessToken, StoreError> {
        self.tokens.insert(token.id.clone(), token.clone());
        self.persist().await?;
        Ok(token)
    }

    async fn delete_token(&self, id: &str) -> Result<(), StoreError> {
        if self.tokens.remove(id).is_some() {
            self.persist().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClusterSpec;
    use crate::types::{CloudProvider, ClusterStatus};

    fn spec(name: &str) -> ClusterSpec {
        ClusterSpec {
            name: name.to_string(),
            region: "us-west-1".to_string(),
            provider: CloudProvider::Aws,
            kubernetes_version: "1.29".to_string(),
            desired_node_count: 1,
            minimum_node_count: 1,
            maximum_node_count: 1,
            instance_type: "t3.small".to_string(),
            ami_type: "AL2_x86_64".to_string(),
            account_id: None,
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_by_natural_key() {
        let store = MemoryStore::new();
        let a = store
            .save_cluster(Cluster::from_spec(&spec("a"), "c1"))
            .await
            .unwrap();
        store
            .save_cluster(Cluster::from_spec(&spec("b"), "c2"))
            .await
            .unwrap();

        let found = store.cluster_by_key(&a.key()).await.unwrap().unwrap();
        assert_eq!(found.id, a.id);

        let other_region = ClusterKey::new(CloudProvider::Aws, "a", "eu-west-1");
        assert!(store.cluster_by_key(&other_region).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_existing_record() {
        let store = MemoryStore::new();
        let mut cluster = store
            .save_cluster(Cluster::from_spec(&spec("a"), "c1"))
            .await
            .unwrap();
        cluster.status = ClusterStatus::Initializing;
        store.save_cluster(cluster.clone()).await.unwrap();

        assert_eq!(store.clusters().await.unwrap().len(), 1);
        let stored = store.cluster(&cluster.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ClusterStatus::Initializing);
    }

    #[tokio::test]
    async fn test_credential_by_name() {
        let store = MemoryStore::new();
        let credential = store
            .save_credential(Credential::from_spec(&spec("demo")))
            .await
            .unwrap();
        let found = store.credential_by_name("demo_credential").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(credential.id.clone()));

        store.delete_credential(&credential.id).await.unwrap();
        assert!(store.credential(&credential.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("records.json");

        let cluster_id = {
            let store = MemoryStore::open(&path).await.unwrap();
            let credential = store
                .save_credential(Credential::from_spec(&spec("demo")))
                .await
                .unwrap();
            let cluster = store
                .save_cluster(Cluster::from_spec(&spec("demo"), &credential.id))
                .await
                .unwrap();
            cluster.id
        };

        let reopened = MemoryStore::open(&path).await.unwrap();
        let cluster = reopened.cluster(&cluster_id).await.unwrap().unwrap();
        assert_eq!(cluster.name, "demo");
        assert!(reopened
            .credential(&cluster.credential_id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(reopened.snapshot_path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            MemoryStore::open(&path).await,
            Err(StoreError::Encoding(_))
        ));
    }
}
