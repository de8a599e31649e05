//! Record storage
//!
//! The orchestrator treats persistence as a key-value store with a handful
//! of lookups per record kind. Saves are insert-or-replace; there is no
//! compare-and-swap, so concurrent read-modify-write cycles on the same
//! record can lose updates.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{AccessToken, Cluster, Credential};
use crate::types::ClusterKey;

/// Cluster records
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Look up a cluster by id
    async fn cluster(&self, id: &str) -> Result<Option<Cluster>, StoreError>;

    /// Look up a cluster by (provider, name, region)
    async fn cluster_by_key(&self, key: &ClusterKey) -> Result<Option<Cluster>, StoreError>;

    /// All clusters, in no particular order
    async fn clusters(&self) -> Result<Vec<Cluster>, StoreError>;

    /// Insert or replace
    async fn save_cluster(&self, cluster: Cluster) -> Result<Cluster, StoreError>;

    async fn delete_cluster(&self, id: &str) -> Result<(), StoreError>;
}

/// Credential records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credential(&self, id: &str) -> Result<Option<Credential>, StoreError>;

    async fn credential_by_name(&self, name: &str) -> Result<Option<Credential>, StoreError>;

    async fn save_credential(&self, credential: Credential) -> Result<Credential, StoreError>;

    async fn delete_credential(&self, id: &str) -> Result<(), StoreError>;
}

/// Access token records
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn token(&self, id: &str) -> Result<Option<AccessToken>, StoreError>;

    async fn save_token(&self, token: AccessToken) -> Result<AccessToken, StoreError>;

    async fn delete_token(&self, id: &str) -> Result<(), StoreError>;
}

/// A store holding all three record kinds
pub trait RecordStore: ClusterStore + CredentialStore + TokenStore {}

impl<T: ClusterStore + CredentialStore + TokenStore> RecordStore for T {}
