//! Cached control-plane access tokens
//!
//! Each cluster references at most one token. A lookup returns the cached
//! token while it is unexpired; otherwise the stale record is evicted and
//! a fresh token is issued through the provider's CLI. Eviction and refresh
//! are not atomic: two concurrent lookups for the same expired token may
//! both issue a new one, and the later save wins the cluster's reference.

use chrono::Utc;
use std::sync::Arc;

use kf_core::model::{AccessToken, Cluster};
use kf_core::store::RecordStore;
use kf_core::types::RecordKind;
use kf_core::KfError;

use crate::provider::ProviderRegistry;

#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn RecordStore>,
    providers: ProviderRegistry,
}

impl TokenCache {
    pub fn new(store: Arc<dyn RecordStore>, providers: ProviderRegistry) -> Self {
        Self { store, providers }
    }

    /// A usable token for `cluster`, issuing one if needed
    pub async fn token_for(&self, cluster: &Cluster) -> Result<AccessToken, KfError> {
        if let Some(token_id) = &cluster.access_token_id {
            if let Some(token) = self.store.token(token_id).await? {
                if token.is_valid_at(Utc::now()) {
                    tracing::debug!("Token cache hit for {}", cluster.key());
                    return Ok(token);
                }
                tracing::info!(
                    "Token for {} expired at {}, evicting",
                    cluster.key(),
                    token.expiration
                );
                self.store.delete_token(&token.id).await?;
            }
        }

        let strategy = self.providers.get(cluster.provider, "access token")?;
        let credential = self
            .store
            .credential(&cluster.credential_id)
            .await?
            .ok_or_else(|| KfError::NotFound {
                kind: RecordKind::Credential,
                id: cluster.credential_id.clone(),
            })?;

        let issued = strategy.fetch_token(cluster, &credential).await?;
        let token = self
            .store
            .save_token(AccessToken::new(
                issued.token,
                issued.expiration,
                format!("Access token for cluster {}", cluster.name),
            ))
            .await?;

        let mut current = self
            .store
            .cluster(&cluster.id)
            .await?
            .ok_or_else(|| KfError::NotFound {
                kind: RecordKind::Cluster,
                id: cluster.id.clone(),
            })?;
        current.access_token_id = Some(token.id.clone());
        current.updated_at = Utc::now();
        self.store.save_cluster(current).await?;

        tracing::info!(
            "Issued token for {} valid until {}",
            cluster.key(),
            token.expiration
        );
        Ok(token)
    }
}
