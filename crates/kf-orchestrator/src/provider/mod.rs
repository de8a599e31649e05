//! Per-provider behavior
//!
//! Everything that differs between cloud providers (template subtree,
//! secret variables, token issuance) lives behind [`ProviderStrategy`].
//! Adding a provider means adding one implementation and registering it.

mod aws;
mod azure;
mod google;

pub use aws::{AwsProvider, ExecCredential};
pub use azure::AzureProvider;
pub use google::GoogleProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use kf_core::model::{Cluster, ClusterSpec, Credential};
use kf_core::tfvars::TfVars;
use kf_core::{CloudProvider, KfError};

use crate::command::CommandRunner;

/// A bearer token issued by a provider's CLI
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    fn provider(&self) -> CloudProvider;

    /// Subdirectory of the template checkout holding this provider's files
    fn template_subdir(&self) -> &'static str {
        self.provider().as_str()
    }

    /// Full variable set for a run: common keys plus provider secrets
    fn variables(&self, spec: &ClusterSpec) -> TfVars;

    /// Issue a fresh control-plane token for `cluster`
    async fn fetch_token(
        &self,
        cluster: &Cluster,
        credential: &Credential,
    ) -> Result<IssuedToken, KfError>;
}

/// Resolves a provider to its strategy
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    strategies: HashMap<CloudProvider, Arc<dyn ProviderStrategy>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider
    pub fn builtin(runner: Arc<dyn CommandRunner>, aws_binary: impl Into<String>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AwsProvider::new(runner, aws_binary)));
        registry.register(Arc::new(AzureProvider));
        registry.register(Arc::new(GoogleProvider));
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn ProviderStrategy>) {
        self.strategies.insert(strategy.provider(), strategy);
    }

    pub fn get(
        &self,
        provider: CloudProvider,
        operation: &'static str,
    ) -> Result<Arc<dyn ProviderStrategy>, KfError> {
        self.strategies
            .get(&provider)
            .cloned()
            .ok_or(KfError::UnsupportedProvider { provider, operation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ProcessRunner;

    #[test]
    fn test_builtin_registry_covers_all_providers() {
        let registry = ProviderRegistry::builtin(Arc::new(ProcessRunner::new()), "aws");
        for provider in CloudProvider::ALL {
            let strategy = registry.get(provider, "test").unwrap();
            assert_eq!(strategy.provider(), provider);
            assert_eq!(strategy.template_subdir(), provider.as_str());
        }
    }

    #[test]
    fn test_unregistered_provider_is_unsupported() {
        let err = ProviderRegistry::new()
            .get(CloudProvider::Azure, "provision")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            KfError::UnsupportedProvider {
                provider: CloudProvider::Azure,
                operation: "provision"
            }
        ));
    }
}
