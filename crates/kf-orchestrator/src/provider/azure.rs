//! Azure AKS: provisioning only, no token issuance

use async_trait::async_trait;

use kf_core::model::{Cluster, ClusterSpec, Credential};
use kf_core::tfvars::{base_variables, TfVars};
use kf_core::{CloudProvider, KfError};

use super::{IssuedToken, ProviderStrategy};

#[derive(Debug, Clone, Default)]
pub struct AzureProvider;

#[async_trait]
impl ProviderStrategy for AzureProvider {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Azure
    }

    fn variables(&self, spec: &ClusterSpec) -> TfVars {
        let mut vars = base_variables(spec);
        vars.insert("azure_client_id", &spec.access_key);
        vars.insert("azure_client_secret", &spec.secret_key);
        vars.insert("azure_tenant_id", spec.account_id.as_deref().unwrap_or_default());
        vars
    }

    async fn fetch_token(
        &self,
        _cluster: &Cluster,
        _credential: &Credential,
    ) -> Result<IssuedToken, KfError> {
        Err(KfError::UnsupportedProvider {
            provider: CloudProvider::Azure,
            operation: "access token",
        })
    }
}
