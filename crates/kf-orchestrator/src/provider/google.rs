//! Google GKE: provisioning only, no token issuance

use async_trait::async_trait;

use kf_core::model::{Cluster, ClusterSpec, Credential};
use kf_core::tfvars::{base_variables, TfVars};
use kf_core::{CloudProvider, KfError};

use super::{IssuedToken, ProviderStrategy};

#[derive(Debug, Clone, Default)]
pub struct GoogleProvider;

#[async_trait]
impl ProviderStrategy for GoogleProvider {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Google
    }

    fn variables(&self, spec: &ClusterSpec) -> TfVars {
        let mut vars = base_variables(spec);
        vars.insert("google_project", spec.account_id.as_deref().unwrap_or_default());
        vars.insert("google_credentials", &spec.secret_key);
        vars
    }

    async fn fetch_token(
        &self,
        _cluster: &Cluster,
        _credential: &Credential,
    ) -> Result<IssuedToken, KfError> {
        Err(KfError::UnsupportedProvider {
            provider: CloudProvider::Google,
            operation: "access token",
        })
    }
}
