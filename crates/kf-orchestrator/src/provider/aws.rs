//! Amazon EKS

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;

use kf_core::error::StepError;
use kf_core::model::{Cluster, ClusterSpec, Credential};
use kf_core::tfvars::{base_variables, TfVars};
use kf_core::{CloudProvider, KfError};

use super::{IssuedToken, ProviderStrategy};
use crate::command::{CommandRunner, Invocation};

const GET_TOKEN_STEP: &str = "aws eks get-token";
const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub struct AwsProvider {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl AwsProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// `aws eks get-token` scoped to the cluster's credential
    pub fn token_invocation(&self, cluster: &Cluster, credential: &Credential) -> Invocation {
        Invocation::new(&self.binary)
            .args(["eks", "get-token", "--output", "json"])
            .args(["--cluster-name", cluster.name.as_str()])
            .args(["--region", cluster.region.as_str()])
            .env("AWS_ACCESS_KEY_ID", &credential.access_key)
            .env("AWS_SECRET_ACCESS_KEY", &credential.secret_key)
            .env("AWS_DEFAULT_REGION", &cluster.region)
    }
}

#[async_trait]
impl ProviderStrategy for AwsProvider {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Aws
    }

    fn variables(&self, spec: &ClusterSpec) -> TfVars {
        let mut vars = base_variables(spec);
        vars.insert("aws_access_key", &spec.access_key);
        vars.insert("aws_secret_key", &spec.secret_key);
        vars
    }

    async fn fetch_token(
        &self,
        cluster: &Cluster,
        credential: &Credential,
    ) -> Result<IssuedToken, KfError> {
        tracing::info!("Requesting EKS token for cluster {}", cluster.key());
        let output = self
            .runner
            .run(&self.token_invocation(cluster, credential))
            .await
            .map_err(|source| StepError::Spawn {
                step: GET_TOKEN_STEP.to_string(),
                source,
            })?;
        if !output.is_success() {
            return Err(StepError::NonZeroExit {
                step: GET_TOKEN_STEP.to_string(),
                code: output.exit_code,
            }
            .into());
        }

        let exec_credential = ExecCredential::parse(&output.stdout)?;
        Ok(exec_credential.into_token()?)
    }
}

/// Document printed by `aws eks get-token`
#[derive(Debug, Clone, Deserialize)]
pub struct ExecCredential {
    pub status: ExecCredentialStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredentialStatus {
    pub expiration_timestamp: String,
    pub token: String,
}

impl ExecCredential {
    pub fn parse(json: &str) -> Result<Self, StepError> {
        serde_json::from_str(json).map_err(|e| StepError::MalformedOutput {
            step: GET_TOKEN_STEP.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn into_token(self) -> Result<IssuedToken, StepError> {
        let naive =
            NaiveDateTime::parse_from_str(&self.status.expiration_timestamp, EXPIRATION_FORMAT)
                .map_err(|e| StepError::MalformedOutput {
                    step: GET_TOKEN_STEP.to_string(),
                    reason: format!(
                        "expirationTimestamp '{}': {}",
                        self.status.expiration_timestamp, e
                    ),
                })?;
        Ok(IssuedToken {
            token: self.status.token,
            expiration: Utc.from_utc_datetime(&naive),
        })
    }
}
