//! Cluster lifecycle state machine
//!
//! Drives the provisioning engine through the create/resize and delete
//! step sequences. The cluster's status is persisted *before* each step
//! so pollers always see which step is running; a failing step moves the
//! cluster to `ERROR` and aborts the rest of the sequence. Nothing is
//! rolled back: a failed cluster keeps its workspace and records until a
//! later delete succeeds.

mod locks;

pub use locks::ClusterLocks;

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kf_core::error::ValidationError;
use kf_core::model::Cluster;
use kf_core::store::RecordStore;
use kf_core::types::RecordKind;
use kf_core::{ClusterStatus, KfError};

use crate::command::{Terraform, TerraformStep};
use crate::workspace::WorkspaceManager;

/// How the first step of a provisioning run treats existing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionMode {
    /// First provisioning: initialize the working directory
    Create,
    /// Node-group change on an existing cluster: refresh state instead
    Resize,
}

impl ProvisionMode {
    fn first_step(&self) -> TerraformStep {
        match self {
            ProvisionMode::Create => TerraformStep::Init,
            ProvisionMode::Resize => TerraformStep::Refresh,
        }
    }
}

pub struct Lifecycle {
    store: Arc<dyn RecordStore>,
    terraform: Terraform,
    workspaces: Arc<WorkspaceManager>,
    settle_delay: Duration,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn RecordStore>,
        terraform: Terraform,
        workspaces: Arc<WorkspaceManager>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store,
            terraform,
            workspaces,
            settle_delay,
        }
    }

    /// Run `init|refresh`, `plan`, `apply` and capture outputs
    ///
    /// Expects the workspace to be seeded and its variable file written.
    pub async fn provision(
        &self,
        cluster_id: &str,
        workspace: &Path,
        mode: ProvisionMode,
    ) -> Result<Cluster, KfError> {
        let steps = [
            (ClusterStatus::Initializing, mode.first_step()),
            (ClusterStatus::Planing, TerraformStep::Plan),
            (ClusterStatus::Creating, TerraformStep::Apply),
        ];
        self.run_steps(cluster_id, workspace, &steps).await?;

        let cluster = self.transition(cluster_id, ClusterStatus::Created).await?;
        match self.terraform.outputs(workspace).await {
            Ok(outputs) => {
                let mut cluster = cluster;
                cluster.outputs = Some(outputs.cluster_outputs());
                cluster.updated_at = Utc::now();
                Ok(self.store.save_cluster(cluster).await?)
            }
            Err(e) => {
                tracing::warn!(
                    "Cluster {} created but its outputs could not be captured: {}",
                    cluster.key(),
                    e
                );
                Ok(cluster)
            }
        }
    }

    /// Run `plan -destroy`, `apply -destroy` and remove everything on success
    pub async fn deprovision(&self, cluster_id: &str, workspace: &Path) -> Result<(), KfError> {
        let steps = [
            (ClusterStatus::PlaningDelete, TerraformStep::PlanDestroy),
            (ClusterStatus::Deleting, TerraformStep::ApplyDestroy),
        ];
        self.run_steps(cluster_id, workspace, &steps).await?;

        let cluster = self.transition(cluster_id, ClusterStatus::Deleted).await?;
        if let Err(e) = self.workspaces.remove(workspace).await {
            tracing::warn!("Failed to remove workspace of {}: {}", cluster.key(), e);
        }

        if let Some(token_id) = &cluster.access_token_id {
            if self.store.token(token_id).await?.is_some() {
                self.store.delete_token(token_id).await?;
            }
        }
        if self.store.credential(&cluster.credential_id).await?.is_some() {
            self.store.delete_credential(&cluster.credential_id).await?;
        }
        self.store.delete_cluster(&cluster.id).await?;

        tracing::info!("Cluster {} deleted", cluster.key());
        Ok(())
    }

    async fn run_steps(
        &self,
        cluster_id: &str,
        workspace: &Path,
        steps: &[(ClusterStatus, TerraformStep)],
    ) -> Result<(), KfError> {
        for (status, step) in steps {
            if matches!(step, TerraformStep::Apply | TerraformStep::ApplyDestroy) {
                self.settle().await;
            }
            self.transition(cluster_id, *status).await?;

            if let Err(e) = self.terraform.run(*step, workspace).await {
                let err = KfError::from(e);
                self.mark_error(cluster_id, &err).await;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Give the engine's previous process time to release its state lock
    async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    /// Persist `next` as the cluster's status if the lifecycle allows it
    pub async fn transition(
        &self,
        cluster_id: &str,
        next: ClusterStatus,
    ) -> Result<Cluster, KfError> {
        let mut cluster = self
            .store
            .cluster(cluster_id)
            .await?
            .ok_or_else(|| KfError::NotFound {
                kind: RecordKind::Cluster,
                id: cluster_id.to_string(),
            })?;

        if !cluster.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                key: cluster.key(),
                from: cluster.status,
                to: next,
            }
            .into());
        }

        tracing::info!("Cluster {}: {} -> {}", cluster.key(), cluster.status, next);
        cluster.status = next;
        cluster.updated_at = Utc::now();
        Ok(self.store.save_cluster(cluster).await?)
    }

    /// Record a failure as `ERROR`; failures to do so are only logged
    pub async fn mark_error(&self, cluster_id: &str, cause: &KfError) {
        tracing::error!("Cluster {} failed: {}", cluster_id, cause);
        if let Err(e) = self.transition(cluster_id, ClusterStatus::Error).await {
            tracing::error!("Could not mark cluster {} as ERROR: {}", cluster_id, e);
        }
    }
}
