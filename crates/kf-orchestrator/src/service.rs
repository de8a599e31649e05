//! Request-facing cluster operations
//!
//! Mutating requests validate and record synchronously, then hand the step
//! sequence to a background task and return the cluster record as it was
//! at request time. Callers follow progress by polling the status.

use std::sync::Arc;
use tokio_util::task::TaskTracker;

use kf_core::api::PingResponse;
use kf_core::config::OrchestratorConfig;
use kf_core::error::ValidationError;
use kf_core::model::{AccessToken, Cluster, ClusterSpec, Credential, NodeGroupSpec};
use kf_core::store::RecordStore;
use kf_core::tfvars::write_tfvars;
use kf_core::types::RecordKind;
use kf_core::validate::{validate_cluster_spec, validate_node_group};
use kf_core::{ClusterKey, ClusterStatus, KfError};

use crate::command::{CommandRunner, Terraform};
use crate::lifecycle::{ClusterLocks, Lifecycle, ProvisionMode};
use crate::provider::ProviderRegistry;
use crate::token::TokenCache;
use crate::workspace::WorkspaceManager;

#[derive(Clone)]
pub struct ClusterService {
    store: Arc<dyn RecordStore>,
    providers: ProviderRegistry,
    workspaces: Arc<WorkspaceManager>,
    lifecycle: Arc<Lifecycle>,
    tokens: TokenCache,
    terraform: Terraform,
    locks: ClusterLocks,
    admissions: ClusterLocks,
    tasks: TaskTracker,
}

impl ClusterService {
    pub fn new(
        config: &OrchestratorConfig,
        store: Arc<dyn RecordStore>,
        runner: Arc<dyn CommandRunner>,
        workspaces: WorkspaceManager,
    ) -> Self {
        let providers = ProviderRegistry::builtin(Arc::clone(&runner), &config.tools.aws);
        let terraform = Terraform::new(runner, &config.tools.terraform);
        let workspaces = Arc::new(workspaces);
        let lifecycle = Arc::new(Lifecycle::new(
            Arc::clone(&store),
            terraform.clone(),
            Arc::clone(&workspaces),
            config.step_settle_delay,
        ));

        Self {
            tokens: TokenCache::new(Arc::clone(&store), providers.clone()),
            store,
            providers,
            workspaces,
            lifecycle,
            terraform,
            locks: ClusterLocks::new(),
            admissions: ClusterLocks::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Record a new cluster and start provisioning it in the background
    pub async fn create_cluster(&self, spec: ClusterSpec) -> Result<Cluster, KfError> {
        validate_cluster_spec(&spec)?;
        self.providers.get(spec.provider, "provisioning")?;

        let key = spec.key();
        // Held only across the duplicate check and the inserts, so a create
        // never waits on a lifecycle run of the same key.
        let admission = self.admissions.lock(&key).await;
        if self.store.cluster_by_key(&key).await?.is_some() {
            return Err(ValidationError::Duplicate(key).into());
        }

        let credential = self.store.save_credential(Credential::from_spec(&spec)).await?;
        let cluster = self
            .store
            .save_cluster(Cluster::from_spec(&spec, &credential.id))
            .await?;
        drop(admission);
        tracing::info!("Accepted cluster {} ({})", key, cluster.id);

        self.spawn_provision(cluster.id.clone(), key, spec, ProvisionMode::Create);
        Ok(cluster)
    }

    /// Update a created cluster's scale bounds and re-apply in the background
    pub async fn resize_node_group(&self, node_group: NodeGroupSpec) -> Result<Cluster, KfError> {
        validate_node_group(&node_group)?;

        let key = node_group.key();
        let mut cluster = self
            .store
            .cluster_by_key(&key)
            .await?
            .ok_or_else(|| KfError::cluster_not_found(&key))?;
        if cluster.status != ClusterStatus::Created {
            return Err(ValidationError::InvalidState {
                key,
                status: cluster.status,
                expected: ClusterStatus::Created,
            }
            .into());
        }
        let credential = self
            .store
            .credential(&cluster.credential_id)
            .await?
            .ok_or_else(|| KfError::NotFound {
                kind: RecordKind::Credential,
                id: cluster.credential_id.clone(),
            })?;

        cluster.apply_node_group(&node_group);
        let cluster = self.store.save_cluster(cluster).await?;
        tracing::info!(
            "Resizing cluster {} to {}/{}/{} (min/desired/max)",
            key,
            cluster.minimum_node_count,
            cluster.desired_node_count,
            cluster.maximum_node_count
        );

        let spec = ClusterSpec::from_records(&cluster, &credential);
        self.spawn_provision(cluster.id.clone(), key, spec, ProvisionMode::Resize);
        Ok(cluster)
    }

    /// Start tearing a cluster down in the background
    pub async fn delete_cluster(&self, key: &ClusterKey) -> Result<Cluster, KfError> {
        let cluster = self.get_cluster(key).await?;
        if cluster.status == ClusterStatus::Deleted {
            return Err(ValidationError::InvalidTransition {
                key: key.clone(),
                from: cluster.status,
                to: ClusterStatus::PlaningDelete,
            }
            .into());
        }
        tracing::info!("Deleting cluster {} ({})", key, cluster.id);

        let this = self.clone();
        let cluster_id = cluster.id.clone();
        let key = key.clone();
        self.tasks.spawn(async move {
            let guard = this.locks.lock(&key).await;
            let result = this.deprovision(&cluster_id, &key).await;
            drop(guard);
            match result {
                Ok(()) => this.locks.release(&key),
                Err(e) => tracing::error!("Deleting cluster {} failed: {}", key, e),
            }
        });
        Ok(cluster)
    }

    pub async fn get_cluster(&self, key: &ClusterKey) -> Result<Cluster, KfError> {
        self.store
            .cluster_by_key(key)
            .await?
            .ok_or_else(|| KfError::cluster_not_found(key))
    }

    pub async fn list_clusters(&self) -> Result<Vec<Cluster>, KfError> {
        let mut clusters = self.store.clusters().await?;
        clusters.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(clusters)
    }

    /// A usable control-plane token for a cluster
    pub async fn access_token(&self, key: &ClusterKey) -> Result<AccessToken, KfError> {
        let cluster = self.get_cluster(key).await?;
        self.tokens.token_for(&cluster).await
    }

    /// Report whether the provisioning engine can be executed
    pub async fn ping(&self) -> PingResponse {
        PingResponse::new(self.terraform.is_available().await)
    }

    /// Number of lifecycle runs still in flight
    pub fn running_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Wait until every background run spawned so far has finished
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    fn spawn_provision(
        &self,
        cluster_id: String,
        key: ClusterKey,
        spec: ClusterSpec,
        mode: ProvisionMode,
    ) {
        let this = self.clone();
        self.tasks.spawn(async move {
            let _guard = this.locks.lock(&key).await;
            if let Err(e) = this.provision(&cluster_id, &key, &spec, mode).await {
                tracing::error!("Provisioning cluster {} failed: {}", key, e);
            }
        });
    }

    /// Tear down under the cluster's lock
    ///
    /// No run of this process can be driving the cluster while the lock is
    /// held, so an in-progress status was left behind by an earlier process.
    /// Such a cluster is moved to `ERROR` first and torn down from there.
    async fn deprovision(&self, cluster_id: &str, key: &ClusterKey) -> Result<(), KfError> {
        if let Some(cluster) = self.store.cluster(cluster_id).await? {
            if cluster.status.is_in_progress() {
                tracing::warn!(
                    "Cluster {} was interrupted in {}; tearing it down",
                    key,
                    cluster.status
                );
                self.lifecycle
                    .transition(cluster_id, ClusterStatus::Error)
                    .await?;
            }
        }

        match self.workspaces.cluster_dir(key).await {
            Ok(workspace) => self.lifecycle.deprovision(cluster_id, &workspace).await,
            Err(e) => {
                let err = KfError::from(e);
                self.lifecycle.mark_error(cluster_id, &err).await;
                Err(err)
            }
        }
    }

    async fn provision(
        &self,
        cluster_id: &str,
        key: &ClusterKey,
        spec: &ClusterSpec,
        mode: ProvisionMode,
    ) -> Result<Cluster, KfError> {
        let strategy = self.providers.get(spec.provider, "provisioning")?;
        let workspace = match self.workspaces.prepare(key, strategy.template_subdir()).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let err = KfError::from(e);
                self.lifecycle.mark_error(cluster_id, &err).await;
                return Err(err);
            }
        };

        write_tfvars(&workspace, &strategy.variables(spec)).await;
        self.lifecycle.provision(cluster_id, &workspace, mode).await
    }
}
