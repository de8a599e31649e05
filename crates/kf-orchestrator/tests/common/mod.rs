//! Shared fakes for orchestrator integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use kf_core::config::OrchestratorConfig;
use kf_core::error::{StoreError, WorkspaceError};
use kf_core::model::{AccessToken, Cluster, ClusterSpec, Credential};
use kf_core::store::{ClusterStore, CredentialStore, MemoryStore, TokenStore};
use kf_core::{CloudProvider, ClusterKey, ClusterStatus};
use kf_orchestrator::command::{CommandOutput, CommandRunner, Invocation};
use kf_orchestrator::workspace::{LocalTemplateSource, TemplateSource, WorkspaceManager};
use kf_orchestrator::{ClusterService, OrchestratorState};

pub const OUTPUT_JSON: &str = r#"{
    "cluster_endpoint": {"sensitive": false, "type": "string", "value": "https://demo.eks.example.com"},
    "cluster_ca_certificate": {"sensitive": true, "type": "string", "value": "Q0EgREFUQQ=="},
    "cluster_security_group_id": {"sensitive": false, "type": "string", "value": "sg-0123"}
}"#;

/// Command runner answering from a script instead of spawning processes
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make invocations with exactly these arguments exit with code 1
    pub fn fail_on(&self, args: &[&str]) {
        self.failures
            .lock()
            .unwrap()
            .push(args.iter().map(|s| s.to_string()).collect());
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments of every call, joined with spaces
    pub fn arg_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.args.join(" ")).collect()
    }

    pub fn count(&self, args: &str) -> usize {
        self.arg_lines().iter().filter(|line| *line == args).count()
    }

    pub fn token_requests(&self) -> usize {
        self.arg_lines()
            .iter()
            .filter(|line| line.starts_with("eks get-token"))
            .count()
    }
}

fn output(exit_code: i32, stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: stdout.into(),
        stderr: String::new(),
        duration: Duration::ZERO,
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if self.failures.lock().unwrap().contains(&invocation.args) {
            return Ok(output(1, ""));
        }

        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        Ok(match args.as_slice() {
            ["output", "-json"] => output(0, OUTPUT_JSON),
            ["eks", "get-token", ..] => {
                let expiration = (Utc::now() + ChronoDuration::minutes(14))
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string();
                let n = self.token_requests();
                output(
                    0,
                    format!(
                        r#"{{"kind":"ExecCredential","status":{{"expirationTimestamp":"{}","token":"k8s-aws-v1.token-{}"}}}}"#,
                        expiration, n
                    ),
                )
            }
            _ => output(0, ""),
        })
    }
}

/// Template source that always fails to sync
pub struct BrokenTemplates;

#[async_trait]
impl TemplateSource for BrokenTemplates {
    async fn sync(&self, _dir: &Path) -> Result<(), WorkspaceError> {
        Err(WorkspaceError::TemplateSyncFailed(
            "remote unreachable".to_string(),
        ))
    }
}

/// Record store that remembers every cluster save and every delete
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    saves: Mutex<HashMap<String, Vec<(ClusterStatus, bool)>>>,
    deletes: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingStore {
    /// (status, outputs captured) of every save of one cluster, in order
    pub fn saves(&self, cluster_id: &str) -> Vec<(ClusterStatus, bool)> {
        self.saves
            .lock()
            .unwrap()
            .get(cluster_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn statuses(&self, cluster_id: &str) -> Vec<ClusterStatus> {
        self.saves(cluster_id).into_iter().map(|(s, _)| s).collect()
    }

    pub fn deletes(&self, kind: &str) -> Vec<String> {
        self.deletes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| id.clone())
            .collect()
    }
}

#[async_trait]
impl ClusterStore for RecordingStore {
    async fn cluster(&self, id: &str) -> Result<Option<Cluster>, StoreError> {
        self.inner.cluster(id).await
    }

    async fn cluster_by_key(&self, key: &ClusterKey) -> Result<Option<Cluster>, StoreError> {
        self.inner.cluster_by_key(key).await
    }

    async fn clusters(&self) -> Result<Vec<Cluster>, StoreError> {
        self.inner.clusters().await
    }

    async fn save_cluster(&self, cluster: Cluster) -> Result<Cluster, StoreError> {
        self.saves
            .lock()
            .unwrap()
            .entry(cluster.id.clone())
            .or_default()
            .push((cluster.status, cluster.outputs.is_some()));
        self.inner.save_cluster(cluster).await
    }

    async fn delete_cluster(&self, id: &str) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(("cluster", id.to_string()));
        self.inner.delete_cluster(id).await
    }
}

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn credential(&self, id: &str) -> Result<Option<Credential>, StoreError> {
        self.inner.credential(id).await
    }

    async fn credential_by_name(&self, name: &str) -> Result<Option<Credential>, StoreError> {
        self.inner.credential_by_name(name).await
    }

    async fn save_credential(&self, credential: Credential) -> Result<Credential, StoreError> {
        self.inner.save_credential(credential).await
    }

    async fn delete_credential(&self, id: &str) -> Result<(), StoreError> {
        self.deletes
            .lock()
            .unwrap()
            .push(("credential", id.to_string()));
        self.inner.delete_credential(id).await
    }
}

#[async_trait]
impl TokenStore for RecordingStore {
    async fn token(&self, id: &str) -> Result<Option<AccessToken>, StoreError> {
        self.inner.token(id).await
    }

    async fn save_token(&self, token: AccessToken) -> Result<AccessToken, StoreError> {
        self.inner.save_token(token).await
    }

    async fn delete_token(&self, id: &str) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(("token", id.to_string()));
        self.inner.delete_token(id).await
    }
}

pub struct Harness {
    pub root: TempDir,
    pub config: OrchestratorConfig,
    pub runner: Arc<ScriptedRunner>,
    pub store: Arc<RecordingStore>,
    pub workspaces_root: std::path::PathBuf,
    pub service: ClusterService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_source(Arc::new(LocalTemplateSource))
    }

    pub fn with_source(source: Arc<dyn TemplateSource>) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = OrchestratorConfig::default();
        config.base_dir = root.path().to_path_buf();
        config.state_file = None;
        config.step_settle_delay = Duration::ZERO;

        for provider in CloudProvider::ALL {
            let dir = config.templates_dir().join(provider.as_str());
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("main.tf"), format!("# {} cluster\n", provider)).unwrap();
        }

        let runner = ScriptedRunner::new();
        let store = Arc::new(RecordingStore::default());
        let workspaces =
            WorkspaceManager::new(config.templates_dir(), config.clusters_dir(), source);
        let service = ClusterService::new(&config, store.clone(), runner.clone(), workspaces);

        Self {
            workspaces_root: config.clusters_dir(),
            root,
            config,
            runner,
            store,
            service,
        }
    }

    pub fn workspace(&self, key: &ClusterKey) -> std::path::PathBuf {
        self.workspaces_root
            .join(key.provider.as_str())
            .join(&key.region)
            .join(&key.name)
    }

    pub fn state(&self) -> Arc<OrchestratorState> {
        Arc::new(OrchestratorState::new(
            self.config.clone(),
            self.service.clone(),
        ))
    }

    /// Create a cluster and wait for its provisioning run
    pub async fn created(&self, spec: ClusterSpec) -> Cluster {
        let cluster = self.service.create_cluster(spec).await.unwrap();
        self.service.wait_idle().await;
        self.store.cluster(&cluster.id).await.unwrap().unwrap()
    }
}

pub fn spec(name: &str) -> ClusterSpec {
    spec_for(CloudProvider::Aws, name)
}

pub fn spec_for(provider: CloudProvider, name: &str) -> ClusterSpec {
    ClusterSpec {
        name: name.to_string(),
        region: "us-west-1".to_string(),
        provider,
        kubernetes_version: "1.29".to_string(),
        desired_node_count: 3,
        minimum_node_count: 1,
        maximum_node_count: 5,
        instance_type: "t3.medium".to_string(),
        ami_type: "AL2_x86_64".to_string(),
        account_id: Some("tenant-1".to_string()),
        access_key: "AKIAEXAMPLE".to_string(),
        secret_key: "wJalrXUtnFEMI".to_string(),
    }
}
