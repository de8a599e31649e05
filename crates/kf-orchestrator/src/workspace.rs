//! Cluster workspaces and the shared template checkout
//!
//! Layout under the configured base directory:
//!
//! ```text
//! templates/                       shared checkout of the template repository
//! clusters/<provider>/<region>/<name>/
//!                                  one workspace per cluster, seeded from
//!                                  templates/<provider subdir> on first use
//! ```

use async_trait::async_trait;
use git2::{build::CheckoutBuilder, Cred, FetchOptions, RemoteCallbacks, Repository};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kf_core::config::OrchestratorConfig;
use kf_core::error::WorkspaceError;
use kf_core::ClusterKey;

/// Keeps a directory of provisioning templates present and current
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn sync(&self, dir: &Path) -> Result<(), WorkspaceError>;
}

/// Template source backed by a git repository
#[derive(Debug, Clone)]
pub struct GitTemplateSource {
    url: String,
    branch: String,
}

impl GitTemplateSource {
    pub fn new(url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
        }
    }
}

#[async_trait]
impl TemplateSource for GitTemplateSource {
    async fn sync(&self, dir: &Path) -> Result<(), WorkspaceError> {
        let url = self.url.clone();
        let branch = self.branch.clone();
        let dir = dir.to_path_buf();

        tokio::task::spawn_blocking(move || {
            if dir.join(".git").exists() {
                tracing::debug!("Pulling {} into {:?}", branch, dir);
                pull(&dir, &branch)
            } else {
                tracing::info!("Cloning {} ({}) into {:?}", url, branch, dir);
                clone(&url, &branch, &dir).map(|_| ())
            }
        })
        .await
        .map_err(|e| WorkspaceError::TemplateSyncFailed(e.to_string()))?
        .map_err(|e| WorkspaceError::TemplateSyncFailed(e.message().to_string()))
    }
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        Cred::default()
    });

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn clone(url: &str, branch: &str, dir: &Path) -> Result<Repository, git2::Error> {
    let mut builder = git2::build::RepoBuilder::new();
    builder.branch(branch).fetch_options(fetch_options());
    builder.clone(url, dir)
}

/// Fetch `branch` from origin and fast-forward the checkout onto it
fn pull(dir: &Path, branch: &str) -> Result<(), git2::Error> {
    let repo = Repository::open(dir)?;
    let mut remote = repo.find_remote("origin")?;
    let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
    remote.fetch(&[refspec.as_str()], Some(&mut fetch_options()), None)?;

    let commit = repo
        .find_reference(&format!("refs/remotes/origin/{branch}"))?
        .peel_to_commit()?;
    let local = format!("refs/heads/{branch}");
    repo.reference(&local, commit.id(), true, "kube-forge: sync templates")?;
    repo.set_head(&local)?;
    repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
    Ok(())
}

/// Template source for a directory managed outside the orchestrator
#[derive(Debug, Clone, Default)]
pub struct LocalTemplateSource;

#[async_trait]
impl TemplateSource for LocalTemplateSource {
    async fn sync(&self, dir: &Path) -> Result<(), WorkspaceError> {
        if tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            Ok(())
        } else {
            Err(WorkspaceError::TemplateMissing(dir.to_path_buf()))
        }
    }
}

/// Resolves and prepares per-cluster workspaces
pub struct WorkspaceManager {
    templates_dir: PathBuf,
    clusters_dir: PathBuf,
    source: Arc<dyn TemplateSource>,
}

impl WorkspaceManager {
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        clusters_dir: impl Into<PathBuf>,
        source: Arc<dyn TemplateSource>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            clusters_dir: clusters_dir.into(),
            source,
        }
    }

    /// Build from configuration; without a repository URL the template
    /// directory is used as found on disk
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let source: Arc<dyn TemplateSource> = if config.templates.repository_url.is_empty() {
            tracing::warn!(
                "No template repository configured, using {:?} as-is",
                config.templates_dir()
            );
            Arc::new(LocalTemplateSource)
        } else {
            Arc::new(GitTemplateSource::new(
                &config.templates.repository_url,
                &config.templates.branch,
            ))
        };
        Self::new(config.templates_dir(), config.clusters_dir(), source)
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Deterministic workspace path for a cluster (no I/O)
    pub fn cluster_path(&self, key: &ClusterKey) -> PathBuf {
        self.clusters_dir
            .join(key.provider.as_str())
            .join(&key.region)
            .join(&key.name)
    }

    /// Workspace path for a cluster, created if missing
    pub async fn cluster_dir(&self, key: &ClusterKey) -> Result<PathBuf, WorkspaceError> {
        let path = self.cluster_path(key);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkspaceError::Unavailable {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Clone or refresh the shared template checkout
    pub async fn sync_templates(&self) -> Result<(), WorkspaceError> {
        self.source.sync(&self.templates_dir).await
    }

    /// Seed `workspace` from the provider's template subtree if it is empty
    ///
    /// Returns whether anything was copied.
    pub async fn initialize_cluster_dir(
        &self,
        template_subdir: &str,
        workspace: &Path,
    ) -> Result<bool, WorkspaceError> {
        let source = self.templates_dir.join(template_subdir);
        let target = workspace.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let is_empty = std::fs::read_dir(&target)
                .map_err(|source| WorkspaceError::Unavailable {
                    path: target.clone(),
                    source,
                })?
                .next()
                .is_none();
            if !is_empty {
                return Ok(false);
            }
            if !source.is_dir() {
                return Err(WorkspaceError::TemplateMissing(source));
            }

            copy_tree(&source, &target).map_err(|source| WorkspaceError::Unavailable {
                path: target.clone(),
                source,
            })?;
            Ok(true)
        })
        .await
        .map_err(|e| WorkspaceError::Unavailable {
            path: workspace.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?
    }

    /// Resolve, sync and seed the workspace for one cluster
    pub async fn prepare(
        &self,
        key: &ClusterKey,
        template_subdir: &str,
    ) -> Result<PathBuf, WorkspaceError> {
        let workspace = self.cluster_dir(key).await?;
        self.sync_templates().await?;
        if self.initialize_cluster_dir(template_subdir, &workspace).await? {
            tracing::info!("Seeded workspace {:?} from {}", workspace, template_subdir);
        }
        Ok(workspace)
    }

    /// Recursively delete a workspace; a missing directory is not an error
    pub async fn remove(&self, workspace: &Path) -> Result<(), WorkspaceError> {
        match tokio::fs::remove_dir_all(workspace).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkspaceError::Unavailable {
                path: workspace.to_path_buf(),
                source,
            }),
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
