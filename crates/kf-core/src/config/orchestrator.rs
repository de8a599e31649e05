//! Orchestrator configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;

/// Configuration for the orchestrator daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Root directory for the template checkout and cluster workspaces
    pub base_dir: PathBuf,

    /// Template repository
    pub templates: TemplateConfig,

    /// External tool binaries
    pub tools: ToolsConfig,

    /// Pause between plan- and apply-class steps so the engine releases its state lock
    #[serde(with = "duration_secs")]
    pub step_settle_delay: Duration,

    /// JSON snapshot of the record store (in-memory only when unset)
    pub state_file: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let base_dir = super::default_base_dir();

        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            state_file: Some(base_dir.join("records.json")),
            base_dir,
            templates: TemplateConfig::default(),
            tools: ToolsConfig::default(),
            step_settle_delay: Duration::from_secs(2),
        }
    }
}

impl OrchestratorConfig {
    /// Directory holding the shared template checkout
    pub fn templates_dir(&self) -> PathBuf {
        self.base_dir.join("templates")
    }

    /// Directory holding per-cluster workspaces
    pub fn clusters_dir(&self) -> PathBuf {
        self.base_dir.join("clusters")
    }

    /// Reject configurations the orchestrator cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "bind_address '{}' is not a socket address",
                self.bind_address
            )));
        }
        if self.templates.branch.trim().is_empty() {
            return Err(ConfigError::Invalid("templates.branch is empty".to_string()));
        }
        if self.tools.terraform.trim().is_empty() {
            return Err(ConfigError::Invalid("tools.terraform is empty".to_string()));
        }
        Ok(())
    }
}

/// Location of the provisioning templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Git URL of the template repository
    pub repository_url: String,

    /// Branch to clone and pull
    pub branch: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            repository_url: String::new(),
            branch: "main".to_string(),
        }
    }
}

/// Names or paths of external binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub terraform: String,
    pub aws: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            terraform: "terraform".to_string(),
            aws: "aws".to_string(),
        }
    }
}
