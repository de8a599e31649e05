//! Global orchestrator state

use kf_core::config::OrchestratorConfig;

use crate::service::ClusterService;

/// State shared by every HTTP handler
pub struct OrchestratorState {
    /// Configuration
    pub config: OrchestratorConfig,
    /// Cluster operations
    pub clusters: ClusterService,
}

impl OrchestratorState {
    pub fn new(config: OrchestratorConfig, clusters: ClusterService) -> Self {
        Self { config, clusters }
    }
}
