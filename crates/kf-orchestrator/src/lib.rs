//! kf-orchestrator: Cluster lifecycle daemon
//!
//! The orchestrator accepts cluster requests over HTTP, prepares a
//! workspace per cluster from a shared template checkout, and drives the
//! provisioning engine through create, resize and delete step sequences
//! on background tasks while persisting every status change. It also
//! issues and caches short-lived control-plane tokens.

pub mod command;
pub mod http;
pub mod lifecycle;
pub mod provider;
pub mod service;
pub mod state;
pub mod token;
pub mod workspace;

pub use service::ClusterService;
pub use state::OrchestratorState;
