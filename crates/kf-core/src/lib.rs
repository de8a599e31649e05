//! kf-core: Core abstractions and configuration for kube-forge
//!
//! This crate provides the domain model (clusters, credentials, access
//! tokens), the error taxonomy, configuration structures, request
//! validation, the provisioning variable-file generator and the record
//! store used by the orchestrator and the CLI.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod tfvars;
pub mod types;
pub mod validate;

pub use error::KfError;
pub use types::{CloudProvider, ClusterKey, ClusterStatus};
