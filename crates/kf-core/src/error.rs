//! Core error types for kube-forge

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{CloudProvider, ClusterKey, ClusterStatus, RecordKind};

/// Top-level error type for the kube-forge ecosystem
#[derive(Error, Debug)]
pub enum KfError {
    /// Request rejected before any side effect
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Workspace or template source error
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// External command failure
    #[error("Step failed: {0}")]
    Step(#[from] StepError),

    /// No implementation for the requested provider
    #[error("Unsupported cloud provider {provider} for {operation}")]
    UnsupportedProvider {
        provider: CloudProvider,
        operation: &'static str,
    },

    /// Lookup against a record that does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// Record store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KfError {
    /// Not-found error for a cluster natural key
    pub fn cluster_not_found(key: &ClusterKey) -> Self {
        KfError::NotFound {
            kind: RecordKind::Cluster,
            id: key.to_string(),
        }
    }
}

/// Validation-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Missing required field
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Field present but unusable
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A cluster with the same natural key already exists
    #[error("Cluster already exists: {0}")]
    Duplicate(ClusterKey),

    /// Status change not permitted by the lifecycle
    #[error("Cluster {key} cannot move from {from} to {to}")]
    InvalidTransition {
        key: ClusterKey,
        from: ClusterStatus,
        to: ClusterStatus,
    },

    /// Operation not allowed in the cluster's current status
    #[error("Cluster {key} is {status}, expected {expected}")]
    InvalidState {
        key: ClusterKey,
        status: ClusterStatus,
        expected: ClusterStatus,
    },
}

/// Workspace-related errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Directory could not be created or read
    #[error("Workspace unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template repository could not be cloned or refreshed
    #[error("Template sync failed: {0}")]
    TemplateSyncFailed(String),

    /// Provider template directory missing from the template source
    #[error("Template directory not found: {0}")]
    TemplateMissing(PathBuf),
}

/// External command errors; every variant carries the step name
#[derive(Error, Debug)]
pub enum StepError {
    /// Process exited with a non-zero code
    #[error("{step} failed with exit code {code}")]
    NonZeroExit { step: String, code: i32 },

    /// Process could not be started or awaited
    #[error("{step} could not be executed: {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    /// Process succeeded but its output could not be interpreted
    #[error("{step} produced unusable output: {reason}")]
    MalformedOutput { step: String, reason: String },
}

impl StepError {
    /// Name of the step that failed
    pub fn step(&self) -> &str {
        match self {
            StepError::NonZeroExit { step, .. }
            | StepError::Spawn { step, .. }
            | StepError::MalformedOutput { step, .. } => step,
        }
    }
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Snapshot could not be read or written
    #[error("Snapshot I/O failed for {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot content could not be (de)serialized
    #[error("Snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
