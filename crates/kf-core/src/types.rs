//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cloud provider hosting a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloudProvider {
    /// Amazon Web Services (EKS)
    Aws,
    /// Microsoft Azure (AKS)
    Azure,
    /// Google Cloud (GKE)
    Google,
}

impl CloudProvider {
    /// All known providers
    pub const ALL: [CloudProvider; 3] = [Self::Aws, Self::Azure, Self::Google];

    /// Lowercase name used for directory layout and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Google => "google",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudProvider::Aws => write!(f, "AWS"),
            CloudProvider::Azure => write!(f, "AZURE"),
            CloudProvider::Google => write!(f, "GOOGLE"),
        }
    }
}

/// Error returned when parsing an unknown provider name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown cloud provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for CloudProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(CloudProvider::Aws),
            "azure" => Ok(CloudProvider::Azure),
            "google" | "gcp" => Ok(CloudProvider::Google),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Provisioning status of a cluster
///
/// Creation runs `New -> Initializing -> Planing -> Creating -> Created`,
/// deletion runs `PlaningDelete -> Deleting -> Deleted`. `Error` can be
/// entered from any in-progress state. `Deleted` is terminal; `Error` only
/// leaves through an explicit teardown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    New,
    Initializing,
    Planing,
    Creating,
    Created,
    Error,
    PlaningDelete,
    Deleting,
    Deleted,
}

impl ClusterStatus {
    /// Whether a persisted status change from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: ClusterStatus) -> bool {
        use ClusterStatus::*;

        matches!(
            (self, next),
            (New, Initializing)
                | (New, PlaningDelete)
                | (New, Error)
                | (Initializing, Planing)
                | (Initializing, Error)
                | (Planing, Creating)
                | (Planing, Error)
                | (Creating, Created)
                | (Creating, Error)
                | (Created, Initializing)
                | (Created, PlaningDelete)
                | (PlaningDelete, Deleting)
                | (PlaningDelete, Error)
                | (Deleting, Deleted)
                | (Deleting, Error)
                | (Error, PlaningDelete)
        )
    }

    /// Whether a lifecycle run is currently driving this cluster
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            ClusterStatus::Initializing
                | ClusterStatus::Planing
                | ClusterStatus::Creating
                | ClusterStatus::PlaningDelete
                | ClusterStatus::Deleting
        )
    }

    /// Whether no automatic transition leaves this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClusterStatus::Error | ClusterStatus::Deleted)
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterStatus::New => "NEW",
            ClusterStatus::Initializing => "INITIALIZING",
            ClusterStatus::Planing => "PLANING",
            ClusterStatus::Creating => "CREATING",
            ClusterStatus::Created => "CREATED",
            ClusterStatus::Error => "ERROR",
            ClusterStatus::PlaningDelete => "PLANING_DELETE",
            ClusterStatus::Deleting => "DELETING",
            ClusterStatus::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// Natural key of a cluster: unique per (provider, name, region)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterKey {
    pub provider: CloudProvider,
    pub name: String,
    pub region: String,
}

impl ClusterKey {
    pub fn new(provider: CloudProvider, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider.as_str(), self.region, self.name)
    }
}

/// Kind of persisted record, used in not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Cluster,
    Credential,
    AccessToken,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Cluster => write!(f, "Cluster"),
            RecordKind::Credential => write!(f, "Credential"),
            RecordKind::AccessToken => write!(f, "Access token"),
        }
    }
}
