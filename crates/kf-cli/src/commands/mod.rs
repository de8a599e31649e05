//! CLI command implementations

mod cluster;
mod ping;
mod request;
mod token;

pub use cluster::{create_command, delete_command, get_command, list_command, resize_command};
pub use ping::ping_command;
pub use request::load_request;
pub use token::token_command;

use anyhow::Result;

use kf_core::{CloudProvider, ClusterKey};

/// Build a cluster key from positional arguments
pub fn cluster_key(provider: &str, region: &str, name: &str) -> Result<ClusterKey> {
    let provider: CloudProvider = provider.parse()?;
    Ok(ClusterKey::new(provider, name, region))
}
