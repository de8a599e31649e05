//! Cluster command implementations

use anyhow::Result;
use std::path::Path;

use kf_core::model::{ClusterSpec, NodeGroupSpec};
use kf_core::ClusterKey;

use super::load_request;
use crate::client::ApiClient;
use crate::output::{format_cluster, format_clusters, print_error, print_success, status_hint};

/// Execute the list command
pub async fn list_command(client: &ApiClient, status: Option<&str>) -> Result<()> {
    let clusters = match client.list_clusters().await {
        Ok(c) => c,
        Err(e) => {
            print_error(&format!("Failed to list clusters: {}", e));
            return Err(e.into());
        }
    };

    let clusters: Vec<_> = match status {
        Some(filter) => clusters
            .into_iter()
            .filter(|c| c.status.to_string().eq_ignore_ascii_case(filter))
            .collect(),
        None => clusters,
    };

    println!("{}", format_clusters(&clusters));
    Ok(())
}

/// Execute the get command
pub async fn get_command(client: &ApiClient, key: &ClusterKey) -> Result<()> {
    match client.get_cluster(key).await {
        Ok(cluster) => {
            print!("{}", format_cluster(&cluster));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to get cluster {}: {}", key, e));
            Err(e.into())
        }
    }
}

/// Execute the create command
pub async fn create_command(client: &ApiClient, file: &Path) -> Result<()> {
    let spec: ClusterSpec = load_request(file)?;
    let key = spec.key();

    match client.create_cluster(&spec).await {
        Ok(cluster) => {
            print_success(&format!(
                "Cluster {} accepted as {}{}",
                key,
                cluster.status,
                status_hint(cluster.status)
            ));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to create cluster {}: {}", key, e));
            Err(e.into())
        }
    }
}

/// Execute the resize command
pub async fn resize_command(client: &ApiClient, file: &Path) -> Result<()> {
    let node_group: NodeGroupSpec = load_request(file)?;
    let key = node_group.key();

    match client.resize_node_group(&node_group).await {
        Ok(cluster) => {
            print_success(&format!(
                "Resizing {} to {}/{}/{} (min/desired/max){}",
                key,
                cluster.minimum_node_count,
                cluster.desired_node_count,
                cluster.maximum_node_count,
                status_hint(cluster.status)
            ));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to resize cluster {}: {}", key, e));
            Err(e.into())
        }
    }
}

/// Execute the delete command
pub async fn delete_command(client: &ApiClient, key: &ClusterKey) -> Result<()> {
    match client.delete_cluster(key).await {
        Ok(cluster) => {
            print_success(&format!(
                "Deletion of {} started from {}",
                key, cluster.status
            ));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to delete cluster {}: {}", key, e));
            Err(e.into())
        }
    }
}
