//! Output formatting utilities for the CLI

use tabled::{settings::Style, Table, Tabled};

use kf_core::api::AccessTokenResponse;
use kf_core::model::Cluster;
use kf_core::ClusterStatus;

/// Format a list of clusters as an ASCII table
pub fn format_clusters(clusters: &[Cluster]) -> String {
    if clusters.is_empty() {
        return "No clusters".to_string();
    }

    #[derive(Tabled)]
    struct ClusterRow {
        #[tabled(rename = "PROVIDER")]
        provider: String,
        #[tabled(rename = "REGION")]
        region: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "VERSION")]
        version: String,
        #[tabled(rename = "NODES (MIN/DESIRED/MAX)")]
        nodes: String,
        #[tabled(rename = "STATUS")]
        status: String,
        #[tabled(rename = "UPDATED")]
        updated: String,
    }

    let rows: Vec<ClusterRow> = clusters
        .iter()
        .map(|c| ClusterRow {
            provider: c.provider.to_string(),
            region: c.region.clone(),
            name: c.name.clone(),
            version: c.kubernetes_version.clone(),
            nodes: format!(
                "{}/{}/{}",
                c.minimum_node_count, c.desired_node_count, c.maximum_node_count
            ),
            status: c.status.to_string(),
            updated: c.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format one cluster with its captured outputs
pub fn format_cluster(cluster: &Cluster) -> String {
    let mut output = String::new();

    output.push_str(&format!("Cluster: {}\n", cluster.key()));
    output.push_str(&format!("ID: {}\n", cluster.id));
    output.push_str(&format!("Status: {}\n", cluster.status));
    output.push_str(&format!("Kubernetes: {}\n", cluster.kubernetes_version));
    output.push_str(&format!(
        "Instances: {} ({})\n",
        cluster.instance_type, cluster.ami_type
    ));
    output.push_str(&format!(
        "Nodes: min {} / desired {} / max {}\n",
        cluster.minimum_node_count, cluster.desired_node_count, cluster.maximum_node_count
    ));

    if let Some(outputs) = &cluster.outputs {
        if let Some(endpoint) = &outputs.endpoint {
            output.push_str(&format!("Endpoint: {}\n", endpoint));
        }
        if let Some(security_group) = &outputs.security_group_id {
            output.push_str(&format!("Security group: {}\n", security_group));
        }
    }

    output
}

/// Hint printed after a request that started a background run
pub fn status_hint(status: ClusterStatus) -> &'static str {
    if status.is_terminal() || status == ClusterStatus::Created {
        ""
    } else {
        " (poll with `kube-forge get` to follow progress)"
    }
}

pub fn format_token(token: &AccessTokenResponse) -> String {
    format!(
        "{}\nExpires: {}\n",
        token.token,
        token.expiration.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
