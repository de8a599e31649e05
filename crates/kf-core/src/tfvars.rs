//! Provisioning variable file generation
//!
//! A cluster spec is projected into an ordered list of `key = "value"`
//! assignments and written as `terraform.tfvars` at the root of the
//! cluster's workspace. Values are double-quoted without escaping, so
//! inputs must not contain quote characters (validation rejects them).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::ClusterSpec;

/// File name of the generated variable file
pub const TFVARS_FILE: &str = "terraform.tfvars";

/// Ordered key/value assignments for one provisioning run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TfVars {
    entries: Vec<(String, String)>,
}

impl TfVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in variable-file syntax, one assignment per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            let _ = writeln!(out, "{} = \"{}\"", key, value);
        }
        out
    }
}

/// Provider-independent variables shared by every template set
pub fn base_variables(spec: &ClusterSpec) -> TfVars {
    let mut vars = TfVars::new();
    vars.insert("cluster_name", &spec.name);
    vars.insert("region", &spec.region);
    vars.insert("cluster_version", &spec.kubernetes_version);
    vars.insert("node_group_desired_size", spec.desired_node_count.to_string());
    vars.insert("node_group_min_size", spec.minimum_node_count.to_string());
    vars.insert("node_group_max_size", spec.maximum_node_count.to_string());
    vars.insert("instance_type", &spec.instance_type);
    vars.insert("ami_type", &spec.ami_type);
    vars
}

/// Path of the variable file inside a workspace
pub fn tfvars_path(workspace: &Path) -> PathBuf {
    workspace.join(TFVARS_FILE)
}

/// Write the variable file into `workspace`
///
/// Failures are logged and swallowed: the following provisioning step
/// fails on its own when the file is missing or malformed.
pub async fn write_tfvars(workspace: &Path, vars: &TfVars) {
    let path = tfvars_path(workspace);
    match tokio::fs::write(&path, vars.render()).await {
        Ok(()) => tracing::info!("Variable file written to {:?} ({} entries)", path, vars.len()),
        Err(e) => tracing::error!("Failed to write variable file {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CloudProvider;

    fn demo_spec() -> ClusterSpec {
        ClusterSpec {
            name: "demo".to_string(),
            region: "us-west-1".to_string(),
            provider: CloudProvider::Aws,
            kubernetes_version: "1.29".to_string(),
            desired_node_count: 3,
            minimum_node_count: 1,
            maximum_node_count: 4,
            instance_type: "t3.medium".to_string(),
            ami_type: "AL2_x86_64".to_string(),
            account_id: None,
            access_key: String::new(),
            secret_key: String::new(),
        }
    }

    #[test]
    fn test_base_variables_for_demo_spec() {
        let vars = base_variables(&demo_spec());
        assert_eq!(vars.get("cluster_name"), Some("demo"));
        assert_eq!(vars.get("region"), Some("us-west-1"));
        assert_eq!(vars.get("node_group_desired_size"), Some("3"));
        assert_eq!(vars.get("node_group_min_size"), Some("1"));
        assert_eq!(vars.get("node_group_max_size"), Some("4"));
        assert_eq!(vars.len(), 8);
    }

    #[test]
    fn test_render_quotes_values_per_line() {
        let rendered = base_variables(&demo_spec()).render();
        assert!(rendered.lines().any(|l| l == r#"cluster_name = "demo""#));
        assert!(rendered.starts_with("cluster_name = "));
        assert!(rendered.ends_with("\"\n"));
        assert_eq!(rendered.lines().count(), 8);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut vars = TfVars::new();
        vars.insert("a", "1");
        vars.insert("b", "2");
        vars.insert("a", "3");
        let keys: Vec<_> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(vars.get("a"), Some("3"));
    }

    #[tokio::test]
    async fn test_write_tfvars_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = TfVars::new();
        vars.insert("key", "value");
        write_tfvars(dir.path(), &vars).await;

        let content = tokio::fs::read_to_string(dir.path().join(TFVARS_FILE))
            .await
            .unwrap();
        assert_eq!(content, "key = \"value\"\n");
    }

    #[tokio::test]
    async fn test_write_tfvars_to_missing_dir_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        write_tfvars(&missing, &base_variables(&demo_spec())).await;
        assert!(!tfvars_path(&missing).exists());
    }
}
