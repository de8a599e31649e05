//! Request bodies read from TOML or JSON files

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a request body; the format follows the file extension
pub fn load_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML in {:?}", path)),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {:?}", path)),
        _ => bail!("Unsupported request file {:?}: expected .toml or .json", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_core::model::{ClusterSpec, NodeGroupSpec};
    use kf_core::CloudProvider;

    #[test]
    fn test_load_toml_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.toml");
        std::fs::write(
            &path,
            r#"
name = "demo"
region = "us-west-1"
provider = "AWS"
kubernetesVersion = "1.29"
desiredNodeCount = 3
minimumNodeCount = 1
maximumNodeCount = 5
instanceType = "t3.medium"
amiType = "AL2_x86_64"
accessKey = "AKIA"
secretKey = "secret"
"#,
        )
        .unwrap();

        let spec: ClusterSpec = load_request(&path).unwrap();
        assert_eq!(spec.name, "demo");
        assert_eq!(spec.provider, CloudProvider::Aws);
        assert_eq!(spec.desired_node_count, 3);
    }

    #[test]
    fn test_load_json_node_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resize.json");
        std::fs::write(
            &path,
            r#"{"name":"demo","region":"us-west-1","provider":"AWS","desiredNodeCount":4,"minimumNodeCount":2,"maximumNodeCount":6}"#,
        )
        .unwrap();

        let node_group: NodeGroupSpec = load_request(&path).unwrap();
        assert_eq!(node_group.maximum_node_count, 6);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.yaml");
        std::fs::write(&path, "name: demo").unwrap();
        assert!(load_request::<ClusterSpec>(&path).is_err());
    }
}
