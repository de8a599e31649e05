//! Request validation
//!
//! Runs before any record is written or any command is started.

use crate::error::ValidationError;
use crate::model::{ClusterSpec, NodeGroupSpec};

/// Validate a cluster creation request
pub fn validate_cluster_spec(spec: &ClusterSpec) -> Result<(), ValidationError> {
    check_identifier("Cluster name", &spec.name)?;
    check_identifier("Region", &spec.region)?;
    for (field, value) in [
        ("Kubernetes version", &spec.kubernetes_version),
        ("Instance type", &spec.instance_type),
        ("AMI type", &spec.ami_type),
    ] {
        check_quotable(field, value)?;
    }
    check_scale_bounds(
        spec.minimum_node_count,
        spec.desired_node_count,
        spec.maximum_node_count,
    )
}

/// Validate a node-group resize request
pub fn validate_node_group(spec: &NodeGroupSpec) -> Result<(), ValidationError> {
    check_identifier("Cluster name", &spec.name)?;
    check_identifier("Region", &spec.region)?;
    if spec.maximum_node_count < 1 {
        return Err(ValidationError::Invalid {
            field: "Maximum node count",
            reason: "must be greater than 0".to_string(),
        });
    }
    check_scale_bounds(
        spec.minimum_node_count,
        spec.desired_node_count,
        spec.maximum_node_count,
    )
}

/// Names and regions become path segments and quoted variable values
fn check_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if value == "." || value.contains("..") || value.contains(['/', '\\']) {
        return Err(ValidationError::Invalid {
            field,
            reason: format!("'{}' is not a valid path segment", value),
        });
    }
    check_quotable(field, value)
}

fn check_quotable(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains(['"', '\n', '\r']) {
        return Err(ValidationError::Invalid {
            field,
            reason: "must not contain quotes or line breaks".to_string(),
        });
    }
    Ok(())
}

fn check_scale_bounds(min: u32, desired: u32, max: u32) -> Result<(), ValidationError> {
    if min > max {
        return Err(ValidationError::Invalid {
            field: "Minimum node count",
            reason: format!("{} exceeds maximum {}", min, max),
        });
    }
    if desired < min || desired > max {
        return Err(ValidationError::Invalid {
            field: "Desired node count",
            reason: format!("{} is outside [{}, {}]", desired, min, max),
        });
    }
    Ok(())
}
