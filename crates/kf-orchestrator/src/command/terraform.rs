//! Provisioning engine (Terraform) invocations

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use kf_core::error::StepError;
use kf_core::model::ClusterOutputs;

use super::{CommandOutput, CommandRunner, Invocation};

/// Subcommands the orchestrator runs against a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerraformStep {
    Init,
    Refresh,
    Plan,
    Apply,
    PlanDestroy,
    ApplyDestroy,
    Output,
}

impl TerraformStep {
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            TerraformStep::Init => &["init"],
            TerraformStep::Refresh => &["refresh"],
            TerraformStep::Plan => &["plan"],
            TerraformStep::Apply => &["apply", "-auto-approve"],
            TerraformStep::PlanDestroy => &["plan", "-destroy"],
            TerraformStep::ApplyDestroy => &["apply", "-destroy", "-auto-approve", "-input=false"],
            TerraformStep::Output => &["output", "-json"],
        }
    }

    /// Human-readable step name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            TerraformStep::Init => "terraform init",
            TerraformStep::Refresh => "terraform refresh",
            TerraformStep::Plan => "terraform plan",
            TerraformStep::Apply => "terraform apply",
            TerraformStep::PlanDestroy => "terraform plan -destroy",
            TerraformStep::ApplyDestroy => "terraform destroy",
            TerraformStep::Output => "terraform output",
        }
    }
}

impl std::fmt::Display for TerraformStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terraform driver bound to a command runner
#[derive(Clone)]
pub struct Terraform {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl Terraform {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub fn invocation(&self, step: TerraformStep, workspace: &Path) -> Invocation {
        Invocation::new(&self.binary)
            .args(step.args().iter().copied())
            .current_dir(workspace)
    }

    /// Run a step in `workspace`; a non-zero exit code is an error
    pub async fn run(
        &self,
        step: TerraformStep,
        workspace: &Path,
    ) -> Result<CommandOutput, StepError> {
        tracing::info!("Running {} in {:?}", step, workspace);
        let output = self
            .runner
            .run(&self.invocation(step, workspace))
            .await
            .map_err(|source| StepError::Spawn {
                step: step.name().to_string(),
                source,
            })?;

        if !output.is_success() {
            return Err(StepError::NonZeroExit {
                step: step.name().to_string(),
                code: output.exit_code,
            });
        }
        Ok(output)
    }

    /// Query and parse the workspace's output values
    pub async fn outputs(&self, workspace: &Path) -> Result<TerraformOutputs, StepError> {
        let output = self.run(TerraformStep::Output, workspace).await?;
        TerraformOutputs::parse(&output.stdout).map_err(|e| StepError::MalformedOutput {
            step: TerraformStep::Output.name().to_string(),
            reason: e.to_string(),
        })
    }

    /// Whether the binary runs at all (`terraform -help` exits 0)
    pub async fn is_available(&self) -> bool {
        match self.runner.run(&Invocation::new(&self.binary).arg("-help")).await {
            Ok(output) => output.is_success(),
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.binary, e);
                false
            }
        }
    }
}

/// One named value from `terraform output -json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputEntry {
    pub value: serde_json::Value,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, rename = "type")]
    pub value_type: Option<serde_json::Value>,
}

/// Parsed `terraform output -json` document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TerraformOutputs(HashMap<String, OutputEntry>);

impl TerraformOutputs {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, name: &str) -> Option<&OutputEntry> {
        self.0.get(name)
    }

    /// String value of a named output, if present and a string
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|entry| entry.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project the values persisted on a cluster record
    pub fn cluster_outputs(&self) -> ClusterOutputs {
        ClusterOutputs {
            endpoint: self.string("cluster_endpoint").map(str::to_string),
            ca_certificate: self.string("cluster_ca_certificate").map(str::to_string),
            security_group_id: self.string("cluster_security_group_id").map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT_JSON: &str = r#"{
        "cluster_endpoint": {"sensitive": false, "type": "string", "value": "https://ABC.gr7.us-west-1.eks.amazonaws.com"},
        "cluster_ca_certificate": {"sensitive": true, "type": "string", "value": "LS0tLS1CRUdJTg=="},
        "cluster_name": {"sensitive": false, "type": "string", "value": "demo"},
        "subnet_ids": {"sensitive": false, "type": ["list", "string"], "value": ["a", "b"]}
    }"#;

    #[test]
    fn test_step_arguments() {
        assert_eq!(TerraformStep::Apply.args(), ["apply", "-auto-approve"]);
        assert_eq!(
            TerraformStep::ApplyDestroy.args(),
            ["apply", "-destroy", "-auto-approve", "-input=false"]
        );
        assert_eq!(TerraformStep::Output.args(), ["output", "-json"]);
    }

    #[test]
    fn test_parse_outputs() {
        let outputs = TerraformOutputs::parse(OUTPUT_JSON).unwrap();
        assert_eq!(outputs.len(), 4);
        assert_eq!(outputs.string("cluster_name"), Some("demo"));
        assert!(outputs.get("cluster_ca_certificate").unwrap().sensitive);
        assert_eq!(outputs.string("subnet_ids"), None);
    }

    #[test]
    fn test_cluster_outputs_projection() {
        let projected = TerraformOutputs::parse(OUTPUT_JSON).unwrap().cluster_outputs();
        assert_eq!(
            projected.endpoint.as_deref(),
            Some("https://ABC.gr7.us-west-1.eks.amazonaws.com")
        );
        assert_eq!(projected.ca_certificate.as_deref(), Some("LS0tLS1CRUdJTg=="));
        assert!(projected.security_group_id.is_none());
    }

    #[test]
    fn test_garbage_output_fails_to_parse() {
        assert!(TerraformOutputs::parse("Error: no state").is_err());
    }

    #[test]
    fn test_invocation_runs_in_workspace() {
        let terraform = Terraform::new(Arc::new(crate::command::ProcessRunner::new()), "tf");
        let invocation = terraform.invocation(TerraformStep::PlanDestroy, Path::new("/ws"));
        assert_eq!(invocation.command_line(), "tf plan -destroy");
        assert_eq!(invocation.working_dir.as_deref(), Some(Path::new("/ws")));
    }
}
