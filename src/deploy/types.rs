// ABOUTME: Deployment plan types shared between the orchestrators and the stack deployer.
// ABOUTME: Resolved stages, artifact buckets, regional resources, and task stack identity.

use crate::manifest::Provider;
use serde::{Deserialize, Serialize};

/// The environment a pipeline stage deploys into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedEnvironment {
    pub name: String,
    pub region: String,
    pub account_id: String,
}

/// A manifest stage resolved against the configuration store.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    pub environment: AssociatedEnvironment,

    /// Names of the workloads defined in the local workspace, identical for
    /// every stage of one pipeline.
    pub local_workloads: Vec<String>,

    pub requires_approval: bool,

    pub test_commands: Vec<String>,
}

/// Per-region artifact storage for a pipeline. Unique by region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBucket {
    pub bucket_name: String,
    pub key_arn: String,
}

/// Region-scoped outputs of an application's infrastructure stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRegionalResources {
    pub region: String,
    pub s3_bucket: String,
    pub kms_key_arn: String,
}

/// Identity of a standalone task stack, discovered during teardown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStackInfo {
    pub stack_name: String,
    pub app: String,
    pub env: String,
}

const TASK_STACK_PREFIX: &str = "task-";

impl TaskStackInfo {
    /// The task name without the stack prefix.
    pub fn task_name(&self) -> &str {
        self.stack_name
            .strip_prefix(TASK_STACK_PREFIX)
            .unwrap_or(&self.stack_name)
    }
}

/// Everything the deployer needs to render a pipeline stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePipelineInput {
    pub app_name: String,
    pub name: String,
    pub source: Provider,
    pub build_image: Option<String>,
    pub stages: Vec<PipelineStage>,

    /// Artifact bucket in the application's home region, used for stack
    /// template parameters.
    pub artifact_bucket: String,
}
