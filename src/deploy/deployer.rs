// ABOUTME: Stack deployer capability trait and its error type.
// ABOUTME: Provisioning itself is delegated to implementations of this trait.

use super::types::{AppRegionalResources, ArtifactBucket, CreatePipelineInput, TaskStackInfo};
use crate::store::Application;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("stack {0} not found")]
    StackNotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// Infrastructure stack operations the orchestrators depend on.
///
/// Every call blocks until the underlying operation reaches a terminal
/// state; the orchestrators never retry and wrap failures with the name of
/// the step that issued the call.
#[async_trait]
pub trait StackDeployer: Send + Sync {
    /// Ensure pipeline support resources exist for the application in the
    /// given region. Idempotent.
    async fn add_pipeline_resources_to_app(
        &self,
        app: &Application,
        region: &str,
    ) -> Result<(), DeployError>;

    /// Stack outputs for every region the application has resources in.
    async fn get_regional_app_resources(
        &self,
        app: &Application,
    ) -> Result<Vec<AppRegionalResources>, DeployError>;

    /// Stack outputs for a single region.
    async fn get_app_resources_by_region(
        &self,
        app: &Application,
        region: &str,
    ) -> Result<AppRegionalResources, DeployError>;

    /// Whether a pipeline stack with this name is already deployed.
    async fn pipeline_exists(&self, name: &str) -> Result<bool, DeployError>;

    async fn create_pipeline(
        &self,
        input: &CreatePipelineInput,
        buckets: &[ArtifactBucket],
    ) -> Result<(), DeployError>;

    async fn update_pipeline(
        &self,
        input: &CreatePipelineInput,
        buckets: &[ArtifactBucket],
    ) -> Result<(), DeployError>;

    async fn delete_pipeline(&self, name: &str) -> Result<(), DeployError>;

    /// Delete the application's infrastructure stack.
    async fn delete_app(&self, name: &str) -> Result<(), DeployError>;

    /// Standalone task stacks owned by (application, environment).
    async fn list_task_stacks(
        &self,
        app: &str,
        env: &str,
    ) -> Result<Vec<TaskStackInfo>, DeployError>;
}
