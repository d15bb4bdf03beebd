// ABOUTME: Deployment plan types and the stack deployer seam.
// ABOUTME: Exports the capability trait and the types the orchestrators exchange with it.

mod deployer;
mod types;

pub use deployer::{DeployError, StackDeployer};
pub use types::{
    AppRegionalResources, ArtifactBucket, AssociatedEnvironment, CreatePipelineInput,
    PipelineStage, TaskStackInfo,
};
