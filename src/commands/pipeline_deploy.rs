// ABOUTME: Pipeline deploy orchestrator: manifest to deployed pipeline stack.
// ABOUTME: Converts stages, resolves artifact buckets, then creates or updates the stack.

use crate::deploy::{
    ArtifactBucket, AssociatedEnvironment, CreatePipelineInput, DeployError, PipelineStage,
    StackDeployer,
};
use crate::error::NoAppInWorkspace;
use crate::manifest::{ManifestError, StageConfig};
use crate::store::{Application, ConfigStore, StoreError};
use crate::term::{self, Progress, PromptError, Prompter};
use crate::workspace::{Workspace, WorkspaceError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PipelineDeployError {
    #[error(transparent)]
    NoApp(#[from] NoAppInWorkspace),

    #[error("cannot specify app {given} because the workspace is already registered with app {registered}")]
    WorkspaceAppMismatch { given: String, registered: String },

    #[error("get application {name} configuration: {source}")]
    GetApplication {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("list pipelines in workspace: {0}")]
    ListPipelines(#[source] WorkspaceError),

    #[error("pipeline {0} not found in the workspace")]
    PipelineNotFound(String),

    #[error("add pipeline resources to application {app} in {region}: {source}")]
    AddPipelineResources {
        app: String,
        region: String,
        #[source]
        source: DeployError,
    },

    // Path resolution and manifest parsing share one message on purpose:
    // the caller only needs to know the manifest could not be read.
    #[error("read pipeline manifest: {0}")]
    ReadPipelineManifest(#[source] WorkspaceError),

    #[error("validate pipeline manifest: {0}")]
    ValidatePipelineManifest(#[source] ManifestError),

    #[error("read source from manifest: {0}")]
    ReadSource(#[source] ManifestError),

    #[error("convert environments to deployment stage: {0}")]
    ConvertStages(#[source] ConvertStagesError),

    #[error("get cross-regional resources: {0}")]
    CrossRegionalResources(#[source] DeployError),

    #[error("check if pipeline exists: {0}")]
    CheckPipelineExists(#[source] DeployError),

    #[error("get application resources in region {region}: {source}")]
    RegionalResources {
        region: String,
        #[source]
        source: DeployError,
    },

    #[error("prompt for pipeline deploy: {0}")]
    DeployConfirm(#[source] PromptError),

    #[error("create pipeline: {0}")]
    CreatePipeline(#[source] DeployError),

    #[error("update pipeline: {0}")]
    UpdatePipeline(#[source] DeployError),
}

#[derive(Debug, Error)]
pub enum ConvertStagesError {
    #[error("get local services: {0}")]
    LocalServices(#[source] WorkspaceError),

    #[error("get local jobs: {0}")]
    LocalJobs(#[source] WorkspaceError),

    #[error("get environment {name}: {source}")]
    Environment {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Flag values for `caravel pipeline deploy`.
#[derive(Debug, Default)]
pub struct PipelineDeployVars {
    pub app_name: Option<String>,
    pub name: Option<String>,
    pub skip_confirmation: bool,
}

/// Collaborators injected into the orchestrator.
pub struct PipelineDeployDeps {
    pub store: Arc<dyn ConfigStore>,
    pub deployer: Arc<dyn StackDeployer>,
    pub ws: Arc<dyn Workspace>,
    pub prompt: Arc<dyn Prompter>,
    pub progress: Arc<dyn Progress>,
}

pub struct PipelineDeploy {
    vars: PipelineDeployVars,
    deps: PipelineDeployDeps,
    region: String,
    app: Option<Application>,
}

impl PipelineDeploy {
    pub fn new(vars: PipelineDeployVars, deps: PipelineDeployDeps, region: String) -> Self {
        Self {
            vars,
            deps,
            region,
            app: None,
        }
    }

    /// Resolve and check the application this workspace is registered with.
    pub async fn validate(&mut self) -> Result<(), PipelineDeployError> {
        let registered = self
            .deps
            .ws
            .summary()
            .map_err(|_| NoAppInWorkspace)?
            .application;
        if let Some(given) = &self.vars.app_name
            && given != &registered
        {
            return Err(PipelineDeployError::WorkspaceAppMismatch {
                given: given.clone(),
                registered,
            });
        }
        let app = self
            .deps
            .store
            .get_application(&registered)
            .await
            .map_err(|source| PipelineDeployError::GetApplication {
                name: registered,
                source,
            })?;
        self.app = Some(app);
        Ok(())
    }

    /// Check that a pipeline named with `--name` exists in the workspace.
    pub async fn ask(&mut self) -> Result<(), PipelineDeployError> {
        if let Some(name) = &self.vars.name {
            let pipelines = self
                .deps
                .ws
                .list_pipelines()
                .map_err(PipelineDeployError::ListPipelines)?;
            if !pipelines.iter().any(|p| &p.name == name) {
                return Err(PipelineDeployError::PipelineNotFound(name.clone()));
            }
        }
        Ok(())
    }

    /// Run the full deploy sequence. Each step's failure short-circuits the
    /// rest and carries the step name in its message.
    pub async fn execute(&mut self) -> Result<(), PipelineDeployError> {
        if self.app.is_none() {
            self.validate().await?;
        }
        let Some(app) = self.app.clone() else {
            return Err(NoAppInWorkspace.into());
        };

        self.add_pipeline_resources(&app).await?;

        let path = self
            .deps
            .ws
            .pipeline_manifest_legacy_path()
            .map_err(PipelineDeployError::ReadPipelineManifest)?;
        let manifest = self
            .deps
            .ws
            .read_pipeline_manifest(&path)
            .map_err(PipelineDeployError::ReadPipelineManifest)?;
        debug!(pipeline = %manifest.name, path = %path.display(), "read pipeline manifest");

        manifest
            .validate()
            .map_err(PipelineDeployError::ValidatePipelineManifest)?;
        let source = manifest
            .source_provider()
            .map_err(PipelineDeployError::ReadSource)?;

        let stages = self
            .convert_stages(&app.name, &manifest.stages)
            .await
            .map_err(PipelineDeployError::ConvertStages)?;

        let buckets = self
            .artifact_buckets(&app)
            .await
            .map_err(PipelineDeployError::CrossRegionalResources)?;

        let exists = self
            .deps
            .deployer
            .pipeline_exists(&manifest.name)
            .await
            .map_err(PipelineDeployError::CheckPipelineExists)?;

        let regional = self
            .deps
            .deployer
            .get_app_resources_by_region(&app, &self.region)
            .await
            .map_err(|source| PipelineDeployError::RegionalResources {
                region: self.region.clone(),
                source,
            })?;

        let input = CreatePipelineInput {
            app_name: app.name.clone(),
            name: manifest.name.clone(),
            source,
            build_image: manifest.build.as_ref().map(|b| b.image.clone()),
            stages,
            artifact_bucket: regional.s3_bucket,
        };

        // Existence strictly gates create vs update; there is no upsert.
        if !exists {
            return self.create(&input, &buckets).await;
        }
        if !self.vars.skip_confirmation {
            let confirmed = self
                .deps
                .prompt
                .confirm(
                    &format!(
                        "Are you sure you want to redeploy an existing pipeline: {}?",
                        input.name
                    ),
                    "",
                )
                .map_err(PipelineDeployError::DeployConfirm)?;
            if !confirmed {
                info!(pipeline = %input.name, "redeploy declined, leaving pipeline unchanged");
                return Ok(());
            }
        }
        self.update(&input, &buckets).await
    }

    async fn add_pipeline_resources(&self, app: &Application) -> Result<(), PipelineDeployError> {
        self.deps.progress.start(&format!(
            "Adding pipeline resources to your application: {}",
            app.name
        ));
        if let Err(source) = self
            .deps
            .deployer
            .add_pipeline_resources_to_app(app, &self.region)
            .await
        {
            self.deps.progress.stop(&term::failure(&format!(
                "Failed to add pipeline resources to your application: {}",
                app.name
            )));
            return Err(PipelineDeployError::AddPipelineResources {
                app: app.name.clone(),
                region: self.region.clone(),
                source,
            });
        }
        self.deps.progress.stop(&term::success(&format!(
            "Successfully added pipeline resources to your application: {}",
            app.name
        )));
        Ok(())
    }

    async fn create(
        &self,
        input: &CreatePipelineInput,
        buckets: &[ArtifactBucket],
    ) -> Result<(), PipelineDeployError> {
        self.deps
            .progress
            .start(&format!("Creating a new pipeline: {}", input.name));
        if let Err(source) = self.deps.deployer.create_pipeline(input, buckets).await {
            self.deps.progress.stop(&term::failure(&format!(
                "Failed to create a new pipeline: {}",
                input.name
            )));
            return Err(PipelineDeployError::CreatePipeline(source));
        }
        self.deps.progress.stop(&term::success(&format!(
            "Successfully created a new pipeline: {}",
            input.name
        )));
        Ok(())
    }

    async fn update(
        &self,
        input: &CreatePipelineInput,
        buckets: &[ArtifactBucket],
    ) -> Result<(), PipelineDeployError> {
        self.deps.progress.start(&format!(
            "Proposing infrastructure changes for the pipeline: {}",
            input.name
        ));
        if let Err(source) = self.deps.deployer.update_pipeline(input, buckets).await {
            self.deps.progress.stop(&term::failure(&format!(
                "Failed to update pipeline: {}",
                input.name
            )));
            return Err(PipelineDeployError::UpdatePipeline(source));
        }
        self.deps.progress.stop(&term::success(&format!(
            "Successfully updated pipeline: {}",
            input.name
        )));
        Ok(())
    }

    /// Resolve manifest stages to environments, sharing one locally defined
    /// workload set across every stage. Any resolution failure aborts the
    /// whole conversion.
    pub async fn convert_stages(
        &self,
        app_name: &str,
        stages: &[StageConfig],
    ) -> Result<Vec<PipelineStage>, ConvertStagesError> {
        let services = self
            .deps
            .ws
            .list_local_services()
            .map_err(ConvertStagesError::LocalServices)?;
        let jobs = self
            .deps
            .ws
            .list_local_jobs()
            .map_err(ConvertStagesError::LocalJobs)?;
        let mut local_workloads: Vec<String> = Vec::new();
        for name in services.into_iter().chain(jobs) {
            if !local_workloads.contains(&name) {
                local_workloads.push(name);
            }
        }

        let mut converted = Vec::with_capacity(stages.len());
        for stage in stages {
            let env = self
                .deps
                .store
                .get_environment(app_name, &stage.name)
                .await
                .map_err(|source| ConvertStagesError::Environment {
                    name: stage.name.clone(),
                    source,
                })?;
            converted.push(PipelineStage {
                environment: AssociatedEnvironment {
                    name: env.name,
                    region: env.region,
                    account_id: env.account_id,
                },
                local_workloads: local_workloads.clone(),
                requires_approval: stage.requires_approval,
                test_commands: stage.test_commands.clone(),
            });
        }
        Ok(converted)
    }

    /// Per-region artifact buckets the application owns, in the deployer's
    /// enumeration order.
    pub async fn artifact_buckets(
        &self,
        app: &Application,
    ) -> Result<Vec<ArtifactBucket>, DeployError> {
        let resources = self.deps.deployer.get_regional_app_resources(app).await?;
        Ok(resources
            .into_iter()
            .map(|r| ArtifactBucket {
                bucket_name: r.s3_bucket,
                key_arn: r.kms_key_arn,
            })
            .collect())
    }
}
