// ABOUTME: Application teardown sequencer: ten ordered deletion steps.
// ABOUTME: Workloads first, then environments, buckets, pipeline, app stack, config, summary file.

use crate::bucket::{BucketEmptierProvider, BucketError};
use crate::commands::{
    AskExecutorProvider, CommandProvider, DynError, ExecutorProvider, TaskExecutorProvider,
};
use crate::deploy::{DeployError, StackDeployer};
use crate::error::NoAppInWorkspace;
use crate::store::{ConfigStore, Environment, StoreError};
use crate::term::{self, Progress, PromptError, Prompter};
use crate::workspace::{SUMMARY_FILE_NAME, Workspace, WorkspaceError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AppDeleteError {
    #[error(transparent)]
    NoApp(#[from] NoAppInWorkspace),

    #[error("confirm app deletion: {0}")]
    Confirm(#[source] PromptError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("list services: {0}")]
    ListServices(#[source] StoreError),

    #[error("delete services: {0}")]
    DeleteServices(#[source] DynError),

    #[error("list jobs: {0}")]
    ListJobs(#[source] StoreError),

    #[error("delete jobs: {0}")]
    DeleteJobs(#[source] DynError),

    #[error("list environments: {0}")]
    ListEnvironments(#[source] StoreError),

    #[error("list task stacks in environment {env}: {source}")]
    ListTaskStacks {
        env: String,
        #[source]
        source: DeployError,
    },

    #[error("delete task {task} in environment {env}: {source}")]
    DeleteTask {
        env: String,
        task: String,
        #[source]
        source: DynError,
    },

    #[error("delete environment {env}: {source}")]
    DeleteEnvironment {
        env: String,
        #[source]
        source: DynError,
    },

    #[error("get application {app} configuration: {source}")]
    GetApplication {
        app: String,
        #[source]
        source: StoreError,
    },

    #[error("get cross-regional resources: {0}")]
    RegionalResources(#[source] DeployError),

    #[error("empty bucket {bucket}: {source}")]
    EmptyBucket {
        bucket: String,
        #[source]
        source: BucketError,
    },

    #[error("delete pipeline: {0}")]
    DeletePipeline(#[source] DynError),

    #[error("delete application resources: {0}")]
    DeleteAppResources(#[source] DeployError),

    #[error("delete application configuration: {0}")]
    DeleteAppConfig(#[source] StoreError),

    #[error("delete workspace summary file: {0}")]
    DeleteWorkspaceFile(#[source] WorkspaceError),
}

/// Flag values for `caravel app delete`.
#[derive(Debug, Default)]
pub struct AppDeleteVars {
    pub name: Option<String>,
    pub skip_confirmation: bool,
}

/// Collaborators and sub-executor factories injected into the sequencer.
pub struct AppDeleteDeps {
    pub store: Arc<dyn ConfigStore>,
    pub deployer: Arc<dyn StackDeployer>,
    pub ws: Arc<dyn Workspace>,
    pub prompt: Arc<dyn Prompter>,
    pub progress: Arc<dyn Progress>,
    pub bucket_emptier: BucketEmptierProvider,
    pub svc_delete: ExecutorProvider,
    pub job_delete: ExecutorProvider,
    pub task_delete: TaskExecutorProvider,
    pub env_delete: AskExecutorProvider,
    pub pipeline_delete: CommandProvider,
}

pub struct AppDelete {
    skip_confirmation: bool,
    deps: AppDeleteDeps,
    name: String,
}

impl AppDelete {
    /// The application name comes from `--name` or, failing that, the
    /// workspace summary. An empty name is caught in [`AppDelete::validate`].
    pub fn new(vars: AppDeleteVars, deps: AppDeleteDeps) -> Self {
        let name = vars
            .name
            .or_else(|| deps.ws.summary().ok().map(|s| s.application))
            .unwrap_or_default();
        Self {
            skip_confirmation: vars.skip_confirmation,
            deps,
            name,
        }
    }

    pub fn validate(&self) -> Result<(), AppDeleteError> {
        if self.name.is_empty() {
            return Err(NoAppInWorkspace.into());
        }
        Ok(())
    }

    pub fn ask(&self) -> Result<(), AppDeleteError> {
        if self.skip_confirmation {
            return Ok(());
        }
        let confirmed = self
            .deps
            .prompt
            .confirm(
                &format!("Are you sure you want to delete application {}?", self.name),
                "This will delete everything the application owns, in every environment.",
            )
            .map_err(AppDeleteError::Confirm)?;
        if !confirmed {
            return Err(AppDeleteError::Cancelled);
        }
        Ok(())
    }

    /// Run the teardown steps in dependency order. The first failing step
    /// aborts the sequence; already-completed deletions are not undone.
    pub async fn execute(&mut self) -> Result<(), AppDeleteError> {
        self.delete_services().await?;
        self.delete_jobs().await?;
        let envs = self
            .deps
            .store
            .list_environments(&self.name)
            .await
            .map_err(AppDeleteError::ListEnvironments)?;
        self.delete_tasks(&envs).await?;
        self.delete_environments(&envs).await?;
        self.empty_buckets().await?;
        self.delete_pipeline().await?;
        self.delete_app_resources().await?;
        self.delete_app_config().await?;
        self.delete_workspace_summary()
    }

    async fn delete_services(&mut self) -> Result<(), AppDeleteError> {
        let services = self
            .deps
            .store
            .list_services(&self.name)
            .await
            .map_err(AppDeleteError::ListServices)?;
        if services.is_empty() {
            debug!(app = %self.name, "no services to delete");
            return Ok(());
        }
        for svc in &services {
            let mut executor =
                (self.deps.svc_delete)(&svc.name).map_err(AppDeleteError::DeleteServices)?;
            executor
                .execute()
                .await
                .map_err(AppDeleteError::DeleteServices)?;
        }
        Ok(())
    }

    async fn delete_jobs(&mut self) -> Result<(), AppDeleteError> {
        let jobs = self
            .deps
            .store
            .list_jobs(&self.name)
            .await
            .map_err(AppDeleteError::ListJobs)?;
        if jobs.is_empty() {
            debug!(app = %self.name, "no jobs to delete");
            return Ok(());
        }
        for job in &jobs {
            let mut executor =
                (self.deps.job_delete)(&job.name).map_err(AppDeleteError::DeleteJobs)?;
            executor.execute().await.map_err(AppDeleteError::DeleteJobs)?;
        }
        Ok(())
    }

    async fn delete_tasks(&mut self, envs: &[Environment]) -> Result<(), AppDeleteError> {
        for env in envs {
            let tasks = self
                .deps
                .deployer
                .list_task_stacks(&self.name, &env.name)
                .await
                .map_err(|source| AppDeleteError::ListTaskStacks {
                    env: env.name.clone(),
                    source,
                })?;
            for task in &tasks {
                let task_name = task.task_name();
                let wrap = |source| AppDeleteError::DeleteTask {
                    env: env.name.clone(),
                    task: task_name.to_string(),
                    source,
                };
                let mut executor = (self.deps.task_delete)(&env.name, task_name).map_err(wrap)?;
                executor.execute().await.map_err(wrap)?;
            }
        }
        Ok(())
    }

    async fn delete_environments(&mut self, envs: &[Environment]) -> Result<(), AppDeleteError> {
        for env in envs {
            let wrap = |source| AppDeleteError::DeleteEnvironment {
                env: env.name.clone(),
                source,
            };
            let mut executor = (self.deps.env_delete)(&env.name).map_err(wrap)?;
            executor.ask().await.map_err(wrap)?;
            executor.execute().await.map_err(wrap)?;
        }
        Ok(())
    }

    async fn empty_buckets(&mut self) -> Result<(), AppDeleteError> {
        let app = self
            .deps
            .store
            .get_application(&self.name)
            .await
            .map_err(|source| AppDeleteError::GetApplication {
                app: self.name.clone(),
                source,
            })?;
        let resources = self
            .deps
            .deployer
            .get_regional_app_resources(&app)
            .await
            .map_err(AppDeleteError::RegionalResources)?;
        self.deps.progress.start("Cleaning up deployment resources.");
        for resource in &resources {
            let wrap = |source| AppDeleteError::EmptyBucket {
                bucket: resource.s3_bucket.clone(),
                source,
            };
            let emptier = match (self.deps.bucket_emptier)(&resource.region).map_err(wrap) {
                Ok(e) => e,
                Err(err) => {
                    self.deps
                        .progress
                        .stop(&term::failure("Failed to clean up deployment resources."));
                    return Err(err);
                }
            };
            if let Err(source) = emptier.empty_bucket(&resource.s3_bucket).await {
                self.deps
                    .progress
                    .stop(&term::failure("Failed to clean up deployment resources."));
                return Err(wrap(source));
            }
        }
        self.deps
            .progress
            .stop(&term::success("Cleaned up deployment resources."));
        Ok(())
    }

    /// Pipeline deletion runs non-interactively here; its own confirmation
    /// was covered by the application-level prompt.
    async fn delete_pipeline(&mut self) -> Result<(), AppDeleteError> {
        let mut command = (self.deps.pipeline_delete)().map_err(AppDeleteError::DeletePipeline)?;
        command
            .validate()
            .await
            .map_err(AppDeleteError::DeletePipeline)?;
        command.ask().await.map_err(AppDeleteError::DeletePipeline)?;
        command
            .execute()
            .await
            .map_err(AppDeleteError::DeletePipeline)
    }

    async fn delete_app_resources(&mut self) -> Result<(), AppDeleteError> {
        self.deps.progress.start("Deleting application resources.");
        if let Err(source) = self.deps.deployer.delete_app(&self.name).await {
            self.deps
                .progress
                .stop(&term::failure("Failed to delete application resources."));
            return Err(AppDeleteError::DeleteAppResources(source));
        }
        self.deps
            .progress
            .stop(&term::success("Deleted application resources."));
        Ok(())
    }

    async fn delete_app_config(&mut self) -> Result<(), AppDeleteError> {
        self.deps
            .progress
            .start("Deleting application configuration.");
        if let Err(source) = self.deps.store.delete_application(&self.name).await {
            self.deps
                .progress
                .stop(&term::failure("Failed to delete application configuration."));
            return Err(AppDeleteError::DeleteAppConfig(source));
        }
        self.deps
            .progress
            .stop(&term::success("Deleted application configuration."));
        Ok(())
    }

    fn delete_workspace_summary(&mut self) -> Result<(), AppDeleteError> {
        self.deps
            .progress
            .start(&format!("Deleting local {SUMMARY_FILE_NAME} file."));
        if let Err(source) = self.deps.ws.delete_workspace_file() {
            self.deps.progress.stop(&term::failure(&format!(
                "Failed to delete local {SUMMARY_FILE_NAME} file."
            )));
            return Err(AppDeleteError::DeleteWorkspaceFile(source));
        }
        self.deps.progress.stop(&term::success(&format!(
            "Deleted local {SUMMARY_FILE_NAME} file."
        )));
        Ok(())
    }
}
