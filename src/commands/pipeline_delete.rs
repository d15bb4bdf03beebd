// ABOUTME: Pipeline deletion command: remove the pipeline stack and its source secret.
// ABOUTME: A workspace without a pipeline manifest makes deletion a silent no-op.

use crate::commands::{Command, DynError, Executor};
use crate::deploy::{DeployError, StackDeployer};
use crate::secrets::{SecretError, SecretStore};
use crate::store::{ConfigStore, StoreError};
use crate::term::{self, Progress, PromptError, Prompter};
use crate::workspace::{Workspace, WorkspaceError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineDeleteError {
    #[error("pipeline delete cancelled - no changes made")]
    Cancelled,

    #[error("pipeline delete confirmation prompt: {0}")]
    Confirm(#[source] PromptError),

    #[error("pipeline delete secret confirmation prompt: {0}")]
    SecretConfirm(#[source] PromptError),

    #[error("get application {app} configuration: {source}")]
    GetApplication {
        app: String,
        #[source]
        source: StoreError,
    },

    #[error("get path to pipeline manifest: {0}")]
    ManifestPath(#[source] WorkspaceError),

    #[error("read pipeline manifest: {0}")]
    ReadManifest(#[source] WorkspaceError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Pipeline(#[from] DeployError),
}

/// Flag values for `caravel pipeline delete`.
#[derive(Debug, Default)]
pub struct PipelineDeleteVars {
    pub app_name: String,
    pub name: Option<String>,
    pub skip_confirmation: bool,
    pub should_delete_secret: bool,
}

/// Collaborators injected into the command.
pub struct PipelineDeleteDeps {
    pub store: Arc<dyn ConfigStore>,
    pub deployer: Arc<dyn StackDeployer>,
    pub secrets: Arc<dyn SecretStore>,
    pub ws: Arc<dyn Workspace>,
    pub prompt: Arc<dyn Prompter>,
    pub progress: Arc<dyn Progress>,
}

pub struct PipelineDelete {
    vars: PipelineDeleteVars,
    deps: PipelineDeleteDeps,
    name: String,
    secret_name: Option<String>,
    manifest_absent: bool,
}

impl PipelineDelete {
    pub fn new(vars: PipelineDeleteVars, deps: PipelineDeleteDeps) -> Self {
        let name = vars.name.clone().unwrap_or_default();
        Self {
            vars,
            deps,
            name,
            secret_name: None,
            manifest_absent: false,
        }
    }

    /// Read the pipeline manifest to learn the pipeline's name and its
    /// legacy source secret. A missing manifest marks the command as a no-op
    /// instead of failing.
    fn resolve_name_and_secret(&mut self) -> Result<(), PipelineDeleteError> {
        let path = match self.deps.ws.pipeline_manifest_legacy_path() {
            Ok(path) => path,
            Err(WorkspaceError::NoPipelineInWorkspace) => {
                self.manifest_absent = true;
                return Ok(());
            }
            Err(source) => return Err(PipelineDeleteError::ManifestPath(source)),
        };
        let manifest = self
            .deps
            .ws
            .read_pipeline_manifest(&path)
            .map_err(PipelineDeleteError::ReadManifest)?;
        if self.name.is_empty() {
            self.name = manifest.name.clone();
        }
        self.secret_name = manifest.access_token_secret().map(str::to_string);
        Ok(())
    }

    async fn run_validate(&mut self) -> Result<(), PipelineDeleteError> {
        self.deps
            .store
            .get_application(&self.vars.app_name)
            .await
            .map_err(|source| PipelineDeleteError::GetApplication {
                app: self.vars.app_name.clone(),
                source,
            })?;
        Ok(())
    }

    async fn run_ask(&mut self) -> Result<(), PipelineDeleteError> {
        self.resolve_name_and_secret()?;
        if self.manifest_absent || self.vars.skip_confirmation {
            return Ok(());
        }
        let confirmed = self
            .deps
            .prompt
            .confirm(
                &format!(
                    "Are you sure you want to delete pipeline {} from application {}?",
                    self.name, self.vars.app_name
                ),
                "This will delete the deployment pipeline for the services in the workspace.",
            )
            .map_err(PipelineDeleteError::Confirm)?;
        if !confirmed {
            return Err(PipelineDeleteError::Cancelled);
        }
        Ok(())
    }

    async fn run_execute(&mut self) -> Result<(), PipelineDeleteError> {
        if self.manifest_absent {
            info!(app = %self.vars.app_name, "no pipeline manifest in workspace, nothing to delete");
            return Ok(());
        }
        self.delete_secret().await?;
        self.delete_stack().await
    }

    /// Delete the legacy source access token, gated behind its own
    /// confirmation unless `--delete-secret` was passed.
    async fn delete_secret(&mut self) -> Result<(), PipelineDeleteError> {
        let Some(secret) = self.secret_name.clone() else {
            return Ok(());
        };
        if !self.vars.should_delete_secret {
            let confirmed = self
                .deps
                .prompt
                .confirm(
                    &format!(
                        "Are you sure you want to delete the source secret {} associated with pipeline {}?",
                        secret, self.name
                    ),
                    "This will delete the token associated with the source of your pipeline.",
                )
                .map_err(PipelineDeleteError::SecretConfirm)?;
            if !confirmed {
                println!("Skipping deletion of secret {secret}.");
                return Ok(());
            }
        }
        self.deps.secrets.delete_secret(&secret).await?;
        println!("{}", term::success(&format!("Deleted secret {secret}.")));
        Ok(())
    }

    async fn delete_stack(&mut self) -> Result<(), PipelineDeleteError> {
        self.deps.progress.start(&format!(
            "Deleting pipeline {} from application {}.",
            self.name, self.vars.app_name
        ));
        if let Err(source) = self.deps.deployer.delete_pipeline(&self.name).await {
            self.deps.progress.stop(&term::failure(&format!(
                "Failed to delete pipeline {} from application {}.",
                self.name, self.vars.app_name
            )));
            return Err(source.into());
        }
        self.deps.progress.stop(&term::success(&format!(
            "Deleted pipeline {} from application {}.",
            self.name, self.vars.app_name
        )));
        Ok(())
    }
}

#[async_trait]
impl Executor for PipelineDelete {
    async fn execute(&mut self) -> Result<(), DynError> {
        self.run_execute().await.map_err(Into::into)
    }
}

#[async_trait]
impl Command for PipelineDelete {
    async fn validate(&mut self) -> Result<(), DynError> {
        self.run_validate().await.map_err(Into::into)
    }

    async fn ask(&mut self) -> Result<(), DynError> {
        self.run_ask().await.map_err(Into::into)
    }
}
