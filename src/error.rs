// ABOUTME: Application-wide error types for caravel.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::commands::app_delete::AppDeleteError;
use crate::commands::pipeline_delete::PipelineDeleteError;
use crate::commands::pipeline_deploy::PipelineDeployError;
use crate::store::StoreError;
use crate::workspace::WorkspaceError;
use thiserror::Error;

/// Raised when a command needs an application name and neither a flag nor
/// the workspace summary provides one.
#[derive(Debug, Error)]
#[error("couldn't find an application associated with this workspace")]
pub struct NoAppInWorkspace;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    NoApp(#[from] NoAppInWorkspace),

    #[error(transparent)]
    PipelineDeploy(#[from] PipelineDeployError),

    #[error(transparent)]
    PipelineDelete(#[from] PipelineDeleteError),

    #[error(transparent)]
    AppDelete(#[from] AppDeleteError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Command(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
