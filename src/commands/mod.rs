// ABOUTME: Command objects for the CLI and capability traits for injected sub-executors.
// ABOUTME: The teardown sequencer drives sub-deletions through these traits only.

pub mod app_delete;
pub mod pipeline_delete;
pub mod pipeline_deploy;

use async_trait::async_trait;

/// Error type crossing the executor boundary; the sequencer wraps it with
/// the failing step's name.
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// A sub-operation that performs its effect in one call.
#[async_trait]
pub trait Executor: Send {
    async fn execute(&mut self) -> Result<(), DynError>;
}

/// A sub-operation that gathers input interactively before executing.
#[async_trait]
pub trait AskExecutor: Executor {
    async fn ask(&mut self) -> Result<(), DynError>;
}

/// A full command: validate flags, gather input, then execute.
#[async_trait]
pub trait Command: Executor {
    async fn validate(&mut self) -> Result<(), DynError>;
    async fn ask(&mut self) -> Result<(), DynError>;
}

/// Builds a deletion executor for one application.
pub type ExecutorProvider =
    Box<dyn Fn(&str) -> Result<Box<dyn Executor>, DynError> + Send + Sync>;

/// Builds a two-phase deletion executor for one environment.
pub type AskExecutorProvider =
    Box<dyn Fn(&str) -> Result<Box<dyn AskExecutor>, DynError> + Send + Sync>;

/// Builds a task deletion executor keyed by (environment, task).
pub type TaskExecutorProvider =
    Box<dyn Fn(&str, &str) -> Result<Box<dyn Executor>, DynError> + Send + Sync>;

/// Builds a full sub-command, currently only used for pipeline deletion.
pub type CommandProvider = Box<dyn Fn() -> Result<Box<dyn Command>, DynError> + Send + Sync>;
