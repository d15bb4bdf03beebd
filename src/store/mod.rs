// ABOUTME: Application configuration records and the store capability trait.
// ABOUTME: Records are owned by the configuration store; orchestrators read and delete them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Region-independent application record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub account_id: String,

    #[serde(default)]
    pub domain: Option<String>,
}

/// A named deployment target scoped to one application, region, and account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub app: String,
    pub region: String,
    pub account_id: String,

    #[serde(default)]
    pub prod: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Service,
    Job,
}

/// A service or job registered under an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    pub app: String,
    pub kind: WorkloadKind,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("application {0} not found")]
    ApplicationNotFound(String),

    #[error("environment {env} not found in application {app}")]
    EnvironmentNotFound { app: String, env: String },

    #[error("{0}")]
    Backend(String),
}

/// Read and delete operations on persisted application configuration.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn list_services(&self, app: &str) -> Result<Vec<Workload>, StoreError>;

    async fn list_jobs(&self, app: &str) -> Result<Vec<Workload>, StoreError>;

    async fn list_environments(&self, app: &str) -> Result<Vec<Environment>, StoreError>;

    async fn get_application(&self, app: &str) -> Result<Application, StoreError>;

    async fn get_environment(&self, app: &str, env: &str) -> Result<Environment, StoreError>;

    async fn delete_application(&self, app: &str) -> Result<(), StoreError>;
}
