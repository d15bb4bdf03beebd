// ABOUTME: JSON-file-backed backend driver implementing every capability seam.
// ABOUTME: State lives in one file next to the workspace; every mutation rewrites it.

use crate::bucket::{BucketEmptier, BucketError};
use crate::commands::{AskExecutor, DynError, Executor};
use crate::deploy::{
    AppRegionalResources, ArtifactBucket, CreatePipelineInput, DeployError, StackDeployer,
    TaskStackInfo,
};
use crate::secrets::{SecretError, SecretStore};
use crate::store::{
    Application, ConfigStore, Environment, StoreError, Workload, WorkloadKind,
};
use crate::term::Prompter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EnvState {
    region: String,
    account_id: String,

    #[serde(default)]
    prod: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegionalState {
    bucket: String,
    key_arn: String,

    /// Object keys currently stored in the bucket.
    #[serde(default)]
    objects: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PipelineRecord {
    repository: String,
    branch: String,

    #[serde(default)]
    stages: Vec<String>,

    artifact_bucket: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AppState {
    account_id: String,

    #[serde(default)]
    domain: Option<String>,

    #[serde(default)]
    environments: BTreeMap<String, EnvState>,

    #[serde(default)]
    services: Vec<String>,

    #[serde(default)]
    jobs: Vec<String>,

    #[serde(default)]
    regional: BTreeMap<String, RegionalState>,

    #[serde(default)]
    pipelines: BTreeMap<String, PipelineRecord>,

    #[serde(default)]
    task_stacks: Vec<TaskStackInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct State {
    #[serde(default = "default_region")]
    default_region: String,

    #[serde(default)]
    applications: BTreeMap<String, AppState>,

    #[serde(default)]
    secrets: BTreeSet<String>,
}

fn default_region() -> String {
    "local-1".to_string()
}

impl Default for State {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            applications: BTreeMap::new(),
            secrets: BTreeSet::new(),
        }
    }
}

/// Single-file backend. All capability traits are served from one state
/// struct guarded by a mutex; the file is rewritten after each mutation.
pub struct LocalBackend {
    path: PathBuf,
    state: Mutex<State>,
}

impl LocalBackend {
    /// Load state from `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(io::Error::other)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => State::default(),
            Err(err) => return Err(err),
        };
        debug!(path = %path.display(), "opened local backend state");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn default_region(&self) -> String {
        self.lock().default_region.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, state: &State) -> io::Result<()> {
        let raw = serde_json::to_string_pretty(state).map_err(io::Error::other)?;
        fs::write(&self.path, raw)
    }

    fn with_app<T>(
        &self,
        app: &str,
        f: impl FnOnce(&AppState) -> T,
    ) -> Result<T, StoreError> {
        let state = self.lock();
        state
            .applications
            .get(app)
            .map(f)
            .ok_or_else(|| StoreError::ApplicationNotFound(app.to_string()))
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<T, String>,
    ) -> Result<T, String> {
        let mut state = self.lock();
        let value = f(&mut state)?;
        self.save(&state).map_err(|e| e.to_string())?;
        Ok(value)
    }

    fn workloads(&self, app: &str, kind: WorkloadKind) -> Result<Vec<Workload>, StoreError> {
        self.with_app(app, |record| {
            let names = match kind {
                WorkloadKind::Service => &record.services,
                WorkloadKind::Job => &record.jobs,
            };
            names
                .iter()
                .map(|name| Workload {
                    name: name.clone(),
                    app: app.to_string(),
                    kind,
                })
                .collect()
        })
    }
}

#[async_trait]
impl ConfigStore for LocalBackend {
    async fn list_services(&self, app: &str) -> Result<Vec<Workload>, StoreError> {
        self.workloads(app, WorkloadKind::Service)
    }

    async fn list_jobs(&self, app: &str) -> Result<Vec<Workload>, StoreError> {
        self.workloads(app, WorkloadKind::Job)
    }

    async fn list_environments(&self, app: &str) -> Result<Vec<Environment>, StoreError> {
        self.with_app(app, |record| {
            record
                .environments
                .iter()
                .map(|(name, env)| Environment {
                    name: name.clone(),
                    app: app.to_string(),
                    region: env.region.clone(),
                    account_id: env.account_id.clone(),
                    prod: env.prod,
                })
                .collect()
        })
    }

    async fn get_application(&self, app: &str) -> Result<Application, StoreError> {
        self.with_app(app, |record| Application {
            name: app.to_string(),
            account_id: record.account_id.clone(),
            domain: record.domain.clone(),
        })
    }

    async fn get_environment(&self, app: &str, env: &str) -> Result<Environment, StoreError> {
        self.with_app(app, |record| {
            record.environments.get(env).map(|e| Environment {
                name: env.to_string(),
                app: app.to_string(),
                region: e.region.clone(),
                account_id: e.account_id.clone(),
                prod: e.prod,
            })
        })?
        .ok_or_else(|| StoreError::EnvironmentNotFound {
            app: app.to_string(),
            env: env.to_string(),
        })
    }

    async fn delete_application(&self, app: &str) -> Result<(), StoreError> {
        self.mutate(|state| {
            if state.applications.remove(app).is_none() {
                return Err(format!("application {app} not found"));
            }
            Ok(())
        })
        .map_err(StoreError::Backend)
    }
}

#[async_trait]
impl StackDeployer for LocalBackend {
    async fn add_pipeline_resources_to_app(
        &self,
        app: &Application,
        region: &str,
    ) -> Result<(), DeployError> {
        self.mutate(|state| {
            let record = state
                .applications
                .get_mut(&app.name)
                .ok_or_else(|| format!("application {} not found", app.name))?;
            record
                .regional
                .entry(region.to_string())
                .or_insert_with(|| RegionalState {
                    bucket: format!("{}-artifacts-{region}", app.name),
                    key_arn: format!("key/{}/{region}", app.name),
                    objects: Vec::new(),
                });
            Ok(())
        })
        .map_err(DeployError::Backend)
    }

    async fn get_regional_app_resources(
        &self,
        app: &Application,
    ) -> Result<Vec<AppRegionalResources>, DeployError> {
        let state = self.lock();
        let record = state
            .applications
            .get(&app.name)
            .ok_or_else(|| DeployError::StackNotFound(app.name.clone()))?;
        Ok(record
            .regional
            .iter()
            .map(|(region, r)| AppRegionalResources {
                region: region.clone(),
                s3_bucket: r.bucket.clone(),
                kms_key_arn: r.key_arn.clone(),
            })
            .collect())
    }

    async fn get_app_resources_by_region(
        &self,
        app: &Application,
        region: &str,
    ) -> Result<AppRegionalResources, DeployError> {
        let state = self.lock();
        let record = state
            .applications
            .get(&app.name)
            .ok_or_else(|| DeployError::StackNotFound(app.name.clone()))?;
        let regional = record
            .regional
            .get(region)
            .ok_or_else(|| DeployError::StackNotFound(format!("{}-{region}", app.name)))?;
        Ok(AppRegionalResources {
            region: region.to_string(),
            s3_bucket: regional.bucket.clone(),
            kms_key_arn: regional.key_arn.clone(),
        })
    }

    async fn pipeline_exists(&self, name: &str) -> Result<bool, DeployError> {
        let state = self.lock();
        Ok(state
            .applications
            .values()
            .any(|record| record.pipelines.contains_key(name)))
    }

    async fn create_pipeline(
        &self,
        input: &CreatePipelineInput,
        _buckets: &[ArtifactBucket],
    ) -> Result<(), DeployError> {
        self.upsert_pipeline(input)
    }

    async fn update_pipeline(
        &self,
        input: &CreatePipelineInput,
        _buckets: &[ArtifactBucket],
    ) -> Result<(), DeployError> {
        self.upsert_pipeline(input)
    }

    async fn delete_pipeline(&self, name: &str) -> Result<(), DeployError> {
        // Deleting an absent pipeline succeeds, matching stack deletion
        // semantics of real provisioners.
        self.mutate(|state| {
            for record in state.applications.values_mut() {
                record.pipelines.remove(name);
            }
            Ok(())
        })
        .map_err(DeployError::Backend)
    }

    async fn delete_app(&self, name: &str) -> Result<(), DeployError> {
        self.mutate(|state| {
            let record = state
                .applications
                .get_mut(name)
                .ok_or_else(|| format!("application {name} not found"))?;
            record.regional.clear();
            record.pipelines.clear();
            record.task_stacks.clear();
            Ok(())
        })
        .map_err(DeployError::Backend)
    }

    async fn list_task_stacks(
        &self,
        app: &str,
        env: &str,
    ) -> Result<Vec<TaskStackInfo>, DeployError> {
        let state = self.lock();
        let record = state
            .applications
            .get(app)
            .ok_or_else(|| DeployError::StackNotFound(app.to_string()))?;
        Ok(record
            .task_stacks
            .iter()
            .filter(|t| t.env == env)
            .cloned()
            .collect())
    }
}

impl LocalBackend {
    fn upsert_pipeline(&self, input: &CreatePipelineInput) -> Result<(), DeployError> {
        let crate::manifest::Provider::Github {
            repository, branch, ..
        } = &input.source;
        let record = PipelineRecord {
            repository: repository.clone(),
            branch: branch.clone(),
            stages: input
                .stages
                .iter()
                .map(|s| s.environment.name.clone())
                .collect(),
            artifact_bucket: input.artifact_bucket.clone(),
        };
        self.mutate(|state| {
            let app = state
                .applications
                .get_mut(&input.app_name)
                .ok_or_else(|| format!("application {} not found", input.app_name))?;
            app.pipelines.insert(input.name.clone(), record);
            Ok(())
        })
        .map_err(DeployError::Backend)
    }
}

#[async_trait]
impl SecretStore for LocalBackend {
    async fn delete_secret(&self, name: &str) -> Result<(), SecretError> {
        let known = self.lock().secrets.contains(name);
        if !known {
            return Err(SecretError::NotFound(name.to_string()));
        }
        self.mutate(|state| {
            state.secrets.remove(name);
            Ok(())
        })
        .map_err(SecretError::Backend)
    }
}

/// Empties buckets in one region of the backend state.
pub struct LocalBucketEmptier {
    backend: Arc<LocalBackend>,
    region: String,
}

impl LocalBucketEmptier {
    pub fn new(backend: Arc<LocalBackend>, region: impl Into<String>) -> Self {
        Self {
            backend,
            region: region.into(),
        }
    }
}

#[async_trait]
impl BucketEmptier for LocalBucketEmptier {
    async fn empty_bucket(&self, bucket: &str) -> Result<(), BucketError> {
        self.backend
            .mutate(|state| {
                for record in state.applications.values_mut() {
                    if let Some(regional) = record.regional.get_mut(&self.region)
                        && regional.bucket == bucket
                    {
                        regional.objects.clear();
                        return Ok(());
                    }
                }
                Err(format!("bucket {bucket} not found in {}", self.region))
            })
            .map_err(BucketError::Backend)
    }
}

/// Deletes one service or job from the application record.
pub struct WorkloadDeleter {
    backend: Arc<LocalBackend>,
    app: String,
    name: String,
    kind: WorkloadKind,
}

impl WorkloadDeleter {
    pub fn new(
        backend: Arc<LocalBackend>,
        app: impl Into<String>,
        name: impl Into<String>,
        kind: WorkloadKind,
    ) -> Self {
        Self {
            backend,
            app: app.into(),
            name: name.into(),
            kind,
        }
    }
}

#[async_trait]
impl Executor for WorkloadDeleter {
    async fn execute(&mut self) -> Result<(), DynError> {
        self.backend
            .mutate(|state| {
                let record = state
                    .applications
                    .get_mut(&self.app)
                    .ok_or_else(|| format!("application {} not found", self.app))?;
                let names = match self.kind {
                    WorkloadKind::Service => &mut record.services,
                    WorkloadKind::Job => &mut record.jobs,
                };
                names.retain(|n| n != &self.name);
                Ok(())
            })
            .map_err(DynError::from)
    }
}

/// Deletes one standalone task stack.
pub struct TaskDeleter {
    backend: Arc<LocalBackend>,
    app: String,
    env: String,
    task: String,
}

impl TaskDeleter {
    pub fn new(
        backend: Arc<LocalBackend>,
        app: impl Into<String>,
        env: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            app: app.into(),
            env: env.into(),
            task: task.into(),
        }
    }
}

#[async_trait]
impl Executor for TaskDeleter {
    async fn execute(&mut self) -> Result<(), DynError> {
        self.backend
            .mutate(|state| {
                let record = state
                    .applications
                    .get_mut(&self.app)
                    .ok_or_else(|| format!("application {} not found", self.app))?;
                record
                    .task_stacks
                    .retain(|t| !(t.env == self.env && t.task_name() == self.task));
                Ok(())
            })
            .map_err(DynError::from)
    }
}

/// Deletes one environment, optionally confirming first.
pub struct EnvDeleter {
    backend: Arc<LocalBackend>,
    prompt: Arc<dyn Prompter>,
    app: String,
    env: String,
    skip_confirmation: bool,
}

impl EnvDeleter {
    pub fn new(
        backend: Arc<LocalBackend>,
        prompt: Arc<dyn Prompter>,
        app: impl Into<String>,
        env: impl Into<String>,
        skip_confirmation: bool,
    ) -> Self {
        Self {
            backend,
            prompt,
            app: app.into(),
            env: env.into(),
            skip_confirmation,
        }
    }
}

#[async_trait]
impl Executor for EnvDeleter {
    async fn execute(&mut self) -> Result<(), DynError> {
        self.backend
            .mutate(|state| {
                let record = state
                    .applications
                    .get_mut(&self.app)
                    .ok_or_else(|| format!("application {} not found", self.app))?;
                record.environments.remove(&self.env);
                Ok(())
            })
            .map_err(DynError::from)
    }
}

#[async_trait]
impl AskExecutor for EnvDeleter {
    async fn ask(&mut self) -> Result<(), DynError> {
        if self.skip_confirmation {
            return Ok(());
        }
        let confirmed = self.prompt.confirm(
            &format!(
                "Are you sure you want to delete environment {} from application {}?",
                self.env, self.app
            ),
            "",
        )?;
        if !confirmed {
            return Err("environment deletion cancelled".into());
        }
        Ok(())
    }
}
