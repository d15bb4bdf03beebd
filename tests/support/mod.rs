// ABOUTME: Test support utilities.
// ABOUTME: Recording mocks for every capability seam, sharing one call log.

// Each test binary only uses some of these mocks.
#![allow(dead_code)]

use async_trait::async_trait;
use caravel::bucket::{BucketEmptier, BucketError};
use caravel::commands::{AskExecutor, Command, DynError, Executor};
use caravel::deploy::{
    AppRegionalResources, ArtifactBucket, CreatePipelineInput, DeployError, StackDeployer,
    TaskStackInfo,
};
use caravel::manifest::{PipelineManifest, Source, SourceProperties, StageConfig};
use caravel::secrets::{SecretError, SecretStore};
use caravel::store::{Application, ConfigStore, Environment, StoreError, Workload, WorkloadKind};
use caravel::term::{Progress, PromptError, Prompter};
use caravel::workspace::{
    PipelineSummary, Workspace, WorkspaceError, WorkspaceSummary,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Ordered record of every mock call, shared between all mocks of one test.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_lines(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn record(log: &CallLog, line: String) {
    log.lock().unwrap().push(line);
}

// =============================================================================
// Fixture builders
// =============================================================================

#[allow(dead_code)]
pub fn app(name: &str) -> Application {
    Application {
        name: name.to_string(),
        account_id: "1234".to_string(),
        domain: None,
    }
}

#[allow(dead_code)]
pub fn environment(name: &str, region: &str) -> Environment {
    Environment {
        name: name.to_string(),
        app: "badgoose".to_string(),
        region: region.to_string(),
        account_id: "1234".to_string(),
        prod: false,
    }
}

#[allow(dead_code)]
pub fn workload(name: &str, kind: WorkloadKind) -> Workload {
    Workload {
        name: name.to_string(),
        app: "badgoose".to_string(),
        kind,
    }
}

#[allow(dead_code)]
pub fn regional(region: &str) -> AppRegionalResources {
    AppRegionalResources {
        region: region.to_string(),
        s3_bucket: format!("badgoose-artifacts-{region}"),
        kms_key_arn: format!("key/badgoose/{region}"),
    }
}

#[allow(dead_code)]
pub fn manifest(name: &str) -> PipelineManifest {
    PipelineManifest {
        name: name.to_string(),
        version: 1,
        source: Source {
            provider: "GitHub".to_string(),
            properties: SourceProperties {
                repository: Some("badgoose/widgets".to_string()),
                branch: Some("main".to_string()),
                access_token_secret: None,
            },
        },
        build: None,
        stages: vec![StageConfig {
            name: "test".to_string(),
            requires_approval: false,
            test_commands: Vec::new(),
        }],
    }
}

// =============================================================================
// Configuration store mock
// =============================================================================

pub struct MockStore {
    log: CallLog,
    pub app: Option<Application>,
    pub envs: Vec<Environment>,
    pub services: Vec<Workload>,
    pub jobs: Vec<Workload>,
    fail: HashSet<&'static str>,
}

impl MockStore {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            app: None,
            envs: Vec::new(),
            services: Vec::new(),
            jobs: Vec::new(),
            fail: HashSet::new(),
        }
    }

    #[allow(dead_code)]
    pub fn fail_on(mut self, method: &'static str) -> Self {
        self.fail.insert(method);
        self
    }

    fn call(&self, method: &str, args: &str) -> Result<(), StoreError> {
        record(&self.log, format!("{method}:{args}"));
        if self.fail.contains(method) {
            return Err(StoreError::Backend("some error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MockStore {
    async fn list_services(&self, app: &str) -> Result<Vec<Workload>, StoreError> {
        self.call("list_services", app)?;
        Ok(self.services.clone())
    }

    async fn list_jobs(&self, app: &str) -> Result<Vec<Workload>, StoreError> {
        self.call("list_jobs", app)?;
        Ok(self.jobs.clone())
    }

    async fn list_environments(&self, app: &str) -> Result<Vec<Environment>, StoreError> {
        self.call("list_environments", app)?;
        Ok(self.envs.clone())
    }

    async fn get_application(&self, app: &str) -> Result<Application, StoreError> {
        self.call("get_application", app)?;
        self.app
            .clone()
            .ok_or_else(|| StoreError::ApplicationNotFound(app.to_string()))
    }

    async fn get_environment(&self, app: &str, env: &str) -> Result<Environment, StoreError> {
        self.call("get_environment", &format!("{app}/{env}"))?;
        self.envs
            .iter()
            .find(|e| e.name == env)
            .cloned()
            .ok_or_else(|| StoreError::EnvironmentNotFound {
                app: app.to_string(),
                env: env.to_string(),
            })
    }

    async fn delete_application(&self, app: &str) -> Result<(), StoreError> {
        self.call("delete_application", app)
    }
}

// =============================================================================
// Stack deployer mock
// =============================================================================

pub struct MockDeployer {
    log: CallLog,
    pub exists: bool,
    pub regional: Vec<AppRegionalResources>,
    pub tasks: HashMap<String, Vec<TaskStackInfo>>,
    fail: HashSet<&'static str>,
}

impl MockDeployer {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            exists: false,
            regional: Vec::new(),
            tasks: HashMap::new(),
            fail: HashSet::new(),
        }
    }

    #[allow(dead_code)]
    pub fn fail_on(mut self, method: &'static str) -> Self {
        self.fail.insert(method);
        self
    }

    fn call(&self, method: &str, args: &str) -> Result<(), DeployError> {
        record(&self.log, format!("{method}:{args}"));
        if self.fail.contains(method) {
            return Err(DeployError::Backend("some error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StackDeployer for MockDeployer {
    async fn add_pipeline_resources_to_app(
        &self,
        app: &Application,
        region: &str,
    ) -> Result<(), DeployError> {
        self.call("add_pipeline_resources", &format!("{}/{region}", app.name))
    }

    async fn get_regional_app_resources(
        &self,
        app: &Application,
    ) -> Result<Vec<AppRegionalResources>, DeployError> {
        self.call("get_regional_app_resources", &app.name)?;
        Ok(self.regional.clone())
    }

    async fn get_app_resources_by_region(
        &self,
        app: &Application,
        region: &str,
    ) -> Result<AppRegionalResources, DeployError> {
        self.call("get_app_resources_by_region", &format!("{}/{region}", app.name))?;
        self.regional
            .iter()
            .find(|r| r.region == region)
            .cloned()
            .ok_or_else(|| DeployError::StackNotFound(format!("{}-{region}", app.name)))
    }

    async fn pipeline_exists(&self, name: &str) -> Result<bool, DeployError> {
        self.call("pipeline_exists", name)?;
        Ok(self.exists)
    }

    async fn create_pipeline(
        &self,
        input: &CreatePipelineInput,
        _buckets: &[ArtifactBucket],
    ) -> Result<(), DeployError> {
        self.call("create_pipeline", &input.name)
    }

    async fn update_pipeline(
        &self,
        input: &CreatePipelineInput,
        _buckets: &[ArtifactBucket],
    ) -> Result<(), DeployError> {
        self.call("update_pipeline", &input.name)
    }

    async fn delete_pipeline(&self, name: &str) -> Result<(), DeployError> {
        self.call("delete_pipeline", name)
    }

    async fn delete_app(&self, name: &str) -> Result<(), DeployError> {
        self.call("delete_app", name)
    }

    async fn list_task_stacks(
        &self,
        app: &str,
        env: &str,
    ) -> Result<Vec<TaskStackInfo>, DeployError> {
        self.call("list_task_stacks", &format!("{app}/{env}"))?;
        Ok(self.tasks.get(env).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Workspace mock
// =============================================================================

pub struct MockWorkspace {
    log: CallLog,
    pub app: Option<String>,
    pub manifest: Option<PipelineManifest>,
    pub pipelines: Vec<PipelineSummary>,
    pub services: Vec<String>,
    pub jobs: Vec<String>,
    fail: HashSet<&'static str>,
}

impl MockWorkspace {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            app: None,
            manifest: None,
            pipelines: Vec::new(),
            services: Vec::new(),
            jobs: Vec::new(),
            fail: HashSet::new(),
        }
    }

    #[allow(dead_code)]
    pub fn fail_on(mut self, method: &'static str) -> Self {
        self.fail.insert(method);
        self
    }

    fn call(&self, method: &str) -> Result<(), WorkspaceError> {
        record(&self.log, format!("{method}:"));
        if self.fail.contains(method) {
            return Err(WorkspaceError::Io {
                path: PathBuf::from("caravel"),
                source: io::Error::other("some error"),
            });
        }
        Ok(())
    }
}

impl Workspace for MockWorkspace {
    fn summary(&self) -> Result<WorkspaceSummary, WorkspaceError> {
        self.call("summary")?;
        self.app
            .clone()
            .map(|application| WorkspaceSummary { application })
            .ok_or(WorkspaceError::NoAppAssociated)
    }

    fn pipeline_manifest_legacy_path(&self) -> Result<PathBuf, WorkspaceError> {
        self.call("legacy_path")?;
        if self.manifest.is_none() {
            return Err(WorkspaceError::NoPipelineInWorkspace);
        }
        Ok(PathBuf::from("caravel/pipeline.yml"))
    }

    fn read_pipeline_manifest(&self, path: &Path) -> Result<PipelineManifest, WorkspaceError> {
        self.call("read_manifest")?;
        self.manifest
            .clone()
            .ok_or_else(|| WorkspaceError::ManifestNotFound {
                name: path.display().to_string(),
            })
    }

    fn list_pipelines(&self) -> Result<Vec<PipelineSummary>, WorkspaceError> {
        self.call("list_pipelines")?;
        Ok(self.pipelines.clone())
    }

    fn delete_workspace_file(&self) -> Result<(), WorkspaceError> {
        self.call("delete_workspace_file")
    }

    fn list_local_services(&self) -> Result<Vec<String>, WorkspaceError> {
        self.call("list_local_services")?;
        Ok(self.services.clone())
    }

    fn list_local_jobs(&self) -> Result<Vec<String>, WorkspaceError> {
        self.call("list_local_jobs")?;
        Ok(self.jobs.clone())
    }
}

// =============================================================================
// Terminal mocks
// =============================================================================

/// Answers confirmations from a scripted queue; an exhausted queue answers no.
pub struct MockPrompter {
    log: CallLog,
    answers: Mutex<VecDeque<bool>>,
    fail: bool,
}

impl MockPrompter {
    pub fn new(log: &CallLog, answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            log: Arc::clone(log),
            answers: Mutex::new(answers.into_iter().collect()),
            fail: false,
        }
    }

    #[allow(dead_code)]
    pub fn failing(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            answers: Mutex::new(VecDeque::new()),
            fail: true,
        }
    }
}

impl Prompter for MockPrompter {
    fn confirm(&self, message: &str, _help: &str) -> Result<bool, PromptError> {
        record(&self.log, format!("confirm:{message}"));
        if self.fail {
            return Err(io::Error::other("some error").into());
        }
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}

pub struct MockProgress {
    log: CallLog,
}

impl MockProgress {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
        }
    }
}

impl Progress for MockProgress {
    fn start(&self, message: &str) {
        record(&self.log, format!("start:{message}"));
    }

    fn stop(&self, message: &str) {
        record(&self.log, format!("stop:{message}"));
    }
}

// =============================================================================
// Sub-executor mocks
// =============================================================================

pub struct MockExecutor {
    log: CallLog,
    label: String,
    fail: bool,
}

impl MockExecutor {
    pub fn new(log: &CallLog, label: impl Into<String>, fail: bool) -> Self {
        Self {
            log: Arc::clone(log),
            label: label.into(),
            fail,
        }
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn execute(&mut self) -> Result<(), DynError> {
        record(&self.log, format!("execute:{}", self.label));
        if self.fail {
            return Err("some error".into());
        }
        Ok(())
    }
}

#[async_trait]
impl AskExecutor for MockExecutor {
    async fn ask(&mut self) -> Result<(), DynError> {
        record(&self.log, format!("ask:{}", self.label));
        Ok(())
    }
}

#[allow(dead_code)]
pub struct MockCommand {
    log: CallLog,
    label: String,
    fail: bool,
}

impl MockCommand {
    #[allow(dead_code)]
    pub fn new(log: &CallLog, label: impl Into<String>, fail: bool) -> Self {
        Self {
            log: Arc::clone(log),
            label: label.into(),
            fail,
        }
    }
}

#[async_trait]
impl Executor for MockCommand {
    async fn execute(&mut self) -> Result<(), DynError> {
        record(&self.log, format!("execute:{}", self.label));
        if self.fail {
            return Err("some error".into());
        }
        Ok(())
    }
}

#[async_trait]
impl Command for MockCommand {
    async fn validate(&mut self) -> Result<(), DynError> {
        record(&self.log, format!("validate:{}", self.label));
        Ok(())
    }

    async fn ask(&mut self) -> Result<(), DynError> {
        record(&self.log, format!("ask:{}", self.label));
        Ok(())
    }
}

// =============================================================================
// Bucket and secret mocks
// =============================================================================

pub struct MockBucketEmptier {
    log: CallLog,
    region: String,
    fail: bool,
}

impl MockBucketEmptier {
    pub fn new(log: &CallLog, region: impl Into<String>, fail: bool) -> Self {
        Self {
            log: Arc::clone(log),
            region: region.into(),
            fail,
        }
    }
}

#[async_trait]
impl BucketEmptier for MockBucketEmptier {
    async fn empty_bucket(&self, bucket: &str) -> Result<(), BucketError> {
        record(&self.log, format!("empty_bucket:{}/{bucket}", self.region));
        if self.fail {
            return Err(BucketError::Backend("some error".to_string()));
        }
        Ok(())
    }
}

pub struct MockSecretStore {
    log: CallLog,
    fail: bool,
}

impl MockSecretStore {
    pub fn new(log: &CallLog, fail: bool) -> Self {
        Self {
            log: Arc::clone(log),
            fail,
        }
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn delete_secret(&self, name: &str) -> Result<(), SecretError> {
        record(&self.log, format!("delete_secret:{name}"));
        if self.fail {
            return Err(SecretError::Backend("some error".to_string()));
        }
        Ok(())
    }
}
