// ABOUTME: Workspace seam: summary file, pipeline manifests, and local workload listing.
// ABOUTME: FsWorkspace discovers the caravel/ directory upward from the working directory.

use crate::manifest::PipelineManifest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory that marks a workspace root.
pub const WORKSPACE_DIR: &str = "caravel";

/// File associating the workspace with an application.
pub const SUMMARY_FILE_NAME: &str = ".workspace";

/// Pipeline manifest location for workspaces created before named pipelines.
pub const LEGACY_PIPELINE_FILE: &str = "pipeline.yml";

const PIPELINES_DIR: &str = "pipelines";
const WORKLOAD_MANIFEST_FILE: &str = "manifest.yml";
const MAX_PARENT_DIRS: usize = 5;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("couldn't find a directory called {WORKSPACE_DIR} up to {levels} levels up from {}", .start.display())]
    NotFound { start: PathBuf, levels: usize },

    #[error("couldn't find an application associated with this workspace")]
    NoAppAssociated,

    #[error("couldn't find a pipeline manifest in the workspace")]
    NoPipelineInWorkspace,

    #[error("manifest file {name} does not exist")]
    ManifestNotFound { name: String },

    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Contents of the workspace summary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub application: String,
}

/// Name and location of a pipeline manifest found in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub name: String,
    pub path: PathBuf,
}

/// Workspace operations the orchestrators depend on. File formats are owned
/// by the implementation, not by the callers.
pub trait Workspace: Send + Sync {
    /// The application this workspace is registered with.
    fn summary(&self) -> Result<WorkspaceSummary, WorkspaceError>;

    /// Path of the legacy pipeline manifest, or
    /// [`WorkspaceError::NoPipelineInWorkspace`] when the workspace has none.
    fn pipeline_manifest_legacy_path(&self) -> Result<PathBuf, WorkspaceError>;

    fn read_pipeline_manifest(&self, path: &Path) -> Result<PipelineManifest, WorkspaceError>;

    /// All pipeline manifests in the workspace, legacy one included.
    fn list_pipelines(&self) -> Result<Vec<PipelineSummary>, WorkspaceError>;

    /// Remove the summary file, detaching the workspace from its application.
    fn delete_workspace_file(&self) -> Result<(), WorkspaceError>;

    /// Names of services defined locally in the workspace.
    fn list_local_services(&self) -> Result<Vec<String>, WorkspaceError>;

    /// Names of jobs defined locally in the workspace.
    fn list_local_jobs(&self) -> Result<Vec<String>, WorkspaceError>;
}

/// Minimal slice of a workload manifest, enough to classify it.
#[derive(Debug, Deserialize)]
struct WorkloadManifest {
    name: String,

    #[serde(rename = "type")]
    kind: String,
}

/// Filesystem-backed workspace rooted at a `caravel/` directory.
#[derive(Debug)]
pub struct FsWorkspace {
    dir: PathBuf,
}

impl FsWorkspace {
    /// Walk upward from `start` looking for the workspace directory.
    pub fn discover(start: &Path) -> Result<Self, WorkspaceError> {
        let mut dir = start.to_path_buf();
        for _ in 0..=MAX_PARENT_DIRS {
            let candidate = dir.join(WORKSPACE_DIR);
            if candidate.is_dir() {
                return Ok(Self { dir: candidate });
            }
            if !dir.pop() {
                break;
            }
        }
        Err(WorkspaceError::NotFound {
            start: start.to_path_buf(),
            levels: MAX_PARENT_DIRS,
        })
    }

    /// Open a workspace at a known `caravel/` directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The workspace directory itself.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, WorkspaceError> {
        let raw = fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| WorkspaceError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn workload_manifests(&self) -> Result<Vec<WorkloadManifest>, WorkspaceError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| WorkspaceError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut manifests: Vec<WorkloadManifest> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| WorkspaceError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_dir() || entry.file_name() == PIPELINES_DIR {
                continue;
            }
            let manifest_path = path.join(WORKLOAD_MANIFEST_FILE);
            if manifest_path.is_file() {
                manifests.push(Self::read_yaml(&manifest_path)?);
            }
        }
        manifests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(manifests)
    }

    fn list_workloads(&self, jobs: bool) -> Result<Vec<String>, WorkspaceError> {
        Ok(self
            .workload_manifests()?
            .into_iter()
            .filter(|m| m.kind.contains("Job") == jobs)
            .map(|m| m.name)
            .collect())
    }
}

impl Workspace for FsWorkspace {
    fn summary(&self) -> Result<WorkspaceSummary, WorkspaceError> {
        let path = self.dir.join(SUMMARY_FILE_NAME);
        if !path.is_file() {
            return Err(WorkspaceError::NoAppAssociated);
        }
        Self::read_yaml(&path)
    }

    fn pipeline_manifest_legacy_path(&self) -> Result<PathBuf, WorkspaceError> {
        let path = self.dir.join(LEGACY_PIPELINE_FILE);
        if !path.is_file() {
            return Err(WorkspaceError::NoPipelineInWorkspace);
        }
        Ok(path)
    }

    fn read_pipeline_manifest(&self, path: &Path) -> Result<PipelineManifest, WorkspaceError> {
        if !path.is_file() {
            return Err(WorkspaceError::ManifestNotFound {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            });
        }
        Self::read_yaml(path)
    }

    fn list_pipelines(&self) -> Result<Vec<PipelineSummary>, WorkspaceError> {
        let mut pipelines = Vec::new();
        if let Ok(path) = self.pipeline_manifest_legacy_path() {
            let manifest = self.read_pipeline_manifest(&path)?;
            pipelines.push(PipelineSummary {
                name: manifest.name,
                path,
            });
        }
        let dir = self.dir.join(PIPELINES_DIR);
        if dir.is_dir() {
            let entries = fs::read_dir(&dir).map_err(|source| WorkspaceError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| WorkspaceError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let manifest_path = entry.path().join(WORKLOAD_MANIFEST_FILE);
                if manifest_path.is_file() {
                    let manifest: PipelineManifest = Self::read_yaml(&manifest_path)?;
                    pipelines.push(PipelineSummary {
                        name: manifest.name,
                        path: manifest_path,
                    });
                }
            }
        }
        pipelines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pipelines)
    }

    fn delete_workspace_file(&self) -> Result<(), WorkspaceError> {
        let path = self.dir.join(SUMMARY_FILE_NAME);
        fs::remove_file(&path).map_err(|source| WorkspaceError::Io { path, source })
    }

    fn list_local_services(&self) -> Result<Vec<String>, WorkspaceError> {
        self.list_workloads(false)
    }

    fn list_local_jobs(&self) -> Result<Vec<String>, WorkspaceError> {
        self.list_workloads(true)
    }
}
