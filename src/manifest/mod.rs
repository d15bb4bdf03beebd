// ABOUTME: Pipeline manifest types, validation, and source provider resolution.
// ABOUTME: The manifest is the declarative description of a deployment pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline names become stack names, which have a hard length limit downstream.
pub const MAX_PIPELINE_NAME_LEN: usize = 100;

/// Declarative pipeline description read from the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineManifest {
    pub name: String,

    #[serde(default)]
    pub version: u32,

    pub source: Source,

    #[serde(default)]
    pub build: Option<Build>,

    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// Where the pipeline pulls source changes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub provider: String,

    #[serde(default)]
    pub properties: SourceProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceProperties {
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub branch: Option<String>,

    /// Legacy personal access token secret. Only pipelines created against
    /// the first-generation source integration carry one.
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

/// Build image override for the pipeline's build stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub image: String,
}

/// A single stage descriptor as written in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Must match the name of an environment in the application.
    pub name: String,

    #[serde(default)]
    pub requires_approval: bool,

    #[serde(default)]
    pub test_commands: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("pipeline name '{0}' must be shorter than {MAX_PIPELINE_NAME_LEN} characters")]
    NameTooLong(String),

    #[error("invalid repo source provider: {0}")]
    UnsupportedProvider(String),

    #[error("source provider {provider} requires the {property} property")]
    MissingProperty {
        provider: &'static str,
        property: &'static str,
    },
}

/// A resolved source provider. The provider string in the manifest selects a
/// member of this closed set; anything else is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Github {
        repository: String,
        branch: String,
        access_token_secret: Option<String>,
    },
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Github { .. } => "GitHub",
        }
    }
}

impl PipelineManifest {
    /// Check manifest shape before any external call is made.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.chars().count() >= MAX_PIPELINE_NAME_LEN {
            return Err(ManifestError::NameTooLong(self.name.clone()));
        }
        Ok(())
    }

    /// Resolve the source provider string into a typed provider.
    pub fn source_provider(&self) -> Result<Provider, ManifestError> {
        match self.source.provider.to_ascii_lowercase().as_str() {
            "github" => {
                let repository = self.source.properties.repository.clone().ok_or(
                    ManifestError::MissingProperty {
                        provider: "GitHub",
                        property: "repository",
                    },
                )?;
                Ok(Provider::Github {
                    repository,
                    branch: self
                        .source
                        .properties
                        .branch
                        .clone()
                        .unwrap_or_else(|| "main".to_string()),
                    access_token_secret: self.source.properties.access_token_secret.clone(),
                })
            }
            _ => Err(ManifestError::UnsupportedProvider(
                self.source.provider.clone(),
            )),
        }
    }

    /// Name of the legacy access token secret, if the manifest records one.
    pub fn access_token_secret(&self) -> Option<&str> {
        self.source.properties.access_token_secret.as_deref()
    }
}
