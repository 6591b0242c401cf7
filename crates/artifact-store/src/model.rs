use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied description of an artifact about to be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    /// Custom aliases attached at publish time. `latest` is implicit and never stored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ArtifactMetadata {
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact_type: artifact_type.into(),
            description: description.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, A>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|candidate| candidate == alias)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub name: String,
    pub version: u32,
    pub digest: String,
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:v{}", self.name, self.version)
    }
}

/// Stored next to every published version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
    pub version: u32,
    pub file_name: String,
    pub digest: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

impl ArtifactManifest {
    pub fn artifact_version(&self) -> ArtifactVersion {
        ArtifactVersion {
            name: self.metadata.name.clone(),
            version: self.version,
            digest: self.digest.clone(),
        }
    }
}

/// A version located in the store along with the local path of its file.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub version: ArtifactVersion,
    pub path: PathBuf,
    pub manifest: ArtifactManifest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

/// Bookkeeping for one job execution: its configuration and the artifacts it used and produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub job_type: String,
    pub config: serde_json::Value,
    pub inputs: Vec<ArtifactVersion>,
    pub outputs: Vec<ArtifactVersion>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn start(job_type: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            job_type: job_type.into(),
            config,
            inputs: Vec::new(),
            outputs: Vec::new(),
            status: RunStatus::Running,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn use_artifact(&mut self, version: &ArtifactVersion) {
        self.inputs.push(version.clone());
    }

    pub fn log_artifact(&mut self, version: &ArtifactVersion) {
        self.outputs.push(version.clone());
    }

    pub fn succeed(&mut self) {
        self.status = RunStatus::Success;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
    }
}
