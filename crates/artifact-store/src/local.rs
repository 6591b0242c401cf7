use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{ArtifactManifest, ArtifactMetadata, ArtifactVersion, ResolvedArtifact, RunRecord};
use crate::reference::{validate_alias, validate_name, ArtifactRef, VersionSelector};
use crate::ArtifactStore;

pub const MANIFEST_FILE: &str = "manifest.json";
const ARTIFACTS_DIR: &str = "artifacts";
const RUNS_DIR: &str = "runs";

/// Filesystem-backed store.
///
/// Layout:
/// ```text
/// <root>/artifacts/<name>/v<N>/<file>
/// <root>/artifacts/<name>/v<N>/manifest.json
/// <root>/runs/<run_id>.json
/// ```
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join(ARTIFACTS_DIR).join(name)
    }

    pub fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{version}"))
    }

    pub fn run_path(&self, run_id: Uuid) -> PathBuf {
        self.root.join(RUNS_DIR).join(format!("{run_id}.json"))
    }

    /// Published versions of `name` in ascending order. Unknown names yield an empty list.
    pub async fn list_versions(&self, name: &str) -> Result<Vec<u32>, StoreError> {
        validate_name(name)?;
        let dir = self.artifact_dir(name);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&dir)(err)),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StoreError::io(&dir))? {
            let file_type = entry.file_type().await.map_err(StoreError::io(&dir))?;
            if !file_type.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(version) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix('v'))
                .and_then(|digits| digits.parse::<u32>().ok())
            else {
                continue;
            };
            versions.push(version);
        }
        versions.sort_unstable();
        Ok(versions)
    }

    pub async fn read_manifest(
        &self,
        name: &str,
        version: u32,
    ) -> Result<ArtifactManifest, StoreError> {
        let path = self.version_dir(name, version).join(MANIFEST_FILE);
        let bytes = tokio::fs::read(&path).await.map_err(StoreError::io(&path))?;
        serde_json::from_slice(&bytes).map_err(StoreError::document(&path))
    }

    pub async fn read_run(&self, run_id: Uuid) -> Result<RunRecord, StoreError> {
        let path = self.run_path(run_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("run {run_id}")))
            }
            Err(err) => return Err(StoreError::io(&path)(err)),
        };
        serde_json::from_slice(&bytes).map_err(StoreError::document(&path))
    }

    /// Newest version carrying `alias`, so re-publishing with an alias moves it forward.
    async fn find_alias(
        &self,
        name: &str,
        versions: &[u32],
        alias: &str,
    ) -> Result<Option<ArtifactManifest>, StoreError> {
        for &version in versions.iter().rev() {
            let manifest = self.read_manifest(name, version).await?;
            if manifest.metadata.has_alias(alias) {
                return Ok(Some(manifest));
            }
        }
        Ok(None)
    }

    async fn stage_version(
        &self,
        staging: &Path,
        file_name: &str,
        contents: &[u8],
        manifest: &ArtifactManifest,
    ) -> Result<(), StoreError> {
        tokio::fs::create_dir(staging)
            .await
            .map_err(StoreError::io(staging))?;

        let file_path = staging.join(file_name);
        tokio::fs::write(&file_path, contents)
            .await
            .map_err(StoreError::io(&file_path))?;

        let manifest_path = staging.join(MANIFEST_FILE);
        let manifest_bytes =
            serde_json::to_vec_pretty(manifest).map_err(StoreError::document(&manifest_path))?;
        tokio::fs::write(&manifest_path, manifest_bytes)
            .await
            .map_err(StoreError::io(&manifest_path))?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn resolve(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact, StoreError> {
        let versions = self.list_versions(&reference.name).await?;
        let not_found = || StoreError::NotFound(reference.to_string());
        let manifest = match &reference.selector {
            VersionSelector::Latest => {
                let version = versions.last().copied().ok_or_else(not_found)?;
                self.read_manifest(&reference.name, version).await?
            }
            VersionSelector::Version(wanted) => {
                if !versions.contains(wanted) {
                    return Err(not_found());
                }
                self.read_manifest(&reference.name, *wanted).await?
            }
            VersionSelector::Alias(alias) => self
                .find_alias(&reference.name, &versions, alias)
                .await?
                .ok_or_else(not_found)?,
        };
        let version = manifest.version;

        let path = self
            .version_dir(&reference.name, version)
            .join(&manifest.file_name);

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!(
                    "{reference} (file {} missing)",
                    path.display()
                )))
            }
            Err(err) => return Err(StoreError::io(&path)(err)),
        };
        let actual = compute_digest(&contents);
        if actual != manifest.digest {
            return Err(StoreError::DigestMismatch {
                path,
                expected: manifest.digest.clone(),
                actual,
            });
        }

        debug!(reference = %reference, path = %path.display(), "resolved artifact");
        Ok(ResolvedArtifact {
            version: manifest.artifact_version(),
            path,
            manifest,
        })
    }

    async fn publish(
        &self,
        metadata: &ArtifactMetadata,
        file: &Path,
        run_id: Option<Uuid>,
    ) -> Result<ArtifactVersion, StoreError> {
        validate_name(&metadata.name)?;
        for alias in &metadata.aliases {
            validate_alias(alias)?;
        }
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::InvalidName {
                name: file.display().to_string(),
                reason: "published file needs a UTF-8 file name".to_string(),
            })?
            .to_string();
        if file_name == MANIFEST_FILE {
            return Err(StoreError::InvalidName {
                name: file_name,
                reason: format!("'{MANIFEST_FILE}' is reserved"),
            });
        }

        let contents = tokio::fs::read(file).await.map_err(StoreError::io(file))?;
        let digest = compute_digest(&contents);

        let artifact_dir = self.artifact_dir(&metadata.name);
        tokio::fs::create_dir_all(&artifact_dir)
            .await
            .map_err(StoreError::io(&artifact_dir))?;

        let version = self
            .list_versions(&metadata.name)
            .await?
            .last()
            .map_or(0, |latest| latest + 1);

        let manifest = ArtifactManifest {
            metadata: metadata.clone(),
            version,
            file_name: file_name.clone(),
            digest,
            size_bytes: contents.len() as u64,
            created_at: Utc::now(),
            run_id,
        };

        let staging = artifact_dir.join(format!(".staging-{}", Uuid::new_v4()));
        let final_dir = self.version_dir(&metadata.name, version);

        let staged = self
            .stage_version(&staging, &file_name, &contents, &manifest)
            .await;
        let committed = match staged {
            Ok(()) => match tokio::fs::try_exists(&final_dir).await {
                Ok(true) => Err(StoreError::io(&final_dir)(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "version directory already exists",
                ))),
                Ok(false) => tokio::fs::rename(&staging, &final_dir)
                    .await
                    .map_err(StoreError::io(&final_dir)),
                Err(err) => Err(StoreError::io(&final_dir)(err)),
            },
            Err(err) => Err(err),
        };

        if let Err(err) = committed {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&staging).await {
                warn!(path = %staging.display(), error = %cleanup, "failed to remove staging directory");
            }
            return Err(err);
        }

        let published = manifest.artifact_version();
        info!(artifact = %published, artifact_type = %metadata.artifact_type, "published artifact");
        Ok(published)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        let dir = self.root.join(RUNS_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(StoreError::io(&dir))?;
        let path = self.run_path(run.run_id);
        let bytes = serde_json::to_vec_pretty(run).map_err(StoreError::document(&path))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(StoreError::io(&path))?;
        debug!(run_id = %run.run_id, status = ?run.status, "recorded run");
        Ok(())
    }
}

pub fn compute_digest(contents: &[u8]) -> String {
    blake3::hash(contents).to_hex().to_string()
}
