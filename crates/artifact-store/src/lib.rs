//! Versioned artifact storage consumed by the cleaning job: resolve a reference to a local
//! file, publish a file as a new version, and keep run lineage records.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

pub mod errors;
pub mod local;
pub mod model;
pub mod reference;

pub use errors::StoreError;
pub use local::LocalArtifactStore;
pub use model::{
    ArtifactManifest, ArtifactMetadata, ArtifactVersion, ResolvedArtifact, RunRecord, RunStatus,
};
pub use reference::{validate_alias, validate_name, ArtifactRef, VersionSelector};

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Locate a version and hand back a local path to its file. The file must be treated as read-only.
    async fn resolve(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact, StoreError>;

    /// Register `file` as the next version of `metadata.name`. Never overwrites an existing version.
    async fn publish(
        &self,
        metadata: &ArtifactMetadata,
        file: &Path,
        run_id: Option<Uuid>,
    ) -> Result<ArtifactVersion, StoreError>;

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError>;
}
