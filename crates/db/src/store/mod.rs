//! Storage abstraction used by the pipeline.
//!
//! [`PipelineStore`] is the single write/read boundary for asset packs,
//! pipeline jobs and asset layers. Every implementation enforces the same
//! rules:
//!
//! - status writes follow the transition table in
//!   [`layerforge_core::status`]; an illegal transition is a `Conflict`
//! - job progress only moves forward and only while the job is `processing`
//! - terminal jobs are never updated again
//!
//! [`PgStore`] persists to PostgreSQL; [`MemoryStore`] keeps rows in
//! process memory and backs the demo simulator and tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use layerforge_core::error::CoreError;
use layerforge_core::progress::validate_progress;
use layerforge_core::status::{AssetPackStatus, JobStatus};
use layerforge_core::types::DbId;

use crate::error::StoreResult;
use crate::models::asset_layer::{AssetLayer, CreateAssetLayer};
use crate::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};
use crate::models::pipeline_job::{CreatePipelineJob, PipelineJob};

#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    /// Check the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    // ---- asset packs ----

    async fn create_asset_pack(&self, input: &CreateAssetPack) -> StoreResult<AssetPack>;

    async fn find_asset_pack(&self, id: DbId) -> StoreResult<Option<AssetPack>>;

    /// Packs newest-first, at most `limit` rows.
    async fn list_asset_packs(&self, limit: i64) -> StoreResult<Vec<AssetPack>>;

    async fn set_asset_pack_status(
        &self,
        id: DbId,
        status: AssetPackStatus,
    ) -> StoreResult<AssetPack>;

    /// `pending -> processing`, and nothing else. A pack another run
    /// already holds is a `Conflict`, so at most one run owns a pack.
    async fn claim_asset_pack(&self, id: DbId) -> StoreResult<AssetPack>;

    /// Mark a `processing` pack `completed` with its totals.
    async fn complete_asset_pack(&self, id: DbId, totals: AssetPackTotals)
        -> StoreResult<AssetPack>;

    // ---- pipeline jobs ----

    async fn create_job(&self, input: &CreatePipelineJob) -> StoreResult<PipelineJob>;

    async fn find_job(&self, id: DbId) -> StoreResult<Option<PipelineJob>>;

    /// Jobs newest-first, optionally for one pack, at most `limit` rows.
    async fn list_jobs(&self, asset_pack_id: Option<DbId>, limit: i64)
        -> StoreResult<Vec<PipelineJob>>;

    /// `pending -> processing`.
    async fn start_job(&self, id: DbId) -> StoreResult<PipelineJob>;

    /// Write a non-decreasing progress value, merging `metadata` keys into
    /// the stored metadata object.
    async fn update_job_progress(
        &self,
        id: DbId,
        progress: i16,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob>;

    /// `processing -> completed` at progress 100.
    async fn complete_job(
        &self,
        id: DbId,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob>;

    /// `{pending, processing} -> failed` with an error message.
    async fn fail_job(&self, id: DbId, error: &str) -> StoreResult<PipelineJob>;

    // ---- asset layers ----

    async fn insert_layer(&self, input: &CreateAssetLayer) -> StoreResult<AssetLayer>;

    async fn list_layers(&self, asset_pack_id: DbId) -> StoreResult<Vec<AssetLayer>>;

    /// Decomposition layers and expression layers of a pack.
    async fn count_layers(&self, asset_pack_id: DbId) -> StoreResult<AssetPackTotals>;
}

// ---------------------------------------------------------------------------
// Shared write rules
// ---------------------------------------------------------------------------

/// A mutation requested against an existing job.
#[derive(Debug, Clone, Copy)]
pub(crate) enum JobWrite {
    Start,
    Progress(i16),
    Complete,
    Fail,
}

/// Check whether `write` may be applied to `job` in its current state.
pub(crate) fn check_job_write(job: &PipelineJob, write: JobWrite) -> Result<(), CoreError> {
    match write {
        JobWrite::Start => job.status.ensure_transition(JobStatus::Processing),
        JobWrite::Complete => job.status.ensure_transition(JobStatus::Completed),
        JobWrite::Fail => job.status.ensure_transition(JobStatus::Failed),
        JobWrite::Progress(progress) => {
            validate_progress(progress)?;
            if job.status != JobStatus::Processing {
                return Err(CoreError::Conflict(format!(
                    "Cannot update progress of a {} job",
                    job.status
                )));
            }
            if progress < job.progress {
                return Err(CoreError::Conflict(format!(
                    "Progress cannot decrease from {} to {progress}",
                    job.progress
                )));
            }
            Ok(())
        }
    }
}

/// Only `pending` and `processing` are valid initial job statuses.
pub(crate) fn check_initial_job_status(status: JobStatus) -> Result<(), CoreError> {
    if status.is_terminal() {
        return Err(CoreError::Validation(format!(
            "A job cannot be created in terminal status '{status}'"
        )));
    }
    Ok(())
}

/// Rejection for a claim on a pack that is no longer `pending`.
pub(crate) fn pack_already_claimed(pack: &AssetPack) -> CoreError {
    CoreError::Conflict(format!(
        "AssetPack {} is already {}",
        pack.id, pack.status
    ))
}

pub(crate) fn job_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "PipelineJob",
        id,
    }
}

pub(crate) fn pack_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "AssetPack",
        id,
    }
}

/// Shallow-merge the keys of `patch` into `target`. Non-object values
/// replace `target` wholesale.
pub(crate) fn merge_metadata(target: &mut serde_json::Value, patch: serde_json::Value) {
    match patch {
        serde_json::Value::Object(incoming) if target.is_object() => {
            if let Some(existing) = target.as_object_mut() {
                existing.extend(incoming);
            }
        }
        other => *target = other,
    }
}
