//! Pipeline job entity: one per (asset pack, stage).

use layerforge_core::stage::PipelineStage;
use layerforge_core::status::JobStatus;
use layerforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `pipeline_jobs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PipelineJob {
    pub id: DbId,
    pub asset_pack_id: DbId,
    #[sqlx(try_from = "String")]
    pub stage: PipelineStage,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub progress: i16,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a job.
///
/// Only `pending` and `processing` are accepted as initial statuses. A job
/// inserted as `processing` gets `started_at = now`.
#[derive(Debug, Clone)]
pub struct CreatePipelineJob {
    pub asset_pack_id: DbId,
    pub stage: PipelineStage,
    pub status: JobStatus,
}
