//! Repository for the `pipeline_jobs` table.
//!
//! Uses [`JobStatus`] for every status literal. Each mutating query carries
//! a `WHERE` guard so an illegal transition or a progress regression
//! touches no row and returns `None`.

use layerforge_core::status::JobStatus;
use layerforge_core::types::{new_id, DbId};
use sqlx::PgPool;

use crate::models::pipeline_job::{CreatePipelineJob, PipelineJob};

/// Column list for `pipeline_jobs` queries.
const COLUMNS: &str = "\
    id, asset_pack_id, stage, status, progress, error_message, metadata, \
    started_at, completed_at, created_at, updated_at";

fn source_statuses(next: JobStatus) -> Vec<String> {
    JobStatus::sources_of(next)
        .into_iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

/// Provides CRUD operations for pipeline jobs.
pub struct PipelineJobRepo;

impl PipelineJobRepo {
    /// Insert a job. `started_at` is set when the job is inserted as
    /// `processing`.
    pub async fn create(pool: &PgPool, input: &CreatePipelineJob) -> Result<PipelineJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO pipeline_jobs (id, asset_pack_id, stage, status, progress, started_at) \
             VALUES ($1, $2, $3, $4, 0, CASE WHEN $5 THEN NOW() ELSE NULL END) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PipelineJob>(&query)
            .bind(new_id())
            .bind(input.asset_pack_id)
            .bind(input.stage.as_str())
            .bind(input.status.as_str())
            .bind(input.status == JobStatus::Processing)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PipelineJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pipeline_jobs WHERE id = $1");
        sqlx::query_as::<_, PipelineJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs newest-first, optionally for a single asset pack.
    pub async fn list(
        pool: &PgPool,
        asset_pack_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<PipelineJob>, sqlx::Error> {
        let where_clause = if asset_pack_id.is_some() {
            "WHERE asset_pack_id = $2"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM pipeline_jobs \
             {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1"
        );

        let mut q = sqlx::query_as::<_, PipelineJob>(&query).bind(limit);
        if let Some(pack_id) = asset_pack_id {
            q = q.bind(pack_id);
        }
        q.fetch_all(pool).await
    }

    /// Move a job to `processing`, stamping `started_at` on first start.
    pub async fn start(pool: &PgPool, id: DbId) -> Result<Option<PipelineJob>, sqlx::Error> {
        let query = format!(
            "UPDATE pipeline_jobs \
             SET status = $2, started_at = COALESCE(started_at, NOW()), updated_at = NOW() \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PipelineJob>(&query)
            .bind(id)
            .bind(JobStatus::Processing.as_str())
            .bind(source_statuses(JobStatus::Processing))
            .fetch_optional(pool)
            .await
    }

    /// Write a progress value and merge `metadata` into the stored object.
    ///
    /// Only `processing` jobs whose stored progress is not above `percent`
    /// are updated.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        percent: i16,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Option<PipelineJob>, sqlx::Error> {
        let query = format!(
            "UPDATE pipeline_jobs \
             SET progress = $2, \
                 metadata = metadata || COALESCE($3, '{{}}'::jsonb), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $4 AND progress <= $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PipelineJob>(&query)
            .bind(id)
            .bind(percent)
            .bind(metadata)
            .bind(JobStatus::Processing.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Mark a job completed at progress 100, merging final metadata.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Option<PipelineJob>, sqlx::Error> {
        let query = format!(
            "UPDATE pipeline_jobs \
             SET status = $2, progress = 100, completed_at = NOW(), \
                 metadata = metadata || COALESCE($3, '{{}}'::jsonb), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = ANY($4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PipelineJob>(&query)
            .bind(id)
            .bind(JobStatus::Completed.as_str())
            .bind(metadata)
            .bind(source_statuses(JobStatus::Completed))
            .fetch_optional(pool)
            .await
    }

    /// Mark a job failed with an error message. Progress is left as-is.
    pub async fn fail(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<Option<PipelineJob>, sqlx::Error> {
        let query = format!(
            "UPDATE pipeline_jobs \
             SET status = $2, error_message = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = ANY($4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PipelineJob>(&query)
            .bind(id)
            .bind(JobStatus::Failed.as_str())
            .bind(error)
            .bind(source_statuses(JobStatus::Failed))
            .fetch_optional(pool)
            .await
    }
}
