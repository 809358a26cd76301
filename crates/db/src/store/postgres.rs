use async_trait::async_trait;
use layerforge_core::error::CoreError;
use layerforge_core::progress::validate_progress;
use layerforge_core::status::AssetPackStatus;
use layerforge_core::types::DbId;
use sqlx::PgPool;

use super::{
    check_initial_job_status, check_job_write, job_not_found, pack_already_claimed,
    pack_not_found, JobWrite, PipelineStore,
};
use crate::error::StoreResult;
use crate::models::asset_layer::{AssetLayer, CreateAssetLayer};
use crate::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};
use crate::models::pipeline_job::{CreatePipelineJob, PipelineJob};
use crate::repositories::{AssetLayerRepo, AssetPackRepo, PipelineJobRepo};

/// PostgreSQL-backed [`PipelineStore`].
///
/// Guarded updates that touch no row are re-read to report either
/// `NotFound` or the precise `Conflict`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn job_rejection(&self, id: DbId, write: JobWrite) -> StoreResult<PipelineJob> {
        let job = PipelineJobRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| job_not_found(id))?;
        check_job_write(&job, write)?;
        // The guard matched nothing but the re-read allows the write: a
        // concurrent writer moved the row in between.
        Err(CoreError::Conflict(format!(
            "PipelineJob {id} changed concurrently"
        ))
        .into())
    }

    async fn pack_rejection(&self, id: DbId, next: AssetPackStatus) -> StoreResult<AssetPack> {
        let pack = AssetPackRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| pack_not_found(id))?;
        pack.status.ensure_transition(next)?;
        Err(CoreError::Conflict(format!(
            "AssetPack {id} changed concurrently"
        ))
        .into())
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_asset_pack(&self, input: &CreateAssetPack) -> StoreResult<AssetPack> {
        Ok(AssetPackRepo::create(&self.pool, input).await?)
    }

    async fn find_asset_pack(&self, id: DbId) -> StoreResult<Option<AssetPack>> {
        Ok(AssetPackRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_asset_packs(&self, limit: i64) -> StoreResult<Vec<AssetPack>> {
        Ok(AssetPackRepo::list(&self.pool, limit).await?)
    }

    async fn set_asset_pack_status(
        &self,
        id: DbId,
        status: AssetPackStatus,
    ) -> StoreResult<AssetPack> {
        match AssetPackRepo::set_status(&self.pool, id, status).await? {
            Some(pack) => Ok(pack),
            None => self.pack_rejection(id, status).await,
        }
    }

    async fn claim_asset_pack(&self, id: DbId) -> StoreResult<AssetPack> {
        if let Some(pack) = AssetPackRepo::claim(&self.pool, id).await? {
            return Ok(pack);
        }
        let pack = AssetPackRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| pack_not_found(id))?;
        Err(pack_already_claimed(&pack).into())
    }

    async fn complete_asset_pack(
        &self,
        id: DbId,
        totals: AssetPackTotals,
    ) -> StoreResult<AssetPack> {
        match AssetPackRepo::complete(&self.pool, id, totals).await? {
            Some(pack) => Ok(pack),
            None => self.pack_rejection(id, AssetPackStatus::Completed).await,
        }
    }

    async fn create_job(&self, input: &CreatePipelineJob) -> StoreResult<PipelineJob> {
        check_initial_job_status(input.status)?;
        if AssetPackRepo::find_by_id(&self.pool, input.asset_pack_id)
            .await?
            .is_none()
        {
            return Err(pack_not_found(input.asset_pack_id).into());
        }
        Ok(PipelineJobRepo::create(&self.pool, input).await?)
    }

    async fn find_job(&self, id: DbId) -> StoreResult<Option<PipelineJob>> {
        Ok(PipelineJobRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_jobs(
        &self,
        asset_pack_id: Option<DbId>,
        limit: i64,
    ) -> StoreResult<Vec<PipelineJob>> {
        Ok(PipelineJobRepo::list(&self.pool, asset_pack_id, limit).await?)
    }

    async fn start_job(&self, id: DbId) -> StoreResult<PipelineJob> {
        match PipelineJobRepo::start(&self.pool, id).await? {
            Some(job) => Ok(job),
            None => self.job_rejection(id, JobWrite::Start).await,
        }
    }

    async fn update_job_progress(
        &self,
        id: DbId,
        progress: i16,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob> {
        validate_progress(progress)?;
        match PipelineJobRepo::update_progress(&self.pool, id, progress, metadata.as_ref()).await? {
            Some(job) => Ok(job),
            None => self.job_rejection(id, JobWrite::Progress(progress)).await,
        }
    }

    async fn complete_job(
        &self,
        id: DbId,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob> {
        match PipelineJobRepo::complete(&self.pool, id, metadata.as_ref()).await? {
            Some(job) => Ok(job),
            None => self.job_rejection(id, JobWrite::Complete).await,
        }
    }

    async fn fail_job(&self, id: DbId, error: &str) -> StoreResult<PipelineJob> {
        match PipelineJobRepo::fail(&self.pool, id, error).await? {
            Some(job) => Ok(job),
            None => self.job_rejection(id, JobWrite::Fail).await,
        }
    }

    async fn insert_layer(&self, input: &CreateAssetLayer) -> StoreResult<AssetLayer> {
        Ok(AssetLayerRepo::create(&self.pool, input).await?)
    }

    async fn list_layers(&self, asset_pack_id: DbId) -> StoreResult<Vec<AssetLayer>> {
        Ok(AssetLayerRepo::list_by_pack(&self.pool, asset_pack_id).await?)
    }

    async fn count_layers(&self, asset_pack_id: DbId) -> StoreResult<AssetPackTotals> {
        Ok(AssetLayerRepo::count_by_kind(&self.pool, asset_pack_id).await?)
    }
}
