//! Store writes paired with change notifications.
//!
//! Each method performs exactly one [`PipelineStore`] write and, once it
//! succeeds, publishes a [`PipelineEvent`] describing the new row state.
//! Rejected writes publish nothing.

use std::sync::Arc;

use layerforge_core::job_events::{
    EVENT_JOB_COMPLETED, EVENT_JOB_CREATED, EVENT_JOB_FAILED, EVENT_JOB_PROGRESS,
    EVENT_JOB_STARTED, EVENT_PACK_CREATED, EVENT_PACK_UPDATED,
};
use layerforge_core::stage::PipelineStage;
use layerforge_core::status::{AssetPackStatus, JobStatus};
use layerforge_core::types::DbId;
use layerforge_db::models::asset_layer::{AssetLayer, CreateAssetLayer};
use layerforge_db::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};
use layerforge_db::models::pipeline_job::{CreatePipelineJob, PipelineJob};
use layerforge_db::{PipelineStore, StoreResult};
use layerforge_events::{EventBus, PipelineEvent};

#[derive(Clone)]
pub struct JobTracker {
    store: Arc<dyn PipelineStore>,
    events: Arc<EventBus>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn PipelineStore>, events: Arc<EventBus>) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &Arc<dyn PipelineStore> {
        &self.store
    }

    // ---- asset packs ----

    pub async fn create_pack(&self, input: &CreateAssetPack) -> StoreResult<AssetPack> {
        let pack = self.store.create_asset_pack(input).await?;
        self.publish_pack(EVENT_PACK_CREATED, &pack);
        Ok(pack)
    }

    pub async fn set_pack_status(
        &self,
        id: DbId,
        status: AssetPackStatus,
    ) -> StoreResult<AssetPack> {
        let pack = self.store.set_asset_pack_status(id, status).await?;
        self.publish_pack(EVENT_PACK_UPDATED, &pack);
        Ok(pack)
    }

    /// Take a `pending` pack for one run.
    pub async fn claim_pack(&self, id: DbId) -> StoreResult<AssetPack> {
        let pack = self.store.claim_asset_pack(id).await?;
        self.publish_pack(EVENT_PACK_UPDATED, &pack);
        Ok(pack)
    }

    pub async fn complete_pack(&self, id: DbId, totals: AssetPackTotals) -> StoreResult<AssetPack> {
        let pack = self.store.complete_asset_pack(id, totals).await?;
        self.publish_pack(EVENT_PACK_UPDATED, &pack);
        Ok(pack)
    }

    // ---- pipeline jobs ----

    pub async fn create_job(
        &self,
        asset_pack_id: DbId,
        stage: PipelineStage,
        status: JobStatus,
    ) -> StoreResult<PipelineJob> {
        let job = self
            .store
            .create_job(&CreatePipelineJob {
                asset_pack_id,
                stage,
                status,
            })
            .await?;
        tracing::debug!(
            asset_pack_id = %asset_pack_id,
            job_id = %job.id,
            stage = %stage,
            "Pipeline job created",
        );
        self.publish_job(EVENT_JOB_CREATED, &job);
        Ok(job)
    }

    pub async fn start_job(&self, id: DbId) -> StoreResult<PipelineJob> {
        let job = self.store.start_job(id).await?;
        self.publish_job(EVENT_JOB_STARTED, &job);
        Ok(job)
    }

    pub async fn progress(
        &self,
        id: DbId,
        progress: i16,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob> {
        let job = self.store.update_job_progress(id, progress, metadata).await?;
        tracing::debug!(job_id = %id, progress, "Job progress");
        self.publish_job(EVENT_JOB_PROGRESS, &job);
        Ok(job)
    }

    pub async fn complete_job(
        &self,
        id: DbId,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob> {
        let job = self.store.complete_job(id, metadata).await?;
        self.publish_job(EVENT_JOB_COMPLETED, &job);
        Ok(job)
    }

    pub async fn fail_job(&self, id: DbId, error: &str) -> StoreResult<PipelineJob> {
        let job = self.store.fail_job(id, error).await?;
        self.publish_job(EVENT_JOB_FAILED, &job);
        Ok(job)
    }

    // ---- asset layers ----

    /// Layers are additive and not announced individually; the owning
    /// job's progress events cover them.
    pub async fn insert_layer(&self, input: &CreateAssetLayer) -> StoreResult<AssetLayer> {
        self.store.insert_layer(input).await
    }

    pub async fn count_layers(&self, asset_pack_id: DbId) -> StoreResult<AssetPackTotals> {
        self.store.count_layers(asset_pack_id).await
    }

    // ---- private helpers ----

    fn publish_pack(&self, event_type: &str, pack: &AssetPack) {
        self.events.publish(
            PipelineEvent::new(event_type, pack.id).with_payload(serde_json::json!({
                "name": pack.name,
                "status": pack.status,
                "total_layers": pack.total_layers,
                "total_expressions": pack.total_expressions,
            })),
        );
    }

    fn publish_job(&self, event_type: &str, job: &PipelineJob) {
        self.events.publish(
            PipelineEvent::new(event_type, job.asset_pack_id)
                .with_job(job.id)
                .with_payload(serde_json::json!({
                    "stage": job.stage,
                    "status": job.status,
                    "progress": job.progress,
                    "error_message": job.error_message,
                })),
        );
    }
}
