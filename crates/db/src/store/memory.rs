use async_trait::async_trait;
use chrono::Utc;
use layerforge_core::layers::EXPRESSION_LAYER_TYPE;
use layerforge_core::status::{AssetPackStatus, JobStatus};
use layerforge_core::types::{new_id, DbId};
use tokio::sync::RwLock;

use super::{
    check_initial_job_status, check_job_write, job_not_found, merge_metadata,
    pack_already_claimed, pack_not_found, JobWrite, PipelineStore,
};
use crate::error::StoreResult;
use crate::models::asset_layer::{AssetLayer, CreateAssetLayer};
use crate::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};
use crate::models::pipeline_job::{CreatePipelineJob, PipelineJob};

#[derive(Default)]
struct MemoryState {
    packs: Vec<AssetPack>,
    jobs: Vec<PipelineJob>,
    layers: Vec<AssetLayer>,
}

impl MemoryState {
    fn pack_mut(&mut self, id: DbId) -> StoreResult<&mut AssetPack> {
        self.packs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| pack_not_found(id).into())
    }

    fn job_mut(&mut self, id: DbId) -> StoreResult<&mut PipelineJob> {
        self.jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| job_not_found(id).into())
    }
}

/// Sort newest-first. Rows created in the same instant keep
/// most-recently-inserted first.
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

fn take_limit<T>(rows: Vec<T>, limit: i64) -> Vec<T> {
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    rows.into_iter().take(limit).collect()
}

/// Process-lifetime [`PipelineStore`].
///
/// Starts empty and is discarded with its owner. Used by the demo
/// simulator, by tests, and as the primary store when no database is
/// configured.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn apply_job_write(
        &self,
        id: DbId,
        write: JobWrite,
        apply: impl FnOnce(&mut PipelineJob),
    ) -> StoreResult<PipelineJob> {
        let mut state = self.state.write().await;
        let job = state.job_mut(id)?;
        check_job_write(job, write)?;
        apply(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_asset_pack(&self, input: &CreateAssetPack) -> StoreResult<AssetPack> {
        let now = Utc::now();
        let pack = AssetPack {
            id: new_id(),
            user_id: input.user_id,
            name: input.name.clone(),
            description: input.description.clone(),
            thumbnail_url: input.thumbnail_url.clone(),
            original_image_url: input.original_image_url.clone(),
            status: AssetPackStatus::Pending,
            total_layers: 0,
            total_expressions: 0,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.packs.push(pack.clone());
        Ok(pack)
    }

    async fn find_asset_pack(&self, id: DbId) -> StoreResult<Option<AssetPack>> {
        let state = self.state.read().await;
        Ok(state.packs.iter().find(|p| p.id == id).cloned())
    }

    async fn list_asset_packs(&self, limit: i64) -> StoreResult<Vec<AssetPack>> {
        let state = self.state.read().await;
        Ok(take_limit(newest_first(&state.packs, |p| p.created_at), limit))
    }

    async fn set_asset_pack_status(
        &self,
        id: DbId,
        status: AssetPackStatus,
    ) -> StoreResult<AssetPack> {
        let mut state = self.state.write().await;
        let pack = state.pack_mut(id)?;
        pack.status.ensure_transition(status)?;
        pack.status = status;
        pack.updated_at = Utc::now();
        Ok(pack.clone())
    }

    async fn claim_asset_pack(&self, id: DbId) -> StoreResult<AssetPack> {
        let mut state = self.state.write().await;
        let pack = state.pack_mut(id)?;
        if pack.status != AssetPackStatus::Pending {
            return Err(pack_already_claimed(pack).into());
        }
        pack.status = AssetPackStatus::Processing;
        pack.updated_at = Utc::now();
        Ok(pack.clone())
    }

    async fn complete_asset_pack(
        &self,
        id: DbId,
        totals: AssetPackTotals,
    ) -> StoreResult<AssetPack> {
        let mut state = self.state.write().await;
        let pack = state.pack_mut(id)?;
        pack.status.ensure_transition(AssetPackStatus::Completed)?;
        pack.status = AssetPackStatus::Completed;
        pack.total_layers = totals.total_layers;
        pack.total_expressions = totals.total_expressions;
        pack.updated_at = Utc::now();
        Ok(pack.clone())
    }

    async fn create_job(&self, input: &CreatePipelineJob) -> StoreResult<PipelineJob> {
        check_initial_job_status(input.status)?;
        let mut state = self.state.write().await;
        if !state.packs.iter().any(|p| p.id == input.asset_pack_id) {
            return Err(pack_not_found(input.asset_pack_id).into());
        }

        let now = Utc::now();
        let job = PipelineJob {
            id: new_id(),
            asset_pack_id: input.asset_pack_id,
            stage: input.stage,
            status: input.status,
            progress: 0,
            error_message: None,
            metadata: serde_json::json!({}),
            started_at: (input.status == JobStatus::Processing).then_some(now),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: DbId) -> StoreResult<Option<PipelineJob>> {
        let state = self.state.read().await;
        Ok(state.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_jobs(
        &self,
        asset_pack_id: Option<DbId>,
        limit: i64,
    ) -> StoreResult<Vec<PipelineJob>> {
        let state = self.state.read().await;
        let filtered: Vec<PipelineJob> = state
            .jobs
            .iter()
            .filter(|j| asset_pack_id.map_or(true, |id| j.asset_pack_id == id))
            .cloned()
            .collect();
        Ok(take_limit(newest_first(&filtered, |j| j.created_at), limit))
    }

    async fn start_job(&self, id: DbId) -> StoreResult<PipelineJob> {
        self.apply_job_write(id, JobWrite::Start, |job| {
            job.status = JobStatus::Processing;
            job.started_at.get_or_insert_with(Utc::now);
        })
        .await
    }

    async fn update_job_progress(
        &self,
        id: DbId,
        progress: i16,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob> {
        self.apply_job_write(id, JobWrite::Progress(progress), |job| {
            job.progress = progress;
            if let Some(patch) = metadata {
                merge_metadata(&mut job.metadata, patch);
            }
        })
        .await
    }

    async fn complete_job(
        &self,
        id: DbId,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<PipelineJob> {
        self.apply_job_write(id, JobWrite::Complete, |job| {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.completed_at = Some(Utc::now());
            if let Some(patch) = metadata {
                merge_metadata(&mut job.metadata, patch);
            }
        })
        .await
    }

    async fn fail_job(&self, id: DbId, error: &str) -> StoreResult<PipelineJob> {
        self.apply_job_write(id, JobWrite::Fail, |job| {
            job.status = JobStatus::Failed;
            job.error_message = Some(error.to_string());
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    async fn insert_layer(&self, input: &CreateAssetLayer) -> StoreResult<AssetLayer> {
        let mut state = self.state.write().await;
        if !state.packs.iter().any(|p| p.id == input.asset_pack_id) {
            return Err(pack_not_found(input.asset_pack_id).into());
        }
        let layer = AssetLayer {
            id: new_id(),
            asset_pack_id: input.asset_pack_id,
            layer_type: input.layer_type.clone(),
            name: input.name.clone(),
            file_url: input.file_url.clone(),
            metadata: input.metadata.clone(),
            created_at: Utc::now(),
        };
        state.layers.push(layer.clone());
        Ok(layer)
    }

    async fn list_layers(&self, asset_pack_id: DbId) -> StoreResult<Vec<AssetLayer>> {
        let state = self.state.read().await;
        Ok(state
            .layers
            .iter()
            .filter(|l| l.asset_pack_id == asset_pack_id)
            .cloned()
            .collect())
    }

    async fn count_layers(&self, asset_pack_id: DbId) -> StoreResult<AssetPackTotals> {
        let state = self.state.read().await;
        let mut totals = AssetPackTotals::default();
        for layer in state.layers.iter().filter(|l| l.asset_pack_id == asset_pack_id) {
            if layer.layer_type == EXPRESSION_LAYER_TYPE {
                totals.total_expressions += 1;
            } else {
                totals.total_layers += 1;
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use layerforge_core::error::CoreError;
    use layerforge_core::stage::PipelineStage;

    use super::*;
    use crate::error::StoreError;

    async fn store_with_pack() -> (MemoryStore, AssetPack) {
        let store = MemoryStore::new();
        let pack = store
            .create_asset_pack(&CreateAssetPack {
                name: "Test Character".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        (store, pack)
    }

    async fn processing_job(store: &MemoryStore, pack_id: DbId) -> PipelineJob {
        store
            .create_job(&CreatePipelineJob {
                asset_pack_id: pack_id,
                stage: PipelineStage::Decomposition,
                status: JobStatus::Processing,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn new_pack_is_pending_with_zero_totals() {
        let (_, pack) = store_with_pack().await;
        assert_eq!(pack.status, AssetPackStatus::Pending);
        assert_eq!(pack.total_layers, 0);
        assert_eq!(pack.total_expressions, 0);
    }

    #[tokio::test]
    async fn pack_can_be_claimed_once() {
        let (store, pack) = store_with_pack().await;
        let claimed = store.claim_asset_pack(pack.id).await.unwrap();
        assert_eq!(claimed.status, AssetPackStatus::Processing);

        let err = store.claim_asset_pack(pack.id).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));

        let err = store.claim_asset_pack(new_id()).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn processing_job_gets_started_at() {
        let (store, pack) = store_with_pack().await;
        let job = processing_job(&store, pack.id).await;
        assert!(job.started_at.is_some());
        assert_eq!(job.progress, 0);
        assert_eq!(job.metadata, serde_json::json!({}));
    }

    #[tokio::test]
    async fn job_for_unknown_pack_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .create_job(&CreatePipelineJob {
                asset_pack_id: new_id(),
                stage: PipelineStage::Decomposition,
                status: JobStatus::Pending,
            })
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::NotFound { entity: "AssetPack", .. }));
    }

    #[tokio::test]
    async fn terminal_initial_status_is_rejected() {
        let (store, pack) = store_with_pack().await;
        let err = store
            .create_job(&CreatePipelineJob {
                asset_pack_id: pack.id,
                stage: PipelineStage::Decomposition,
                status: JobStatus::Completed,
            })
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn progress_cannot_decrease() {
        let (store, pack) = store_with_pack().await;
        let job = processing_job(&store, pack.id).await;
        store.update_job_progress(job.id, 50, None).await.unwrap();

        let err = store.update_job_progress(job.id, 10, None).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));

        let stored = store.find_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 50);
    }

    #[tokio::test]
    async fn progress_out_of_range_is_a_validation_error() {
        let (store, pack) = store_with_pack().await;
        let job = processing_job(&store, pack.id).await;
        let err = store.update_job_progress(job.id, 101, None).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn completed_job_cannot_restart() {
        let (store, pack) = store_with_pack().await;
        let job = processing_job(&store, pack.id).await;
        let done = store.complete_job(job.id, None).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100);
        assert!(done.completed_at.is_some());

        let err = store.start_job(job.id).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
        let err = store.update_job_progress(job.id, 100, None).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
        let err = store.fail_job(job.id, "late").await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn pending_job_cannot_complete_directly() {
        let (store, pack) = store_with_pack().await;
        let job = store
            .create_job(&CreatePipelineJob {
                asset_pack_id: pack.id,
                stage: PipelineStage::ExportPreparation,
                status: JobStatus::Pending,
            })
            .await
            .unwrap();
        assert!(job.started_at.is_none());
        let err = store.complete_job(job.id, None).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));

        let started = store.start_job(job.id).await.unwrap();
        assert_eq!(started.status, JobStatus::Processing);
        assert!(started.started_at.is_some());
    }

    #[tokio::test]
    async fn metadata_is_merged_across_writes() {
        let (store, pack) = store_with_pack().await;
        let job = processing_job(&store, pack.id).await;
        store
            .update_job_progress(job.id, 50, Some(serde_json::json!({"layer_analysis": "text"})))
            .await
            .unwrap();
        let done = store
            .complete_job(job.id, Some(serde_json::json!({"export_ready": true})))
            .await
            .unwrap();
        assert_eq!(done.metadata["layer_analysis"], "text");
        assert_eq!(done.metadata["export_ready"], true);
    }

    #[tokio::test]
    async fn failed_job_keeps_progress_and_message() {
        let (store, pack) = store_with_pack().await;
        let job = processing_job(&store, pack.id).await;
        store.update_job_progress(job.id, 37, None).await.unwrap();
        let failed = store.fail_job(job.id, "upstream down").await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.progress, 37);
        assert_eq!(failed.error_message.as_deref(), Some("upstream down"));
    }

    #[tokio::test]
    async fn completed_pack_rejects_processing() {
        let (store, pack) = store_with_pack().await;
        store
            .set_asset_pack_status(pack.id, AssetPackStatus::Processing)
            .await
            .unwrap();
        store
            .complete_asset_pack(
                pack.id,
                AssetPackTotals {
                    total_layers: 8,
                    total_expressions: 21,
                },
            )
            .await
            .unwrap();

        let err = store
            .set_asset_pack_status(pack.id, AssetPackStatus::Processing)
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn pending_pack_cannot_complete() {
        let (store, pack) = store_with_pack().await;
        let err = store
            .complete_asset_pack(pack.id, AssetPackTotals::default())
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let first = store
            .create_asset_pack(&CreateAssetPack {
                name: "first".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = store
            .create_asset_pack(&CreateAssetPack {
                name: "second".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let packs = store.list_asset_packs(10).await.unwrap();
        assert_eq!(packs[0].id, second.id);
        assert_eq!(packs[1].id, first.id);
        assert_eq!(store.list_asset_packs(1).await.unwrap().len(), 1);

        processing_job(&store, first.id).await;
        processing_job(&store, second.id).await;
        let jobs = store.list_jobs(Some(first.id), 10).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].asset_pack_id, first.id);
        assert_eq!(store.list_jobs(None, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn count_layers_separates_expressions() {
        let (store, pack) = store_with_pack().await;
        for layer_type in ["head", "eyes", EXPRESSION_LAYER_TYPE] {
            store
                .insert_layer(&CreateAssetLayer {
                    asset_pack_id: pack.id,
                    layer_type: layer_type.into(),
                    name: format!("{layer_type}_layer"),
                    file_url: "x.png".into(),
                    metadata: serde_json::json!({}),
                })
                .await
                .unwrap();
        }
        let totals = store.count_layers(pack.id).await.unwrap();
        assert_eq!(totals.total_layers, 2);
        assert_eq!(totals.total_expressions, 1);
        assert_eq!(store.list_layers(pack.id).await.unwrap().len(), 3);
    }
}
