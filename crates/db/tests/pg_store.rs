//! `PgStore` against a real database.
//!
//! Exercises the guarded `UPDATE ... WHERE` statements:
//! - status transitions and terminal jobs
//! - forward-only progress
//! - metadata merge
//! - layer counting by kind
//! - pack claims

use assert_matches::assert_matches;
use layerforge_core::error::CoreError;
use layerforge_core::layers::{
    decomposition_layer_name, expression_layer_name, expression_pairs, EXPRESSION_LAYER_TYPE,
    LAYER_TYPES,
};
use layerforge_core::stage::PipelineStage;
use layerforge_core::status::{AssetPackStatus, JobStatus};
use layerforge_core::types::{new_id, DbId};
use layerforge_db::models::asset_layer::CreateAssetLayer;
use layerforge_db::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};
use layerforge_db::models::pipeline_job::{CreatePipelineJob, PipelineJob};
use layerforge_db::{PgStore, PipelineStore, StoreError};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_pack(store: &PgStore) -> AssetPack {
    store
        .create_asset_pack(&CreateAssetPack {
            user_id: Some(new_id()),
            name: "Test Character".into(),
            original_image_url: Some("https://cdn.example.com/hana.png".into()),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn new_job(store: &PgStore, pack_id: DbId, status: JobStatus) -> PipelineJob {
    store
        .create_job(&CreatePipelineJob {
            asset_pack_id: pack_id,
            stage: PipelineStage::Decomposition,
            status,
        })
        .await
        .unwrap()
}

fn is_conflict(err: &StoreError) -> bool {
    matches!(err, StoreError::Core(CoreError::Conflict(_)))
}

// ---------------------------------------------------------------------------
// Asset packs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn pack_round_trips_through_postgres(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;

    assert_eq!(pack.status, AssetPackStatus::Pending);
    assert_eq!(pack.total_layers, 0);

    let found = store.find_asset_pack(pack.id).await.unwrap().unwrap();
    assert_eq!(found.name, "Test Character");
    assert_eq!(found.user_id, pack.user_id);
    assert!(store.find_asset_pack(new_id()).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn completed_pack_rejects_processing(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
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
    assert!(is_conflict(&err), "unexpected error: {err:?}");

    let stored = store.find_asset_pack(pack.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AssetPackStatus::Completed);
    assert_eq!(stored.total_layers, 8);
    assert_eq!(stored.total_expressions, 21);
}

#[sqlx::test(migrations = "./migrations")]
async fn status_write_on_unknown_pack_is_not_found(pool: PgPool) {
    let store = PgStore::new(pool);
    let err = store
        .set_asset_pack_status(new_id(), AssetPackStatus::Processing)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn pack_can_be_claimed_once(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;

    let claimed = store.claim_asset_pack(pack.id).await.unwrap();
    assert_eq!(claimed.status, AssetPackStatus::Processing);

    let err = store.claim_asset_pack(pack.id).await.unwrap_err();
    assert!(is_conflict(&err), "unexpected error: {err:?}");

    let err = store.claim_asset_pack(new_id()).await.unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Pipeline jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn processing_job_gets_started_at(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;

    let running = new_job(&store, pack.id, JobStatus::Processing).await;
    assert!(running.started_at.is_some());
    assert_eq!(running.progress, 0);

    let waiting = new_job(&store, pack.id, JobStatus::Pending).await;
    assert!(waiting.started_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn job_for_unknown_pack_is_not_found(pool: PgPool) {
    let store = PgStore::new(pool);
    let err = store
        .create_job(&CreatePipelineJob {
            asset_pack_id: new_id(),
            stage: PipelineStage::Decomposition,
            status: JobStatus::Pending,
        })
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn progress_regression_is_a_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
    let job = new_job(&store, pack.id, JobStatus::Processing).await;

    store.update_job_progress(job.id, 50, None).await.unwrap();
    let err = store.update_job_progress(job.id, 40, None).await.unwrap_err();
    assert!(is_conflict(&err), "unexpected error: {err:?}");

    // Same value again is accepted.
    let same = store.update_job_progress(job.id, 50, None).await.unwrap();
    assert_eq!(same.progress, 50);
}

#[sqlx::test(migrations = "./migrations")]
async fn progress_on_pending_job_is_a_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
    let job = new_job(&store, pack.id, JobStatus::Pending).await;

    let err = store.update_job_progress(job.id, 20, None).await.unwrap_err();
    assert!(is_conflict(&err), "unexpected error: {err:?}");

    let started = store.start_job(job.id).await.unwrap();
    assert_eq!(started.status, JobStatus::Processing);
    assert!(started.started_at.is_some());
    let advanced = store.update_job_progress(job.id, 20, None).await.unwrap();
    assert_eq!(advanced.progress, 20);
}

#[sqlx::test(migrations = "./migrations")]
async fn out_of_range_progress_is_a_validation_error(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
    let job = new_job(&store, pack.id, JobStatus::Processing).await;

    let err = store.update_job_progress(job.id, 101, None).await.unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn metadata_is_merged_by_key(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
    let job = new_job(&store, pack.id, JobStatus::Processing).await;

    store
        .update_job_progress(job.id, 50, Some(json!({ "layer_analysis": "eight layers" })))
        .await
        .unwrap();
    let done = store
        .complete_job(job.id, Some(json!({ "export_ready": true })))
        .await
        .unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 100);
    assert!(done.completed_at.is_some());
    assert_eq!(
        done.metadata,
        json!({ "layer_analysis": "eight layers", "export_ready": true })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn terminal_job_rejects_every_write(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
    let job = new_job(&store, pack.id, JobStatus::Processing).await;
    let failed = store.fail_job(job.id, "upstream exploded").await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("upstream exploded"));

    assert!(is_conflict(&store.start_job(job.id).await.unwrap_err()));
    assert!(is_conflict(
        &store.update_job_progress(job.id, 90, None).await.unwrap_err()
    ));
    assert!(is_conflict(&store.complete_job(job.id, None).await.unwrap_err()));
    assert!(is_conflict(&store.fail_job(job.id, "again").await.unwrap_err()));

    let stored = store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some("upstream exploded"));
}

#[sqlx::test(migrations = "./migrations")]
async fn jobs_are_listed_newest_first_per_pack(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;
    let other = new_pack(&store).await;
    let first = new_job(&store, pack.id, JobStatus::Pending).await;
    let second = new_job(&store, pack.id, JobStatus::Pending).await;
    new_job(&store, other.id, JobStatus::Pending).await;

    let jobs = store.list_jobs(Some(pack.id), 10).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, second.id);
    assert_eq!(jobs[1].id, first.id);

    assert_eq!(store.list_jobs(None, 10).await.unwrap().len(), 3);
    assert_eq!(store.list_jobs(None, 1).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Asset layers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn count_layers_separates_expressions(pool: PgPool) {
    let store = PgStore::new(pool);
    let pack = new_pack(&store).await;

    for layer_type in LAYER_TYPES {
        store
            .insert_layer(&CreateAssetLayer {
                asset_pack_id: pack.id,
                layer_type: layer_type.to_string(),
                name: decomposition_layer_name(layer_type),
                file_url: "https://cdn.example.com/hana.png".into(),
                metadata: json!({ "source": "decomposition" }),
            })
            .await
            .unwrap();
    }
    for (family, variation) in expression_pairs() {
        store
            .insert_layer(&CreateAssetLayer {
                asset_pack_id: pack.id,
                layer_type: EXPRESSION_LAYER_TYPE.to_string(),
                name: expression_layer_name(family, variation),
                file_url: "generated_expression.png".into(),
                metadata: json!({ "expression_type": family, "variation": variation }),
            })
            .await
            .unwrap();
    }

    let totals = store.count_layers(pack.id).await.unwrap();
    assert_eq!(totals.total_layers, 8);
    assert_eq!(totals.total_expressions, 21);
    assert_eq!(store.list_layers(pack.id).await.unwrap().len(), 29);

    let empty = new_pack(&store).await;
    assert_eq!(store.count_layers(empty.id).await.unwrap(), AssetPackTotals::default());
}
