//! Scripted pipeline runs that never touch the AI gateway.
//!
//! The simulator owns its own [`MemoryStore`]; demo rows live exactly as
//! long as the simulator and are merged into listings by the catalog.

use std::sync::Arc;
use std::time::Duration;

use layerforge_core::layers::{expression_count, LAYER_TYPES};
use layerforge_core::progress::demo_progress_steps;
use layerforge_core::stage::STAGE_ORDER;
use layerforge_core::status::{AssetPackStatus, JobStatus};
use layerforge_core::types::DbId;
use layerforge_db::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};
use layerforge_db::{MemoryStore, PipelineStore};
use layerforge_events::EventBus;

use crate::error::PipelineError;
use crate::tracker::JobTracker;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_STAGE_GAP: Duration = Duration::from_millis(200);

/// Pacing of a simulated run.
#[derive(Debug, Clone, Copy)]
pub struct DemoConfig {
    /// Pause before each progress write.
    pub step_delay: Duration,
    /// Pause between finishing one job and starting the next.
    pub stage_gap: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            stage_gap: DEFAULT_STAGE_GAP,
        }
    }
}

impl DemoConfig {
    /// No pauses at all.
    pub fn immediate() -> Self {
        Self {
            step_delay: Duration::ZERO,
            stage_gap: Duration::ZERO,
        }
    }
}

/// A started demo run: the pack and its three `pending` jobs in stage
/// order.
#[derive(Debug, Clone)]
pub struct DemoRun {
    pub pack: AssetPack,
    pub job_ids: Vec<DbId>,
}

pub struct DemoSimulator {
    store: Arc<MemoryStore>,
    tracker: JobTracker,
    config: DemoConfig,
}

impl DemoSimulator {
    pub fn new(events: Arc<EventBus>, config: DemoConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tracker = JobTracker::new(store.clone() as Arc<dyn PipelineStore>, events);
        Self {
            store,
            tracker,
            config,
        }
    }

    /// The simulator's own store, for read access.
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> DemoConfig {
        self.config
    }

    /// Create a `processing` pack for `preview_url` and its three `pending`
    /// jobs. Nothing advances until [`run_to_completion`](Self::run_to_completion).
    pub async fn start(
        &self,
        name: &str,
        description: Option<&str>,
        preview_url: &str,
    ) -> Result<DemoRun, PipelineError> {
        let pack = self
            .tracker
            .create_pack(&CreateAssetPack {
                user_id: None,
                name: name.to_string(),
                description: description.map(str::to_string),
                thumbnail_url: Some(preview_url.to_string()),
                original_image_url: Some(preview_url.to_string()),
            })
            .await?;
        let pack = self
            .tracker
            .set_pack_status(pack.id, AssetPackStatus::Processing)
            .await?;

        let mut job_ids = Vec::with_capacity(STAGE_ORDER.len());
        for stage in STAGE_ORDER {
            let job = self
                .tracker
                .create_job(pack.id, stage, JobStatus::Pending)
                .await?;
            job_ids.push(job.id);
        }

        tracing::info!(asset_pack_id = %pack.id, name, "Demo run started");
        Ok(DemoRun { pack, job_ids })
    }

    /// Drive every job of `run` through `0, 20, ..., 100` and complete the
    /// pack with the fixed totals.
    pub async fn run_to_completion(&self, run: &DemoRun) -> Result<AssetPack, PipelineError> {
        for (i, job_id) in run.job_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.stage_gap).await;
            }

            self.tracker.start_job(*job_id).await?;
            for progress in demo_progress_steps() {
                tokio::time::sleep(self.config.step_delay).await;
                self.tracker.progress(*job_id, progress, None).await?;
            }
            self.tracker.complete_job(*job_id, None).await?;
        }

        let pack = self
            .tracker
            .complete_pack(run.pack.id, Self::totals())
            .await?;
        tracing::info!(asset_pack_id = %pack.id, "Demo run completed");
        Ok(pack)
    }

    /// Totals a finished demo pack reports.
    pub fn totals() -> AssetPackTotals {
        AssetPackTotals {
            total_layers: LAYER_TYPES.len() as i32,
            total_expressions: expression_count() as i32,
        }
    }
}
