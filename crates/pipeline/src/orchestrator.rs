//! Sequencing of the three pipeline stages for one asset pack.

use std::sync::Arc;

use layerforge_core::error::CoreError;
use layerforge_core::stage::{PipelineStage, STAGE_ORDER};
use layerforge_core::status::{AssetPackStatus, JobStatus};
use layerforge_core::types::DbId;
use layerforge_db::models::asset_pack::AssetPackTotals;
use layerforge_gateway::CompletionProvider;
use serde::Serialize;

use crate::error::PipelineError;
use crate::stages::StageRunner;
use crate::tracker::JobTracker;

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationReport {
    pub asset_pack_id: DbId,
    /// Job ids in stage order.
    pub jobs: Vec<(PipelineStage, DbId)>,
    pub totals: AssetPackTotals,
}

/// Drives an asset pack through decomposition, expression generation and
/// export preparation.
///
/// Stages run strictly one after another; the next stage's job row is only
/// created once the previous job is `completed`. A failing stage marks its
/// job and the pack `failed` and the error is returned. Rows written by
/// earlier stages are kept.
#[derive(Clone)]
pub struct Orchestrator {
    tracker: JobTracker,
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl Orchestrator {
    /// `provider` is `None` when no AI credential is configured; every run
    /// then fails with [`PipelineError::Configuration`].
    pub fn new(tracker: JobTracker, provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { tracker, provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Run every stage for a `pending` or `processing` pack.
    pub async fn run(
        &self,
        asset_pack_id: DbId,
        image_url: &str,
    ) -> Result<OrchestrationReport, PipelineError> {
        let (provider, image_url) = self.preflight(image_url)?;

        let pack = self
            .tracker
            .store()
            .find_asset_pack(asset_pack_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AssetPack",
                id: asset_pack_id,
            })?;
        if pack.status.is_terminal() {
            return Err(CoreError::Conflict(format!(
                "AssetPack {asset_pack_id} is already {}",
                pack.status
            ))
            .into());
        }

        self.tracker
            .set_pack_status(asset_pack_id, AssetPackStatus::Processing)
            .await?;
        self.execute(asset_pack_id, image_url, provider).await
    }

    /// Like [`run`](Self::run), but the pack must still be `pending` and is
    /// claimed atomically. A pack another run already holds is a
    /// `Conflict`, so concurrent requests never duplicate a run.
    pub async fn claim_and_run(
        &self,
        asset_pack_id: DbId,
        image_url: &str,
    ) -> Result<OrchestrationReport, PipelineError> {
        let (provider, image_url) = self.preflight(image_url)?;
        self.tracker.claim_pack(asset_pack_id).await?;
        self.execute(asset_pack_id, image_url, provider).await
    }

    /// Checks that touch no row: credential first, then the image reference.
    fn preflight<'a>(
        &self,
        image_url: &'a str,
    ) -> Result<(Arc<dyn CompletionProvider>, &'a str), PipelineError> {
        let provider = self.provider.clone().ok_or_else(|| {
            PipelineError::Configuration("AI_GATEWAY_API_KEY is not configured".into())
        })?;

        let image_url = image_url.trim();
        if image_url.is_empty() {
            return Err(CoreError::Validation("image_url must not be empty".into()).into());
        }
        Ok((provider, image_url))
    }

    /// Stage loop for a pack already in `processing`.
    async fn execute(
        &self,
        asset_pack_id: DbId,
        image_url: &str,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<OrchestrationReport, PipelineError> {
        tracing::info!(asset_pack_id = %asset_pack_id, "Starting pipeline run");
        let runner = StageRunner::new(self.tracker.clone(), provider);
        let mut jobs = Vec::with_capacity(STAGE_ORDER.len());

        for stage in STAGE_ORDER {
            let job = match self
                .tracker
                .create_job(asset_pack_id, stage, JobStatus::Processing)
                .await
            {
                Ok(job) => job,
                Err(e) => {
                    let err = PipelineError::from(e);
                    self.mark_pack_failed(asset_pack_id, &err).await;
                    return Err(err);
                }
            };
            jobs.push((stage, job.id));

            if let Err(err) = runner.run(&job, image_url).await {
                tracing::error!(
                    asset_pack_id = %asset_pack_id,
                    job_id = %job.id,
                    stage = %stage,
                    error = %err,
                    "Pipeline stage failed",
                );
                if let Err(e) = self.tracker.fail_job(job.id, &err.to_string()).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to mark job failed");
                }
                self.mark_pack_failed(asset_pack_id, &err).await;
                return Err(err);
            }
        }

        let totals = match self.finish(asset_pack_id).await {
            Ok(totals) => totals,
            Err(err) => {
                tracing::error!(asset_pack_id = %asset_pack_id, error = %err, "Failed to finalize pack");
                self.mark_pack_failed(asset_pack_id, &err).await;
                return Err(err);
            }
        };
        tracing::info!(
            asset_pack_id = %asset_pack_id,
            total_layers = totals.total_layers,
            total_expressions = totals.total_expressions,
            "Pipeline run completed",
        );

        Ok(OrchestrationReport {
            asset_pack_id,
            jobs,
            totals,
        })
    }

    /// Count the pack's layers and mark it `completed`.
    async fn finish(&self, asset_pack_id: DbId) -> Result<AssetPackTotals, PipelineError> {
        let totals = self.tracker.count_layers(asset_pack_id).await?;
        self.tracker.complete_pack(asset_pack_id, totals).await?;
        Ok(totals)
    }

    async fn mark_pack_failed(&self, asset_pack_id: DbId, cause: &PipelineError) {
        if let Err(e) = self
            .tracker
            .set_pack_status(asset_pack_id, AssetPackStatus::Failed)
            .await
        {
            tracing::error!(
                asset_pack_id = %asset_pack_id,
                error = %e,
                cause = %cause,
                "Failed to mark asset pack failed",
            );
        }
    }
}
