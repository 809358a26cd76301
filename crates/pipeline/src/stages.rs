//! Execution of a single pipeline stage.
//!
//! A stage receives a job already in `processing`, advances its progress
//! through fixed checkpoints, inserts the layers it produces and finishes
//! the job at 100. Any error aborts the stage immediately; marking the job
//! failed is left to the orchestrator.

use std::sync::Arc;

use layerforge_core::layers::{
    decomposition_layer_name, expression_count, expression_layer_name, expression_pairs,
    EXPRESSION_LAYER_TYPE, EXPRESSION_PLACEHOLDER_FILE, LAYER_TYPES,
};
use layerforge_core::progress::{
    ExpressionProgress, PROGRESS_ANALYSIS_DONE, PROGRESS_EXPORT_HALFWAY, PROGRESS_STARTED,
};
use layerforge_core::stage::PipelineStage;
use layerforge_db::models::asset_layer::CreateAssetLayer;
use layerforge_db::models::pipeline_job::PipelineJob;
use layerforge_gateway::{ChatMessage, CompletionProvider};

use crate::error::PipelineError;
use crate::tracker::JobTracker;

const DECOMPOSITION_SYSTEM_PROMPT: &str = "You are an expert at analyzing anime/VTuber character \
images and identifying distinct layers for animation.\n\
Analyze the image and identify these layer types: {layers}.\n\
For each layer, provide a description of what should be isolated.";

const DECOMPOSITION_USER_PROMPT: &str = "Analyze this character image and identify all the layers \
needed for VTuber rigging. List each layer type and describe its boundaries.";

const EXPRESSION_SYSTEM_PROMPT: &str =
    "You are an expert at describing anime character expressions for VTuber rigging.";

fn decomposition_system_prompt() -> String {
    DECOMPOSITION_SYSTEM_PROMPT.replace("{layers}", &LAYER_TYPES.join(", "))
}

fn expression_user_prompt(family: &str, variation: &str) -> String {
    format!("Describe how a {family} should look for the \"{variation}\" expression in VTuber rigging.")
}

/// Runs stages against a completion provider, writing through a
/// [`JobTracker`].
#[derive(Clone)]
pub struct StageRunner {
    tracker: JobTracker,
    provider: Arc<dyn CompletionProvider>,
}

impl StageRunner {
    pub fn new(tracker: JobTracker, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { tracker, provider }
    }

    /// Run `job`'s stage to completion. `image_url` is only read by
    /// decomposition.
    pub async fn run(&self, job: &PipelineJob, image_url: &str) -> Result<(), PipelineError> {
        match job.stage {
            PipelineStage::Decomposition => self.decomposition(job, image_url).await,
            PipelineStage::ExpressionGeneration => self.expression_generation(job).await,
            PipelineStage::ExportPreparation => self.export_preparation(job).await,
        }
    }

    async fn ask(
        &self,
        stage: PipelineStage,
        messages: Vec<ChatMessage>,
    ) -> Result<String, PipelineError> {
        self.provider
            .complete(messages)
            .await
            .map_err(|source| PipelineError::Stage { stage, source })
    }

    async fn decomposition(&self, job: &PipelineJob, image_url: &str) -> Result<(), PipelineError> {
        tracing::info!(job_id = %job.id, asset_pack_id = %job.asset_pack_id, "Starting decomposition stage");
        self.tracker.progress(job.id, PROGRESS_STARTED, None).await?;

        let analysis = self
            .ask(
                PipelineStage::Decomposition,
                vec![
                    ChatMessage::system(decomposition_system_prompt()),
                    ChatMessage::user_with_image(DECOMPOSITION_USER_PROMPT, image_url),
                ],
            )
            .await?;

        self.tracker
            .progress(
                job.id,
                PROGRESS_ANALYSIS_DONE,
                Some(serde_json::json!({ "layer_analysis": analysis })),
            )
            .await?;

        for layer_type in LAYER_TYPES {
            self.tracker
                .insert_layer(&CreateAssetLayer {
                    asset_pack_id: job.asset_pack_id,
                    layer_type: layer_type.to_string(),
                    name: decomposition_layer_name(layer_type),
                    file_url: image_url.to_string(),
                    metadata: serde_json::json!({
                        "source": "decomposition",
                        "analysis": analysis,
                    }),
                })
                .await?;
        }

        self.tracker.complete_job(job.id, None).await?;
        tracing::info!(job_id = %job.id, layers = LAYER_TYPES.len(), "Decomposition stage completed");
        Ok(())
    }

    async fn expression_generation(&self, job: &PipelineJob) -> Result<(), PipelineError> {
        tracing::info!(job_id = %job.id, asset_pack_id = %job.asset_pack_id, "Starting expression generation stage");
        self.tracker.progress(job.id, PROGRESS_STARTED, None).await?;

        let mut progress = ExpressionProgress::new(expression_count());
        for (family, variation) in expression_pairs() {
            let description = self
                .ask(
                    PipelineStage::ExpressionGeneration,
                    vec![
                        ChatMessage::system(EXPRESSION_SYSTEM_PROMPT),
                        ChatMessage::user(expression_user_prompt(family, variation)),
                    ],
                )
                .await?;

            self.tracker
                .insert_layer(&CreateAssetLayer {
                    asset_pack_id: job.asset_pack_id,
                    layer_type: EXPRESSION_LAYER_TYPE.to_string(),
                    name: expression_layer_name(family, variation),
                    file_url: EXPRESSION_PLACEHOLDER_FILE.to_string(),
                    metadata: serde_json::json!({
                        "expression_type": family,
                        "variation": variation,
                        "description": description,
                    }),
                })
                .await?;

            self.tracker.progress(job.id, progress.advance(), None).await?;
        }

        self.tracker.complete_job(job.id, None).await?;
        tracing::info!(job_id = %job.id, expressions = expression_count(), "Expression generation stage completed");
        Ok(())
    }

    async fn export_preparation(&self, job: &PipelineJob) -> Result<(), PipelineError> {
        tracing::info!(job_id = %job.id, asset_pack_id = %job.asset_pack_id, "Starting export preparation stage");
        self.tracker
            .progress(job.id, PROGRESS_EXPORT_HALFWAY, None)
            .await?;
        self.tracker
            .complete_job(job.id, Some(serde_json::json!({ "export_ready": true })))
            .await?;
        tracing::info!(job_id = %job.id, "Export preparation stage completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposition_prompt_lists_every_layer_type() {
        let prompt = decomposition_system_prompt();
        assert!(prompt.contains("head, ears, eyes, eyebrows, nose, mouth, body, accessories"));
        assert!(!prompt.contains("{layers}"));
    }

    #[test]
    fn expression_prompt_quotes_variation() {
        assert_eq!(
            expression_user_prompt("mouth", "A"),
            "Describe how a mouth should look for the \"A\" expression in VTuber rigging."
        );
    }
}
