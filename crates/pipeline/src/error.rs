use layerforge_core::error::CoreError;
use layerforge_core::stage::PipelineStage;
use layerforge_db::StoreError;
use layerforge_gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required setting (the AI credential) is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Precondition failures: unknown pack, bad input, wrong status.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The gateway call of a stage failed. The message carries the
    /// upstream text.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        source: GatewayError,
    },
}

impl PipelineError {
    /// The domain error underneath, if any, whether raised directly or by
    /// a store guard.
    pub fn core(&self) -> Option<&CoreError> {
        match self {
            PipelineError::Core(e) | PipelineError::Store(StoreError::Core(e)) => Some(e),
            _ => None,
        }
    }
}
