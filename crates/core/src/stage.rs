//! The three fixed pipeline stages and their execution order.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One phase of the asset-pack pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Decomposition,
    ExpressionGeneration,
    ExportPreparation,
}

/// Stages in the order the orchestrator runs them.
pub const STAGE_ORDER: [PipelineStage; 3] = [
    PipelineStage::Decomposition,
    PipelineStage::ExpressionGeneration,
    PipelineStage::ExportPreparation,
];

impl PipelineStage {
    /// String representation stored in the `stage` column.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Decomposition => "decomposition",
            PipelineStage::ExpressionGeneration => "expression_generation",
            PipelineStage::ExportPreparation => "export_preparation",
        }
    }

    /// Human-readable label shown on the dashboard timeline.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Decomposition => "Image Decomposition",
            PipelineStage::ExpressionGeneration => "Expression Generation",
            PipelineStage::ExportPreparation => "Export Preparation",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "decomposition" => Ok(PipelineStage::Decomposition),
            "expression_generation" => Ok(PipelineStage::ExpressionGeneration),
            "export_preparation" => Ok(PipelineStage::ExportPreparation),
            other => Err(CoreError::Validation(format!("Unknown pipeline stage '{other}'"))),
        }
    }

    /// Zero-based position in [`STAGE_ORDER`].
    pub fn position(self) -> usize {
        match self {
            PipelineStage::Decomposition => 0,
            PipelineStage::ExpressionGeneration => 1,
            PipelineStage::ExportPreparation => 2,
        }
    }

    /// The stage that runs after this one, if any.
    pub fn next(self) -> Option<Self> {
        STAGE_ORDER.get(self.position() + 1).copied()
    }
}

impl TryFrom<String> for PipelineStage {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
