//! Multi-stage asset-pack pipeline.
//!
//! - [`JobTracker`] -- every pack/job/layer write goes through here so each
//!   one is also published on the event bus.
//! - [`StageRunner`] -- executes one stage against the AI gateway.
//! - [`Orchestrator`] -- sequences the three stages for one pack.
//! - [`DemoSimulator`] -- scripted, gateway-free runs over an owned
//!   in-memory store.
//! - [`AssetCatalog`] -- merged read path over demo and live rows.

pub mod catalog;
pub mod demo;
pub mod error;
pub mod orchestrator;
pub mod stages;
pub mod tracker;

pub use catalog::{AssetCatalog, MergePolicy};
pub use demo::{DemoConfig, DemoRun, DemoSimulator};
pub use error::PipelineError;
pub use orchestrator::{OrchestrationReport, Orchestrator};
pub use stages::StageRunner;
pub use tracker::JobTracker;
