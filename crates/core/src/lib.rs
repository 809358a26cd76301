//! Domain types and pure pipeline logic shared by every LayerForge crate.
//!
//! Nothing in this crate performs I/O. Storage lives in `layerforge-db`,
//! the AI gateway client in `layerforge-gateway`, and stage execution in
//! `layerforge-pipeline`.

pub mod error;
pub mod job_events;
pub mod layers;
pub mod progress;
pub mod stage;
pub mod status;
pub mod types;
