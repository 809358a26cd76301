//! LayerForge change-notification bus.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PipelineEvent`] -- the envelope published whenever an asset pack or
//!   pipeline job row changes.

pub mod bus;

pub use bus::{EventBus, PipelineEvent};
