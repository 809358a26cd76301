//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod asset_layer_repo;
pub mod asset_pack_repo;
pub mod pipeline_job_repo;

pub use asset_layer_repo::AssetLayerRepo;
pub use asset_pack_repo::AssetPackRepo;
pub use pipeline_job_repo::PipelineJobRepo;

/// Default page size for listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for listings.
pub const MAX_LIMIT: i64 = 500;

/// Clamp a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Largest accepted listing offset.
pub const MAX_OFFSET: i64 = 100_000;

/// Clamp a requested offset into `0..=MAX_OFFSET`.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).clamp(0, MAX_OFFSET)
}
