pub mod asset_packs;
pub mod demo;
pub mod pipeline_jobs;
pub mod uploads;
