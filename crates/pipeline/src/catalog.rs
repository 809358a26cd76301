//! Read path over demo rows and live rows.
//!
//! Every listing and lookup served to the dashboard goes through
//! [`AssetCatalog`], which combines the demo simulator's store with the
//! primary store according to a [`MergePolicy`]. Pagination is applied to
//! the merged sequence.

use std::sync::Arc;

use layerforge_core::types::DbId;
use layerforge_db::models::asset_layer::AssetLayer;
use layerforge_db::models::asset_pack::AssetPack;
use layerforge_db::models::pipeline_job::PipelineJob;
use layerforge_db::{PipelineStore, StoreResult};
use serde::{Deserialize, Serialize};

/// How demo and live rows are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Demo rows (newest-first) followed by live rows (newest-first).
    #[default]
    DemoFirst,
    LiveOnly,
    DemoOnly,
}

impl MergePolicy {
    fn sources<'a>(
        self,
        demo: &'a Arc<dyn PipelineStore>,
        live: &'a Arc<dyn PipelineStore>,
    ) -> Vec<&'a Arc<dyn PipelineStore>> {
        match self {
            MergePolicy::DemoFirst => vec![demo, live],
            MergePolicy::LiveOnly => vec![live],
            MergePolicy::DemoOnly => vec![demo],
        }
    }
}

#[derive(Clone)]
pub struct AssetCatalog {
    demo: Arc<dyn PipelineStore>,
    live: Arc<dyn PipelineStore>,
    policy: MergePolicy,
}

impl AssetCatalog {
    pub fn new(demo: Arc<dyn PipelineStore>, live: Arc<dyn PipelineStore>) -> Self {
        Self {
            demo,
            live,
            policy: MergePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Packs in merge order. `policy` overrides the catalog default.
    pub async fn list_asset_packs(
        &self,
        policy: Option<MergePolicy>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<AssetPack>> {
        let mut merged = Vec::new();
        for store in self.sources(policy) {
            merged.extend(store.list_asset_packs(limit.saturating_add(offset)).await?);
        }
        Ok(paginate(merged, limit, offset))
    }

    /// First match in merge order.
    pub async fn find_asset_pack(&self, id: DbId) -> StoreResult<Option<AssetPack>> {
        for store in self.sources(None) {
            if let Some(pack) = store.find_asset_pack(id).await? {
                return Ok(Some(pack));
            }
        }
        Ok(None)
    }

    pub async fn list_jobs(
        &self,
        policy: Option<MergePolicy>,
        asset_pack_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<PipelineJob>> {
        let mut merged = Vec::new();
        for store in self.sources(policy) {
            merged.extend(store.list_jobs(asset_pack_id, limit.saturating_add(offset)).await?);
        }
        Ok(paginate(merged, limit, offset))
    }

    pub async fn find_job(&self, id: DbId) -> StoreResult<Option<PipelineJob>> {
        for store in self.sources(None) {
            if let Some(job) = store.find_job(id).await? {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Layers of the pack, from whichever source holds it.
    pub async fn list_layers(&self, asset_pack_id: DbId) -> StoreResult<Vec<AssetLayer>> {
        for store in self.sources(None) {
            if store.find_asset_pack(asset_pack_id).await?.is_some() {
                return store.list_layers(asset_pack_id).await;
            }
        }
        Ok(Vec::new())
    }

    fn sources(&self, policy: Option<MergePolicy>) -> Vec<&Arc<dyn PipelineStore>> {
        policy
            .unwrap_or(self.policy)
            .sources(&self.demo, &self.live)
    }
}

fn paginate<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}
