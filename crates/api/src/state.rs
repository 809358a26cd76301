use std::sync::Arc;

use layerforge_db::{MemoryStore, PipelineStore};
use layerforge_events::EventBus;
use layerforge_gateway::CompletionProvider;
use layerforge_pipeline::{AssetCatalog, DemoSimulator, JobTracker, Orchestrator};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything is behind an `Arc` or is an `Arc`-backed handle.
#[derive(Clone)]
pub struct AppState {
    /// Primary store for uploaded packs (PostgreSQL or in-memory).
    pub store: Arc<dyn PipelineStore>,
    /// Writes to the primary store, announced on the event bus.
    pub tracker: JobTracker,
    pub orchestrator: Orchestrator,
    pub demo: Arc<DemoSimulator>,
    /// Merged read path over demo and primary rows.
    pub catalog: AssetCatalog,
    pub config: Arc<ServerConfig>,
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the pipeline components around `store`.
    ///
    /// `provider` is `None` when no AI credential is configured.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn PipelineStore>,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let tracker = JobTracker::new(Arc::clone(&store), Arc::clone(&event_bus));
        let orchestrator = Orchestrator::new(tracker.clone(), provider);
        let demo = Arc::new(DemoSimulator::new(Arc::clone(&event_bus), config.demo));
        let catalog = AssetCatalog::new(
            demo.store() as Arc<dyn PipelineStore>,
            Arc::clone(&store),
        );

        Self {
            store,
            tracker,
            orchestrator,
            demo,
            catalog,
            config: Arc::new(config),
            event_bus,
        }
    }

    /// State backed entirely by process memory.
    pub fn in_memory(
        config: ServerConfig,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), provider)
    }
}
