use std::net::SocketAddr;
use std::sync::Arc;

use layerforge_db::{MemoryStore, PgStore, PipelineStore};
use layerforge_gateway::{CompletionProvider, GatewayClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use layerforge_api::config::ServerConfig;
use layerforge_api::router::build_app_router;
use layerforge_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "layerforge_api=debug,layerforge_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store: Arc<dyn PipelineStore> = match &config.database_url {
        Some(database_url) => {
            let pool = layerforge_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            layerforge_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            layerforge_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, uploads are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // --- AI gateway ---
    let provider: Option<Arc<dyn CompletionProvider>> = match &config.gateway {
        Some(gateway) => {
            tracing::info!(base_url = %gateway.base_url, model = %gateway.model, "AI gateway configured");
            Some(Arc::new(GatewayClient::new(gateway.clone())))
        }
        None => {
            tracing::warn!("AI_GATEWAY_API_KEY not set, pipeline runs will fail");
            None
        }
    };

    // --- Upload directory ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    // --- App state + router ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(config, store, provider);
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
