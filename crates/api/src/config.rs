use std::path::PathBuf;
use std::time::Duration;

use layerforge_gateway::client::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use layerforge_gateway::GatewayConfig;
use layerforge_pipeline::DemoConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Every field except the JWT secret has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Whole-request timeout. Synchronous `/process` calls run all three
    /// stages inside it.
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. `None` runs the live store in memory.
    pub database_url: Option<String>,
    /// Directory uploaded images are written to and served from.
    pub upload_dir: PathBuf,
    /// Externally visible origin used to build uploaded image URLs.
    pub public_base_url: String,
    pub jwt: JwtConfig,
    /// `None` when `AI_GATEWAY_API_KEY` is unset.
    pub gateway: Option<GatewayConfig>,
    pub demo: DemoConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                             |
    /// |---------------------------|-------------------------------------|
    /// | `HOST`                    | `0.0.0.0`                           |
    /// | `PORT`                    | `3000`                              |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`             |
    /// | `REQUEST_TIMEOUT_SECS`    | `300`                               |
    /// | `DATABASE_URL`            | unset (in-memory store)             |
    /// | `UPLOAD_DIR`              | `./uploads`                         |
    /// | `PUBLIC_BASE_URL`         | `http://localhost:3000`             |
    /// | `AI_GATEWAY_URL`          | `https://ai.gateway.lovable.dev/v1` |
    /// | `AI_GATEWAY_API_KEY`      | unset (runs fail with a config error) |
    /// | `AI_GATEWAY_MODEL`        | `google/gemini-2.5-flash`           |
    /// | `AI_GATEWAY_TIMEOUT_SECS` | `120`                               |
    /// | `DEMO_STEP_DELAY_MS`      | `300`                               |
    /// | `DEMO_STAGE_GAP_MS`       | `200`                               |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = non_empty_var("DATABASE_URL");

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()),
        );

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let gateway = non_empty_var("AI_GATEWAY_API_KEY").map(|api_key| {
            let timeout_secs: u64 = std::env::var("AI_GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .expect("AI_GATEWAY_TIMEOUT_SECS must be a valid u64");
            GatewayConfig {
                base_url: std::env::var("AI_GATEWAY_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
                api_key,
                model: std::env::var("AI_GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
                timeout: Duration::from_secs(timeout_secs),
            }
        });

        let demo = DemoConfig {
            step_delay: millis_var("DEMO_STEP_DELAY_MS", 300),
            stage_gap: millis_var("DEMO_STAGE_GAP_MS", 200),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            upload_dir,
            public_base_url,
            jwt,
            gateway,
            demo,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn millis_var(name: &str, default: u64) -> Duration {
    let ms: u64 = std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid u64"));
    Duration::from_millis(ms)
}
