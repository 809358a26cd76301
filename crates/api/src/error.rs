use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use layerforge_core::error::CoreError;
use layerforge_db::StoreError;
use layerforge_gateway::GatewayError;
use layerforge_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Every error renders as `{"error": message, "code": CODE}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(err) => classify_store_error(err),
            AppError::Pipeline(err) => classify_pipeline_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> ErrorParts {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Configuration(msg) => configuration(msg),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

fn configuration(msg: &str) -> ErrorParts {
    tracing::error!(error = %msg, "Server misconfigured");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "CONFIGURATION_ERROR",
        msg.to_string(),
    )
}

fn classify_store_error(err: &StoreError) -> ErrorParts {
    match err {
        StoreError::Core(core) => classify_core_error(core),
        StoreError::Database(db) => {
            tracing::error!(error = %db, "Database error");
            internal()
        }
    }
}

/// Gateway failures surface as `502` with the upstream text so the
/// dashboard can show why a run failed.
fn classify_pipeline_error(err: &PipelineError) -> ErrorParts {
    match err {
        PipelineError::Configuration(msg) => configuration(msg),
        PipelineError::Core(core) => classify_core_error(core),
        PipelineError::Store(store) => classify_store_error(store),
        PipelineError::Stage { source, .. } => {
            if let GatewayError::Request(e) = source {
                tracing::warn!(error = %e, "AI gateway unreachable");
            }
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
        }
    }
}
