use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::models::{error_codes, ApiError, HealthResponse, ServiceInfo};
use crate::error::CheckError;
use crate::metrics::METRICS;
use crate::models::{CheckRequest, PipelineResult};
use crate::pipeline::Pipeline;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        provider: state.pipeline.provider_name().to_string(),
    })
}

/// GET /
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

/// Check a claim
///
/// POST /check
pub async fn check_claim(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> ApiResult<PipelineResult> {
    if let Err(message) = request.validate() {
        warn!("Rejected claim: {}", message);
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(error_codes::VALIDATION_ERROR, message)),
        ));
    }

    match state.pipeline.check(&request.claim).await {
        Ok(result) => {
            info!("Check {} finished: {}", result.id, result.verdict);
            Ok(Json(result))
        }
        Err(CheckError::InvalidClaim(message)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(error_codes::VALIDATION_ERROR, message)),
        )),
        Err(e) => {
            error!("Check failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(error_codes::INTERNAL_ERROR, e.to_string())),
            ))
        }
    }
}

/// Fetch a stored result
///
/// GET /r/:id
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PipelineResult> {
    match state.pipeline.store().load(&id).await {
        Ok(Some(result)) => Ok(Json(result)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(error_codes::NOT_FOUND, format!("Result '{}' not found", id))),
        )),
        Err(e) => {
            error!("Failed to load result {}: {}", id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(error_codes::INTERNAL_ERROR, e.to_string())),
            ))
        }
    }
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}
