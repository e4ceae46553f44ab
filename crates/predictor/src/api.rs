//! HTTP API: health, metrics, training and prediction endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    health::{ComponentStatus, HealthRegistry},
    FeedbackRequest, MaintenanceFeatures, ModelType, PredictionEngine, PredictorError,
    VoyageFeatures, VoyagePlanRequest,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub engine: Arc<PredictionEngine>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, engine: Arc<PredictionEngine>) -> Self {
        Self {
            health_registry,
            engine,
        }
    }
}

/// Error body returned by every JSON endpoint
#[derive(Debug)]
pub enum ApiError {
    Predictor(PredictorError),
    Internal(String),
}

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        ApiError::Predictor(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Predictor(err) => match err {
                PredictorError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                PredictorError::VoyageNotFound { .. } | PredictorError::NoVoyageHistory { .. } => {
                    StatusCode::NOT_FOUND
                }
                PredictorError::InsufficientData { .. } => StatusCode::CONFLICT,
                PredictorError::ModelNotTrained { .. } => StatusCode::SERVICE_UNAVAILABLE,
                PredictorError::NumericInstability { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PredictorError::Training { .. } | PredictorError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, kind) = match &self {
            ApiError::Predictor(err) => (err.to_string(), err.kind()),
            ApiError::Internal(message) => (message.clone(), "internal"),
        };
        if status.is_server_error() {
            error!(kind, error = %message, "Request failed");
        }
        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Run a full training pass off the async runtime
async fn train(State(state): State<Arc<AppState>>) -> ApiResult<predictor_lib::TrainingReport> {
    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.train_all())
        .await
        .map_err(|e| ApiError::Internal(format!("training task panicked: {}", e)))?;
    state.health_registry.apply_training_report(&report).await;
    info!(failed = report.failed_count(), "Training run finished");
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    pub model_type: Option<ModelType>,
    #[serde(default)]
    pub active_only: bool,
}

async fn list_models(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelsQuery>,
) -> ApiResult<Vec<predictor_lib::ModelMetadata>> {
    Ok(Json(
        state.engine.list_models(query.model_type, query.active_only)?,
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FuelPrediction {
    pub predicted_fuel_usage: f64,
}

async fn predict_fuel(
    State(state): State<Arc<AppState>>,
    Json(features): Json<VoyageFeatures>,
) -> ApiResult<FuelPrediction> {
    let predicted_fuel_usage = state.engine.predict_fuel_usage(&features)?;
    Ok(Json(FuelPrediction {
        predicted_fuel_usage,
    }))
}

async fn predict_route(
    State(state): State<Arc<AppState>>,
    Json(features): Json<VoyageFeatures>,
) -> ApiResult<predictor_lib::RoutePlan> {
    Ok(Json(state.engine.predict_route(&features)?))
}

async fn predict_maintenance(
    State(state): State<Arc<AppState>>,
    Json(features): Json<MaintenanceFeatures>,
) -> ApiResult<predictor_lib::MaintenanceForecast> {
    Ok(Json(state.engine.predict_maintenance(&features)?))
}

async fn plan_voyage(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VoyagePlanRequest>,
) -> ApiResult<predictor_lib::VoyagePlan> {
    Ok(Json(state.engine.plan_voyage(&request)?))
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<predictor_lib::VoyageFeedback> {
    Ok(Json(state.engine.record_feedback(&request)?))
}

async fn maintenance_alert(
    State(state): State<Arc<AppState>>,
    Path(ship_id): Path<String>,
) -> ApiResult<predictor_lib::MaintenanceRecord> {
    Ok(Json(state.engine.maintenance_alert(&ship_id)?))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/train", post(train))
        .route("/api/v1/models", get(list_models))
        .route("/api/v1/predict/fuel", post(predict_fuel))
        .route("/api/v1/predict/route", post(predict_route))
        .route("/api/v1/predict/maintenance", post(predict_maintenance))
        .route("/api/v1/voyages/plan", post(plan_voyage))
        .route("/api/v1/feedback", post(submit_feedback))
        .route("/api/v1/ships/:ship_id/maintenance", post(maintenance_alert))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
