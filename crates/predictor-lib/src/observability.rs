//! Observability infrastructure for the voyage predictor
//!
//! Provides:
//! - Prometheus metrics (training duration and outcome, accuracy, prediction latency and errors)
//! - Structured JSON logging of lifecycle events with tracing

use crate::models::ModelType;
use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    GaugeVec, HistogramVec, IntCounterVec, IntGaugeVec,
};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

/// Prediction latency buckets (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Training duration buckets (in seconds)
const TRAINING_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    training_duration_seconds: HistogramVec,
    training_runs: IntCounterVec,
    model_accuracy: GaugeVec,
    model_version_info: GaugeVec,
    training_examples: IntGaugeVec,
    prediction_latency_seconds: HistogramVec,
    prediction_errors: IntCounterVec,
    maintenance_fallbacks: IntCounterVec,
    active_versions: Mutex<HashMap<ModelType, String>>,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            training_duration_seconds: register_histogram_vec!(
                "voyage_predictor_training_duration_seconds",
                "Wall time spent training one task",
                &["model_type"],
                TRAINING_BUCKETS.to_vec()
            )
            .expect("Failed to register training_duration_seconds"),

            training_runs: register_int_counter_vec!(
                "voyage_predictor_training_runs_total",
                "Training attempts by task and outcome",
                &["model_type", "outcome"]
            )
            .expect("Failed to register training_runs_total"),

            model_accuracy: register_gauge_vec!(
                "voyage_predictor_model_accuracy",
                "In-sample accuracy of the active model",
                &["model_type"]
            )
            .expect("Failed to register model_accuracy"),

            model_version_info: register_gauge_vec!(
                "voyage_predictor_model_version_info",
                "Version of the active model per task",
                &["model_type", "version"]
            )
            .expect("Failed to register model_version_info"),

            training_examples: register_int_gauge_vec!(
                "voyage_predictor_training_examples",
                "Number of examples used by the last successful training run",
                &["model_type"]
            )
            .expect("Failed to register training_examples"),

            prediction_latency_seconds: register_histogram_vec!(
                "voyage_predictor_prediction_latency_seconds",
                "Time spent evaluating a model for one prediction",
                &["model_type"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            prediction_errors: register_int_counter_vec!(
                "voyage_predictor_prediction_errors_total",
                "Failed predictions by task and error kind",
                &["model_type", "kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            maintenance_fallbacks: register_int_counter_vec!(
                "voyage_predictor_maintenance_fallbacks_total",
                "Maintenance outputs replaced by their default",
                &["field"]
            )
            .expect("Failed to register maintenance_fallbacks_total"),

            active_versions: Mutex::new(HashMap::new()),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_training(&self, model_type: ModelType, duration_secs: f64, succeeded: bool) {
        let inner = self.inner();
        inner
            .training_duration_seconds
            .with_label_values(&[model_type.as_str()])
            .observe(duration_secs);
        let outcome = if succeeded { "success" } else { "failure" };
        inner
            .training_runs
            .with_label_values(&[model_type.as_str(), outcome])
            .inc();
    }

    /// Record the newly active model of a task, replacing the previous version label
    pub fn set_active_model(&self, model_type: ModelType, version: &str, accuracy: f64, examples: usize) {
        let inner = self.inner();
        let mut versions = inner
            .active_versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = versions.insert(model_type, version.to_string()) {
            let _ = inner
                .model_version_info
                .remove_label_values(&[model_type.as_str(), previous.as_str()]);
        }
        inner
            .model_version_info
            .with_label_values(&[model_type.as_str(), version])
            .set(1.0);
        inner
            .model_accuracy
            .with_label_values(&[model_type.as_str()])
            .set(accuracy);
        inner
            .training_examples
            .with_label_values(&[model_type.as_str()])
            .set(examples as i64);
    }

    pub fn observe_prediction_latency(&self, model_type: ModelType, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[model_type.as_str()])
            .observe(duration_secs);
    }

    pub fn inc_prediction_errors(&self, model_type: ModelType, kind: &str) {
        self.inner()
            .prediction_errors
            .with_label_values(&[model_type.as_str(), kind])
            .inc();
    }

    pub fn inc_maintenance_fallback(&self, field: &str) {
        self.inner()
            .maintenance_fallbacks
            .with_label_values(&[field])
            .inc();
    }
}

/// Structured logger for predictor lifecycle events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            port = port,
            "Voyage predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Voyage predictor shutting down"
        );
    }

    pub fn log_training_started(&self, model_type: ModelType) {
        info!(
            event = "training_started",
            instance = %self.instance,
            model_type = %model_type,
            "Training started"
        );
    }

    pub fn log_model_trained(
        &self,
        model_type: ModelType,
        version: &str,
        accuracy: f64,
        examples: usize,
        duration_ms: u64,
    ) {
        info!(
            event = "model_trained",
            instance = %self.instance,
            model_type = %model_type,
            version = %version,
            accuracy = accuracy,
            examples = examples,
            duration_ms = duration_ms,
            "Model trained"
        );
    }

    pub fn log_training_failed(&self, model_type: ModelType, error_kind: &str, message: &str) {
        warn!(
            event = "training_failed",
            instance = %self.instance,
            model_type = %model_type,
            error_kind = %error_kind,
            error = %message,
            "Training failed, continuing with next task"
        );
    }

    pub fn log_model_activated(&self, model_type: ModelType, version: &str) {
        info!(
            event = "model_activated",
            instance = %self.instance,
            model_type = %model_type,
            version = %version,
            "Model marked active in registry"
        );
    }

    pub fn log_maintenance_fallback(&self, field: &str, raw_value: f64, substituted: f64) {
        warn!(
            event = "maintenance_fallback",
            instance = %self.instance,
            field = %field,
            raw_value = raw_value,
            substituted = substituted,
            "Maintenance output unusable, default substituted"
        );
    }

    pub fn log_prediction_failed(&self, model_type: ModelType, error_kind: &str, message: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            model_type = %model_type,
            error_kind = %error_kind,
            error = %message,
            "Prediction failed"
        );
    }
}
