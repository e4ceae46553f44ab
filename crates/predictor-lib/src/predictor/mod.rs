//! Prediction services
//!
//! Each service reads the current handle from the `ModelContext`, evaluates
//! it on a validated typed input and applies its task's output policy.

mod fuel;
mod maintenance;
mod output;
mod route;

pub use fuel::FuelPredictor;
pub use maintenance::MaintenancePredictor;
pub use output::{AppliedFallback, FallbackConfig, ForecastPolicy};
pub use route::{RoutePredictor, SCHEDULE_SEGMENTS, SPEED_JITTER};

use crate::clock::Clock;
use crate::context::ModelContext;
use crate::error::{PredictorError, Result};
use crate::models::ModelType;
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::regression::RegressionModel;
use std::sync::Arc;
use std::time::Instant;

/// Trait for prediction implementations
pub trait Predictor: Send + Sync {
    type Input;
    type Output;

    fn model_type(&self) -> ModelType;

    /// Evaluate the current model on `input`
    fn predict(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// Collaborators shared by the prediction services
#[derive(Clone)]
pub struct PredictionEnv {
    pub models: Arc<ModelContext>,
    pub clock: Arc<dyn Clock>,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl PredictionEnv {
    /// Run one prediction, recording latency on success and the error kind on failure
    fn observe<T>(&self, model_type: ModelType, predict: impl FnOnce() -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = predict();
        match &result {
            Ok(_) => self
                .metrics
                .observe_prediction_latency(model_type, start.elapsed().as_secs_f64()),
            Err(e) => {
                self.metrics.inc_prediction_errors(model_type, e.kind());
                self.logger
                    .log_prediction_failed(model_type, e.kind(), &e.to_string());
            }
        }
        result
    }
}

/// Evaluate a model on one feature row, widening the outputs to f64
fn evaluate(stage: &'static str, model: &RegressionModel, input: &[f32]) -> Result<Vec<f64>> {
    let outputs = model
        .predict(input)
        .map_err(|e| PredictorError::numeric(stage, e.to_string()))?;
    Ok(outputs.into_iter().map(f64::from).collect())
}

/// Fail with `NumericInstability` unless `value` is finite
fn require_finite(stage: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictorError::numeric(
            stage,
            format!("{} evaluated to {}", field, value),
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::PredictionEnv;
    use crate::clock::FixedClock;
    use crate::context::ModelContext;
    use crate::observability::{PredictorMetrics, StructuredLogger};
    use crate::regression::RegressionModel;
    use chrono::{DateTime, TimeZone, Utc};
    use ndarray::{Array1, Array2};
    use std::sync::Arc;

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
    }

    pub fn env() -> PredictionEnv {
        PredictionEnv {
            models: Arc::new(ModelContext::new()),
            clock: Arc::new(FixedClock(now())),
            metrics: PredictorMetrics::new(),
            logger: StructuredLogger::new("test"),
        }
    }

    /// Model ignoring its inputs and returning `outputs`
    pub fn constant_model(inputs: usize, outputs: &[f32]) -> RegressionModel {
        RegressionModel::from_parameters(vec![(
            Array2::zeros((inputs, outputs.len())),
            Array1::from_vec(outputs.to_vec()),
        )])
        .unwrap()
    }
}
