//! Task trainers and the training orchestrator
//!
//! Each trainer pulls its dataset from the `FeatureAggregator`, fits one or
//! more networks, scores them in-sample, installs the new handle into the
//! `ModelContext` and returns registry metadata. Registry persistence is the
//! orchestrator's job, so metadata is never written before training finishes.

mod fuel;
mod maintenance;
mod orchestrator;
mod route;

pub use fuel::{fuel_network, FuelTrainer};
pub use maintenance::{maintenance_network, MaintenanceTrainer};
pub use orchestrator::{TaskOutcome, TaskStatus, TrainingOrchestrator, TrainingReport};
pub use route::{route_network, RouteTrainer};

use crate::clock::Clock;
use crate::context::ModelContext;
use crate::error::{PredictorError, Result};
use crate::features::FeatureAggregator;
use crate::models::{ModelMetadata, ModelType};
use crate::regression::{self, FitOutcome, NetworkSpec, RegressionModel};
use crate::registry::VersionStamper;
use ndarray::Array2;
use std::sync::Arc;
use uuid::Uuid;

/// A trainer for one prediction task
pub trait TaskTrainer: Send + Sync {
    fn model_type(&self) -> ModelType;

    /// Train, evaluate and install a new model, returning its metadata
    fn train(&self) -> Result<TrainedModel>;
}

/// Successful training result
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    pub examples: usize,
}

/// Shared collaborators of every trainer
#[derive(Clone)]
pub struct TrainingEnv {
    pub aggregator: Arc<FeatureAggregator>,
    pub models: Arc<ModelContext>,
    pub clock: Arc<dyn Clock>,
    pub versions: Arc<VersionStamper>,
}

impl TrainingEnv {
    /// Inactive metadata stamped with a fresh version
    fn metadata(
        &self,
        model_type: ModelType,
        parameters: serde_json::Value,
        accuracy: f64,
    ) -> ModelMetadata {
        ModelMetadata {
            id: Uuid::new_v4(),
            model_type,
            version: self.versions.next(self.clock.as_ref()),
            parameters,
            accuracy,
            trained_at: self.clock.now(),
            is_active: false,
        }
    }
}

/// Stack fixed-width feature rows into a matrix
fn feature_matrix<const N: usize>(rows: &[[f32; N]]) -> Array2<f32> {
    Array2::from_shape_fn((rows.len(), N), |(r, c)| rows[r][c])
}

/// Stack per-example label columns into a matrix
fn label_matrix(columns: &[&[f64]]) -> Array2<f32> {
    let rows = columns.first().map(|c| c.len()).unwrap_or(0);
    Array2::from_shape_fn((rows, columns.len()), |(r, c)| columns[c][r] as f32)
}

fn fit_task(
    model_type: ModelType,
    spec: &NetworkSpec,
    inputs: &Array2<f32>,
    targets: &Array2<f32>,
) -> Result<FitOutcome> {
    regression::fit(spec, inputs, targets).map_err(|e| PredictorError::Training {
        model_type,
        reason: e.to_string(),
    })
}

/// In-sample accuracy of one output column: 1 - MAE / mean(label), rounded to 4 places
///
/// Evaluated on the training inputs themselves, so the figure is optimistic.
fn in_sample_accuracy(
    model_type: ModelType,
    model: &RegressionModel,
    inputs: &Array2<f32>,
    labels: &[f64],
    column: usize,
) -> Result<f64> {
    let predictions = model
        .predict_batch(inputs)
        .map_err(|e| PredictorError::Training {
            model_type,
            reason: e.to_string(),
        })?;
    let predicted: Vec<f64> = predictions.column(column).iter().map(|&v| f64::from(v)).collect();
    let accuracy = accuracy_from_mae(mean_absolute_error(&predicted, labels), mean(labels));
    if !accuracy.is_finite() {
        return Err(PredictorError::numeric(
            "accuracy",
            format!("{} accuracy evaluated to {}", model_type, accuracy),
        ));
    }
    Ok(accuracy)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> f64 {
    let total: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum();
    total / actual.len() as f64
}

fn accuracy_from_mae(mae: f64, label_mean: f64) -> f64 {
    round_to(1.0 - mae / label_mean, 4)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_formula() {
        let labels = [100.0, 200.0, 300.0];
        let predicted = [110.0, 190.0, 330.0];
        // MAE = 50 / 3, mean = 200
        let mae = mean_absolute_error(&predicted, &labels);
        assert!((mae - 16.666_666).abs() < 1e-5);
        assert_eq!(accuracy_from_mae(mae, mean(&labels)), 0.9167);
    }

    #[test]
    fn test_accuracy_goes_negative_for_poor_fit() {
        assert_eq!(accuracy_from_mae(300.0, 100.0), -2.0);
        assert_eq!(accuracy_from_mae(0.0, 50.0), 1.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345_67, 2), 12.35);
        assert_eq!(round_to(0.123_449, 4), 0.1234);
    }

    #[test]
    fn test_matrices() {
        let features = feature_matrix(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(features, array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);

        let a = [1.0, 2.0];
        let b = [10.0, 20.0];
        assert_eq!(label_matrix(&[&a[..], &b[..]]), array![[1.0, 10.0], [2.0, 20.0]]);
    }

    #[test]
    fn test_zero_label_mean_is_numeric_instability() {
        let model =
            RegressionModel::from_parameters(vec![(array![[0.0]], array![1.0])]).unwrap();
        let inputs = array![[1.0f32], [2.0]];
        let result = in_sample_accuracy(ModelType::FuelPredictor, &model, &inputs, &[0.0, 0.0], 0);
        assert!(matches!(result, Err(PredictorError::NumericInstability { .. })));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::TrainingEnv;
    use crate::clock::{Clock, FixedClock};
    use crate::context::ModelContext;
    use crate::features::FeatureAggregator;
    use crate::models::{new_id, FuelLog, MaintenanceRecord, Voyage, VoyageFeedback};
    use crate::registry::VersionStamper;
    use crate::store::{HistoryWriter, InMemoryStore};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    pub fn env(store: Arc<InMemoryStore>) -> TrainingEnv {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
        TrainingEnv {
            aggregator: Arc::new(FeatureAggregator::new(store, clock.clone())),
            models: Arc::new(ModelContext::new()),
            clock,
            versions: Arc::new(VersionStamper::new()),
        }
    }

    /// Voyages with fuel and duration feedback that follow a smooth trend
    pub fn seed_voyages(store: &InMemoryStore, count: usize) {
        for i in 0..count {
            let distance = 800.0 + 150.0 * i as f64;
            let voyage = Voyage {
                id: new_id(),
                ship_id: "ship-1".to_string(),
                name: format!("voyage {}", i),
                origin: "Singapore".to_string(),
                destination: "Busan".to_string(),
                distance,
                cargo_weight: 20_000.0 + 500.0 * i as f64,
                cargo_type: None,
                weather_severity: 0.2 + 0.05 * (i % 10) as f64,
                wind_speed: 10.0 + (i % 7) as f64,
                departure_date: now() - Duration::days(20 + i as i64),
                arrival_time: None,
                predicted_fuel_usage: None,
                predicted_duration: None,
                optimal_speed: None,
            };
            store.insert_voyage(&voyage).unwrap();
            store
                .insert_feedback(&VoyageFeedback {
                    id: new_id(),
                    voyage_id: voyage.id.clone(),
                    actual_fuel_usage: Some(distance / 20.0),
                    actual_duration: Some(distance / 14.0),
                    fuel_accuracy: None,
                    duration_accuracy: None,
                    route_optimization_score: 3,
                    submitted_at: now(),
                })
                .unwrap();
            store
                .insert_fuel_log(&FuelLog {
                    id: new_id(),
                    ship_id: "ship-1".to_string(),
                    voyage_id: voyage.id.clone(),
                    timestamp: voyage.departure_date,
                    fuel_type: "MGO".to_string(),
                    fuel_usage: distance / 20.0,
                    fuel_cost: distance * 30.0,
                })
                .unwrap();
        }
    }

    /// Complete maintenance records for `ship-1`
    pub fn seed_maintenance(store: &InMemoryStore, count: usize) {
        for i in 0..count {
            let maintained_at = now() - Duration::days(5 + 7 * i as i64);
            store
                .insert_maintenance_record(&MaintenanceRecord {
                    id: new_id(),
                    ship_id: "ship-1".to_string(),
                    maintained_at,
                    next_due: Some(maintained_at + Duration::days(90 + i as i64)),
                    voyage_ready_date: Some(maintained_at + Duration::days(80 + i as i64)),
                    score: Some(3 + (i % 3) as u8),
                    description: None,
                })
                .unwrap();
        }
    }
}
