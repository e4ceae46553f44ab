use super::{
    feature_matrix, fit_task, in_sample_accuracy, label_matrix, round_to, TaskTrainer,
    TrainedModel, TrainingEnv,
};
use crate::context::RouteModels;
use crate::error::{PredictorError, Result};
use crate::models::ModelType;
use crate::regression::{NetworkSpec, DEFAULT_LEARNING_RATE};
use serde_json::json;

/// Shared architecture of the duration and speed models
pub fn route_network() -> NetworkSpec {
    NetworkSpec {
        input_features: 4,
        layers: vec![16, 8, 1],
        epochs: 100,
        batch_size: 8,
        validation_split: 0.3,
        shuffle: true,
        learning_rate: DEFAULT_LEARNING_RATE,
    }
}

/// Trains the duration model and the implied-speed model together
///
/// Both models are fitted and scored before either is installed, so a
/// failure in the second fit leaves the previous pair in place.
pub struct RouteTrainer {
    env: TrainingEnv,
    network: NetworkSpec,
}

impl RouteTrainer {
    pub fn new(env: TrainingEnv) -> Self {
        Self::with_network(env, route_network())
    }

    pub fn with_network(env: TrainingEnv, network: NetworkSpec) -> Self {
        Self { env, network }
    }
}

impl TaskTrainer for RouteTrainer {
    fn model_type(&self) -> ModelType {
        ModelType::RouteOptimizer
    }

    fn train(&self) -> Result<TrainedModel> {
        let model_type = self.model_type();
        let examples = self.env.aggregator.route_training_data()?;
        if examples.is_empty() {
            return Err(PredictorError::InsufficientData { model_type });
        }

        let rows: Vec<[f32; 4]> = examples.iter().map(|e| e.features.to_f32()).collect();
        let durations: Vec<f64> = examples.iter().map(|e| e.actual_duration).collect();
        let speeds: Vec<f64> = examples.iter().map(|e| e.implied_speed()).collect();
        let inputs = feature_matrix(&rows);

        let duration_targets = label_matrix(&[durations.as_slice()]);
        let speed_targets = label_matrix(&[speeds.as_slice()]);
        let duration = fit_task(model_type, &self.network, &inputs, &duration_targets)?;
        let speed = fit_task(model_type, &self.network, &inputs, &speed_targets)?;

        let duration_accuracy =
            in_sample_accuracy(model_type, &duration.model, &inputs, &durations, 0)?;
        let speed_accuracy = in_sample_accuracy(model_type, &speed.model, &inputs, &speeds, 0)?;
        let accuracy = round_to((duration_accuracy + speed_accuracy) / 2.0, 4);

        let parameters = json!({
            "duration_model": self.network.to_json(),
            "speed_model": self.network.to_json(),
            "duration_accuracy": duration_accuracy,
            "speed_accuracy": speed_accuracy,
        });
        let metadata = self.env.metadata(model_type, parameters, accuracy);

        self.env.models.route.install(RouteModels {
            duration: duration.model,
            speed: speed.model,
        });
        Ok(TrainedModel {
            metadata,
            examples: examples.len(),
        })
    }
}
