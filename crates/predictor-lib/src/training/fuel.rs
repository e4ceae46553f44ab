use super::{
    feature_matrix, fit_task, in_sample_accuracy, label_matrix, TaskTrainer, TrainedModel,
    TrainingEnv,
};
use crate::error::{PredictorError, Result};
use crate::models::ModelType;
use crate::regression::{NetworkSpec, DEFAULT_LEARNING_RATE};

/// 4 -> 16 -> 8 -> 1, batch 8, 30% validation
pub fn fuel_network() -> NetworkSpec {
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

/// Trains the fuel usage model from voyage feedback
pub struct FuelTrainer {
    env: TrainingEnv,
    network: NetworkSpec,
}

impl FuelTrainer {
    pub fn new(env: TrainingEnv) -> Self {
        Self::with_network(env, fuel_network())
    }

    pub fn with_network(env: TrainingEnv, network: NetworkSpec) -> Self {
        Self { env, network }
    }
}

impl TaskTrainer for FuelTrainer {
    fn model_type(&self) -> ModelType {
        ModelType::FuelPredictor
    }

    fn train(&self) -> Result<TrainedModel> {
        let model_type = self.model_type();
        let examples = self.env.aggregator.fuel_training_data()?;
        if examples.is_empty() {
            return Err(PredictorError::InsufficientData { model_type });
        }

        let rows: Vec<[f32; 4]> = examples.iter().map(|e| e.features.to_f32()).collect();
        let labels: Vec<f64> = examples.iter().map(|e| e.actual_fuel_usage).collect();
        let inputs = feature_matrix(&rows);
        let targets = label_matrix(&[labels.as_slice()]);

        let outcome = fit_task(model_type, &self.network, &inputs, &targets)?;
        let accuracy = in_sample_accuracy(model_type, &outcome.model, &inputs, &labels, 0)?;
        let metadata = self
            .env
            .metadata(model_type, self.network.to_json(), accuracy);

        self.env.models.fuel.install(outcome.model);
        Ok(TrainedModel {
            metadata,
            examples: examples.len(),
        })
    }
}
