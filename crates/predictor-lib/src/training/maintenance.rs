use super::{
    feature_matrix, fit_task, in_sample_accuracy, label_matrix, TaskTrainer, TrainedModel,
    TrainingEnv,
};
use crate::error::{PredictorError, Result};
use crate::models::ModelType;
use crate::regression::{NetworkSpec, DEFAULT_LEARNING_RATE};

/// 3 -> 32 -> 16 -> 3 over (next due days, voyage-ready offset, score)
pub fn maintenance_network() -> NetworkSpec {
    NetworkSpec {
        input_features: 3,
        layers: vec![32, 16, 3],
        epochs: 100,
        batch_size: 16,
        validation_split: 0.2,
        shuffle: true,
        learning_rate: DEFAULT_LEARNING_RATE,
    }
}

/// Trains the joint maintenance forecaster
///
/// Accuracy is reported on the next-due-days output only: the three labels
/// have incomparable scales and a blended MAE would be dominated by days.
pub struct MaintenanceTrainer {
    env: TrainingEnv,
    network: NetworkSpec,
}

impl MaintenanceTrainer {
    pub fn new(env: TrainingEnv) -> Self {
        Self::with_network(env, maintenance_network())
    }

    pub fn with_network(env: TrainingEnv, network: NetworkSpec) -> Self {
        Self { env, network }
    }
}

impl TaskTrainer for MaintenanceTrainer {
    fn model_type(&self) -> ModelType {
        ModelType::MaintenanceForecaster
    }

    fn train(&self) -> Result<TrainedModel> {
        let model_type = self.model_type();
        let examples = self.env.aggregator.maintenance_training_data()?;
        if examples.is_empty() {
            return Err(PredictorError::InsufficientData { model_type });
        }

        let rows: Vec<[f32; 3]> = examples.iter().map(|e| e.features.to_f32()).collect();
        let next_due: Vec<f64> = examples.iter().map(|e| e.next_due_days).collect();
        let offsets: Vec<f64> = examples.iter().map(|e| e.voyage_ready_offset_days).collect();
        let scores: Vec<f64> = examples.iter().map(|e| e.score).collect();
        let inputs = feature_matrix(&rows);
        let targets = label_matrix(&[
            next_due.as_slice(),
            offsets.as_slice(),
            scores.as_slice(),
        ]);

        let outcome = fit_task(model_type, &self.network, &inputs, &targets)?;
        let accuracy = in_sample_accuracy(model_type, &outcome.model, &inputs, &next_due, 0)?;
        let metadata = self
            .env
            .metadata(model_type, self.network.to_json(), accuracy);

        self.env.models.maintenance.install(outcome.model);
        Ok(TrainedModel {
            metadata,
            examples: examples.len(),
        })
    }
}
