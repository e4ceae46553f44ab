use super::{evaluate, require_finite, PredictionEnv, Predictor};
use crate::error::{PredictorError, Result};
use crate::models::{ModelType, VoyageFeatures};
use crate::training::round_to;

/// Fuel usage prediction
///
/// No clamping is applied; a non-finite model output is an error rather
/// than a silent zero.
pub struct FuelPredictor {
    env: PredictionEnv,
}

impl FuelPredictor {
    pub fn new(env: PredictionEnv) -> Self {
        Self { env }
    }
}

impl Predictor for FuelPredictor {
    type Input = VoyageFeatures;
    type Output = f64;

    fn model_type(&self) -> ModelType {
        ModelType::FuelPredictor
    }

    fn predict(&self, features: &VoyageFeatures) -> Result<f64> {
        let model_type = self.model_type();
        self.env.observe(model_type, || {
            features.validate()?;
            let model = self
                .env
                .models
                .fuel
                .get()
                .ok_or(PredictorError::ModelNotTrained { model_type })?;
            let outputs = evaluate("fuel_prediction", &model, &features.to_f32())?;
            let fuel = require_finite("fuel_prediction", "fuel usage", outputs[0])?;
            Ok(round_to(fuel, 2))
        })
    }
}
