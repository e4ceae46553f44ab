use super::{evaluate, ForecastPolicy, PredictionEnv, Predictor};
use crate::error::{PredictorError, Result};
use crate::models::{MaintenanceFeatures, MaintenanceForecast, ModelType};

/// Maintenance schedule prediction with per-field fallbacks
pub struct MaintenancePredictor {
    env: PredictionEnv,
    policy: ForecastPolicy,
}

impl MaintenancePredictor {
    pub fn new(env: PredictionEnv) -> Self {
        Self::with_policy(env, ForecastPolicy::new())
    }

    pub fn with_policy(env: PredictionEnv, policy: ForecastPolicy) -> Self {
        Self { env, policy }
    }
}

impl Predictor for MaintenancePredictor {
    type Input = MaintenanceFeatures;
    type Output = MaintenanceForecast;

    fn model_type(&self) -> ModelType {
        ModelType::MaintenanceForecaster
    }

    fn predict(&self, features: &MaintenanceFeatures) -> Result<MaintenanceForecast> {
        let model_type = self.model_type();
        self.env.observe(model_type, || {
            features.validate()?;
            let model = self
                .env
                .models
                .maintenance
                .get()
                .ok_or(PredictorError::ModelNotTrained { model_type })?;

            let outputs = evaluate("maintenance_prediction", &model, &features.to_f32())?;
            let raw = [outputs[0], outputs[1], outputs[2]];
            let (forecast, fallbacks) = self.policy.resolve(raw, self.env.clock.now())?;
            for fallback in &fallbacks {
                self.env.metrics.inc_maintenance_fallback(fallback.field);
                self.env.logger.log_maintenance_fallback(
                    fallback.field,
                    fallback.raw,
                    fallback.substituted,
                );
            }
            Ok(forecast)
        })
    }
}
