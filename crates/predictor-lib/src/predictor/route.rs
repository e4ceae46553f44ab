use super::{evaluate, require_finite, PredictionEnv, Predictor};
use crate::error::{PredictorError, Result};
use crate::models::{ModelType, RoutePlan, SpeedSegment, VoyageFeatures};
use rand::Rng;
use std::ops::RangeInclusive;

/// Number of equal-distance legs in a speed schedule
pub const SCHEDULE_SEGMENTS: u8 = 4;

/// Per-segment multiplier range applied to the optimal speed
pub const SPEED_JITTER: RangeInclusive<f64> = 0.95..=1.05;

/// Duration, optimal speed and a jittered four-leg speed schedule
///
/// Segment speeds are drawn independently on every call, so identical
/// inputs do not produce identical schedules.
pub struct RoutePredictor {
    env: PredictionEnv,
}

impl RoutePredictor {
    pub fn new(env: PredictionEnv) -> Self {
        Self { env }
    }

    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        features: &VoyageFeatures,
        rng: &mut R,
    ) -> Result<RoutePlan> {
        let model_type = ModelType::RouteOptimizer;
        self.env.observe(model_type, || {
            features.validate()?;
            let models = self
                .env
                .models
                .route
                .get()
                .ok_or(PredictorError::ModelNotTrained { model_type })?;

            let input = features.to_f32();
            let duration = evaluate("route_prediction", &models.duration, &input)?[0];
            let speed = evaluate("route_prediction", &models.speed, &input)?[0];
            let predicted_duration = require_finite("route_prediction", "duration", duration)?;
            let optimal_speed = require_finite("route_prediction", "optimal speed", speed)?;

            Ok(RoutePlan {
                predicted_duration,
                optimal_speed,
                speed_schedule: speed_schedule(features.distance, optimal_speed, rng),
            })
        })
    }
}

impl Predictor for RoutePredictor {
    type Input = VoyageFeatures;
    type Output = RoutePlan;

    fn model_type(&self) -> ModelType {
        ModelType::RouteOptimizer
    }

    fn predict(&self, features: &VoyageFeatures) -> Result<RoutePlan> {
        self.predict_with_rng(features, &mut rand::rng())
    }
}

fn speed_schedule<R: Rng + ?Sized>(
    distance: f64,
    optimal_speed: f64,
    rng: &mut R,
) -> Vec<SpeedSegment> {
    let segment_distance = distance / f64::from(SCHEDULE_SEGMENTS);
    (1..=SCHEDULE_SEGMENTS)
        .map(|segment| SpeedSegment {
            segment,
            distance: segment_distance,
            speed: optimal_speed * rng.random_range(SPEED_JITTER),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouteModels;
    use crate::predictor::test_support::{constant_model, env};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trained(duration: f32, speed: f32) -> RoutePredictor {
        let env = env();
        env.models.route.install(RouteModels {
            duration: constant_model(4, &[duration]),
            speed: constant_model(4, &[speed]),
        });
        RoutePredictor::new(env)
    }

    #[test]
    fn test_untrained_model_fails() {
        let predictor = RoutePredictor::new(env());
        let features = VoyageFeatures::new(10_000.0, 900.0, 0.3, 12.0);
        assert!(matches!(
            predictor.predict(&features),
            Err(PredictorError::ModelNotTrained {
                model_type: ModelType::RouteOptimizer
            })
        ));
    }

    #[test]
    fn test_schedule_bounds() {
        let predictor = trained(96.0, 14.5);
        let mut rng = StdRng::seed_from_u64(7);

        for distance in [0.0, 1.0, 333.3, 2_500.0, 12_345.67] {
            let features = VoyageFeatures::new(25_000.0, distance, 0.5, 20.0);
            let plan = predictor.predict_with_rng(&features, &mut rng).unwrap();

            assert_eq!(plan.speed_schedule.len(), 4);
            let total: f64 = plan.speed_schedule.iter().map(|s| s.distance).sum();
            assert!((total - distance).abs() < 1e-9);
            for (i, segment) in plan.speed_schedule.iter().enumerate() {
                assert_eq!(segment.segment as usize, i + 1);
                assert!(segment.speed >= plan.optimal_speed * 0.95 - 1e-9);
                assert!(segment.speed <= plan.optimal_speed * 1.05 + 1e-9);
            }
        }
    }

    #[test]
    fn test_schedule_band_for_negative_speed() {
        let predictor = trained(96.0, -40.0);
        let mut rng = StdRng::seed_from_u64(11);
        let plan = predictor
            .predict_with_rng(&VoyageFeatures::new(25_000.0, 800.0, 0.5, 20.0), &mut rng)
            .unwrap();

        for segment in &plan.speed_schedule {
            assert!(segment.speed >= -40.0 * 1.05 - 1e-9);
            assert!(segment.speed <= -40.0 * 0.95 + 1e-9);
        }
    }

    #[test]
    fn test_outputs_passed_through() {
        let plan = trained(96.0, 14.5)
            .predict(&VoyageFeatures::new(25_000.0, 1_400.0, 0.5, 20.0))
            .unwrap();
        assert_eq!(plan.predicted_duration, 96.0);
        assert_eq!(plan.optimal_speed, 14.5);
    }

    #[test]
    fn test_non_finite_speed_is_numeric_instability() {
        let result = trained(96.0, f32::INFINITY)
            .predict(&VoyageFeatures::new(25_000.0, 1_400.0, 0.5, 20.0));
        assert!(matches!(
            result,
            Err(PredictorError::NumericInstability { .. })
        ));
    }

    #[test]
    fn test_negative_distance_split_evenly() {
        let plan = trained(1.0, 1.0)
            .predict(&VoyageFeatures::new(1.0, -5.0, 0.1, 1.0))
            .unwrap();
        assert!(plan.speed_schedule.iter().all(|s| s.distance == -1.25));
    }
}
