//! Prediction engine facade
//!
//! Wires one store, a clock and the shared model context into the trainers,
//! orchestrator, predictors and planner, and persists the records produced
//! by planning, feedback and maintenance alerts.

use crate::clock::Clock;
use crate::context::ModelContext;
use crate::error::{PredictorError, Result};
use crate::features::FeatureAggregator;
use crate::feedback::{score_feedback, FeedbackRequest};
use crate::models::{
    new_id, MaintenanceFeatures, MaintenanceForecast, MaintenanceRecord, ModelMetadata, ModelType,
    RoutePlan, VoyageFeatures, VoyageFeedback,
};
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::planner::{VoyagePlan, VoyagePlanRequest, VoyagePlanner};
use crate::predictor::{
    FallbackConfig, ForecastPolicy, FuelPredictor, MaintenancePredictor, PredictionEnv, Predictor,
    RoutePredictor,
};
use crate::registry::{ModelRegistry, VersionStamper};
use crate::regression::NetworkSpec;
use crate::store::{HistoricalStore, HistoryWriter, RegistryStore};
use crate::training::{
    fuel_network, maintenance_network, route_network, FuelTrainer, MaintenanceTrainer,
    RouteTrainer, TaskTrainer, TrainingEnv, TrainingOrchestrator, TrainingReport,
};
use std::sync::Arc;
use tracing::info;

pub const ALERT_DESCRIPTION: &str = "AI-suggested maintenance schedule";

/// Tunables for the networks and the maintenance fallbacks
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub fuel_network: NetworkSpec,
    pub route_network: NetworkSpec,
    pub maintenance_network: NetworkSpec,
    pub fallback: FallbackConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fuel_network: fuel_network(),
            route_network: route_network(),
            maintenance_network: maintenance_network(),
            fallback: FallbackConfig::default(),
        }
    }
}

pub struct PredictionEngine {
    history: Arc<dyn HistoricalStore>,
    writer: Arc<dyn HistoryWriter>,
    registry: Arc<ModelRegistry>,
    models: Arc<ModelContext>,
    aggregator: Arc<FeatureAggregator>,
    clock: Arc<dyn Clock>,
    orchestrator: TrainingOrchestrator,
    fuel: Arc<FuelPredictor>,
    route: Arc<RoutePredictor>,
    maintenance: MaintenancePredictor,
    planner: VoyagePlanner,
}

impl PredictionEngine {
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>, instance: &str) -> Self
    where
        S: HistoricalStore + HistoryWriter + RegistryStore + 'static,
    {
        Self::with_options(store, clock, instance, EngineOptions::default())
    }

    pub fn with_options<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        instance: &str,
        options: EngineOptions,
    ) -> Self
    where
        S: HistoricalStore + HistoryWriter + RegistryStore + 'static,
    {
        let history: Arc<dyn HistoricalStore> = store.clone();
        let writer: Arc<dyn HistoryWriter> = store.clone();
        let registry = Arc::new(ModelRegistry::new(store));
        let models = Arc::new(ModelContext::new());
        let aggregator = Arc::new(FeatureAggregator::new(history.clone(), clock.clone()));
        let metrics = PredictorMetrics::new();
        let logger = StructuredLogger::new(instance);

        let training = TrainingEnv {
            aggregator: aggregator.clone(),
            models: models.clone(),
            clock: clock.clone(),
            versions: Arc::new(VersionStamper::new()),
        };
        let trainers: Vec<Box<dyn TaskTrainer>> = vec![
            Box::new(FuelTrainer::with_network(training.clone(), options.fuel_network)),
            Box::new(RouteTrainer::with_network(training.clone(), options.route_network)),
            Box::new(MaintenanceTrainer::with_network(
                training,
                options.maintenance_network,
            )),
        ];
        let orchestrator = TrainingOrchestrator::new(
            trainers,
            registry.clone(),
            clock.clone(),
            logger.clone(),
            metrics.clone(),
        );

        let prediction = PredictionEnv {
            models: models.clone(),
            clock: clock.clone(),
            metrics,
            logger,
        };
        let fuel = Arc::new(FuelPredictor::new(prediction.clone()));
        let route = Arc::new(RoutePredictor::new(prediction.clone()));
        let maintenance = MaintenancePredictor::with_policy(
            prediction,
            ForecastPolicy::with_config(options.fallback),
        );
        let planner = VoyagePlanner::new(route.clone(), fuel.clone(), clock.clone());

        Self {
            history,
            writer,
            registry,
            models,
            aggregator,
            clock,
            orchestrator,
            fuel,
            route,
            maintenance,
            planner,
        }
    }

    /// Train every task in order; blocks for the duration of the fits
    pub fn train_all(&self) -> TrainingReport {
        self.orchestrator.train_all()
    }

    pub fn predict_fuel_usage(&self, features: &VoyageFeatures) -> Result<f64> {
        self.fuel.predict(features)
    }

    pub fn predict_route(&self, features: &VoyageFeatures) -> Result<RoutePlan> {
        self.route.predict(features)
    }

    pub fn predict_maintenance(&self, features: &MaintenanceFeatures) -> Result<MaintenanceForecast> {
        self.maintenance.predict(features)
    }

    /// Plan a voyage and persist it with its predictions
    pub fn plan_voyage(&self, request: &VoyagePlanRequest) -> Result<VoyagePlan> {
        let (plan, voyage) = self.planner.plan(request)?;
        self.writer.insert_voyage(&voyage)?;
        info!(
            voyage_id = %voyage.id,
            ship_id = %voyage.ship_id,
            predicted_duration = plan.predicted_duration,
            predicted_fuel_usage = plan.predicted_fuel_usage,
            "Voyage planned"
        );
        Ok(plan)
    }

    /// Score and persist feedback for a recorded voyage
    pub fn record_feedback(&self, request: &FeedbackRequest) -> Result<VoyageFeedback> {
        let voyage = self
            .history
            .voyage(&request.voyage_id)?
            .ok_or_else(|| PredictorError::VoyageNotFound {
                voyage_id: request.voyage_id.clone(),
            })?;
        let feedback = score_feedback(&voyage, request, self.clock.now())?;
        self.writer.insert_feedback(&feedback)?;
        Ok(feedback)
    }

    /// Forecast the next maintenance of a ship from its history and persist it
    pub fn maintenance_alert(&self, ship_id: &str) -> Result<MaintenanceRecord> {
        let features = self.aggregator.maintenance_features_for_ship(ship_id)?;
        let forecast = self.maintenance.predict(&features)?;

        let record = MaintenanceRecord {
            id: new_id(),
            ship_id: ship_id.to_string(),
            maintained_at: self.clock.now(),
            next_due: Some(forecast.next_due_date),
            voyage_ready_date: Some(forecast.voyage_ready_date),
            score: Some(forecast.score),
            description: Some(ALERT_DESCRIPTION.to_string()),
        };
        self.writer.insert_maintenance_record(&record)?;
        info!(
            ship_id = %ship_id,
            next_due = %forecast.next_due_date,
            score = forecast.score,
            "Maintenance alert recorded"
        );
        Ok(record)
    }

    pub fn list_models(
        &self,
        model_type: Option<ModelType>,
        active_only: bool,
    ) -> Result<Vec<ModelMetadata>> {
        self.registry.list(model_type, active_only)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn models(&self) -> &ModelContext {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn engine() -> PredictionEngine {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        PredictionEngine::new(Arc::new(InMemoryStore::new()), clock, "test")
    }

    #[test]
    fn test_untrained_engine_rejects_predictions() {
        let engine = engine();
        assert!(!engine.models().fuel.is_loaded());
        assert!(matches!(
            engine.predict_fuel_usage(&VoyageFeatures::new(1.0, 1.0, 0.1, 1.0)),
            Err(PredictorError::ModelNotTrained { .. })
        ));
    }

    #[test]
    fn test_feedback_for_unknown_voyage() {
        let result = engine().record_feedback(&FeedbackRequest {
            voyage_id: "missing".to_string(),
            actual_fuel_usage: Some(10.0),
            actual_duration: None,
        });
        assert!(matches!(result, Err(PredictorError::VoyageNotFound { .. })));
    }

    #[test]
    fn test_alert_requires_voyage_history() {
        assert!(matches!(
            engine().maintenance_alert("ship-unknown"),
            Err(PredictorError::NoVoyageHistory { .. })
        ));
    }

    #[test]
    fn test_training_on_empty_store_reports_every_task() {
        let engine = engine();
        let report = engine.train_all();
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failed_count(), 3);
        assert!(engine.list_models(None, false).unwrap().is_empty());
    }
}
