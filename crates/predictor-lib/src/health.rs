//! Component health and readiness tracking
//!
//! The service reports not-ready until the startup training sequence has
//! finished; a task that failed to train leaves its model component degraded.

use crate::training::{TaskStatus, TrainingReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health of one component, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, with reduced capability
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            checked_at: Utc::now(),
        }
    }
}

/// Body of `/healthz`; the overall status is the worst component status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Names of the tracked components
pub mod components {
    use crate::models::ModelType;

    pub const STORE: &str = "store";
    pub const TRAINING: &str = "training";
    pub const FUEL_MODEL: &str = "fuel_model";
    pub const ROUTE_MODEL: &str = "route_model";
    pub const MAINTENANCE_MODEL: &str = "maintenance_model";

    /// Component tracking the in-memory model of a task
    pub fn for_model(model_type: ModelType) -> &'static str {
        match model_type {
            ModelType::FuelPredictor => FUEL_MODEL,
            ModelType::RouteOptimizer => ROUTE_MODEL,
            ModelType::MaintenanceForecaster => MAINTENANCE_MODEL,
        }
    }
}

#[derive(Debug, Default)]
struct HealthState {
    components: BTreeMap<String, ComponentHealth>,
    startup_complete: bool,
}

impl HealthState {
    fn overall(&self) -> ComponentStatus {
        self.components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Shared health view of the service process
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<HealthState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a component as healthy
    pub async fn register(&self, name: &str) {
        self.mark(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.mark(name, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.mark(name, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    async fn mark(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        self.state
            .write()
            .await
            .components
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }

    /// Reflect a training run: trained tasks become healthy, failed ones degraded
    pub async fn apply_training_report(&self, report: &TrainingReport) {
        let mut state = self.state.write().await;
        for outcome in &report.outcomes {
            let health = match &outcome.status {
                TaskStatus::Trained { .. } => ComponentHealth::new(ComponentStatus::Healthy, None),
                TaskStatus::Failed { message, .. } => {
                    ComponentHealth::new(ComponentStatus::Degraded, Some(message.clone()))
                }
            };
            state
                .components
                .insert(components::for_model(outcome.model_type).to_string(), health);
        }

        let training = match report.failed_count() {
            0 => ComponentHealth::new(ComponentStatus::Healthy, None),
            failed => ComponentHealth::new(
                ComponentStatus::Degraded,
                Some(format!("{} training task(s) failed", failed)),
            ),
        };
        state
            .components
            .insert(components::TRAINING.to_string(), training);
    }

    /// Flip once the startup training sequence has finished
    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.startup_complete = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: state.overall(),
            components: state.components.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let reason = if !state.startup_complete {
            Some("Startup training has not completed")
        } else if state.overall() == ComponentStatus::Unhealthy {
            Some("Critical component unhealthy")
        } else {
            None
        };
        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelType;
    use crate::training::TaskOutcome;

    fn outcome(model_type: ModelType, failure: Option<&str>) -> TaskOutcome {
        let status = match failure {
            None => TaskStatus::Trained {
                version: "v1".to_string(),
                accuracy: 0.91,
                examples: 40,
            },
            Some(message) => TaskStatus::Failed {
                error_kind: "insufficient_data".to_string(),
                message: message.to_string(),
            },
        };
        TaskOutcome {
            model_type,
            status,
            duration_ms: 5,
        }
    }

    #[tokio::test]
    async fn test_empty_registry_is_healthy_but_not_ready() {
        let registry = HealthRegistry::new();
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[test]
    fn test_model_components() {
        assert_eq!(components::for_model(ModelType::FuelPredictor), "fuel_model");
        assert_eq!(components::for_model(ModelType::RouteOptimizer), "route_model");
        assert_eq!(
            components::for_model(ModelType::MaintenanceForecaster),
            "maintenance_model"
        );
    }

    #[tokio::test]
    async fn test_worst_component_wins() {
        let registry = HealthRegistry::new();
        registry.register(components::STORE).await;
        registry.register(components::ROUTE_MODEL).await;

        registry
            .set_degraded(components::ROUTE_MODEL, "no training examples available")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);

        registry.set_unhealthy(components::STORE, "database is locked").await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(
            health.components[components::STORE].message.as_deref(),
            Some("database is locked")
        );
    }

    #[tokio::test]
    async fn test_ready_after_startup_unless_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register(components::STORE).await;
        registry.set_ready(true).await;
        assert!(registry.readiness().await.ready);

        registry.set_unhealthy(components::STORE, "Failed").await;
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Critical component unhealthy"));
    }

    #[tokio::test]
    async fn test_training_report_marks_failed_models_degraded() {
        let registry = HealthRegistry::new();
        let report = TrainingReport {
            started_at: Utc::now(),
            outcomes: vec![
                outcome(ModelType::FuelPredictor, None),
                outcome(
                    ModelType::MaintenanceForecaster,
                    Some("no training examples available"),
                ),
            ],
        };
        registry.apply_training_report(&report).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::FUEL_MODEL].status,
            ComponentStatus::Healthy
        );
        let maintenance = &health.components[components::MAINTENANCE_MODEL];
        assert_eq!(maintenance.status, ComponentStatus::Degraded);
        assert_eq!(
            maintenance.message.as_deref(),
            Some("no training examples available")
        );
        assert_eq!(
            health.components[components::TRAINING].message.as_deref(),
            Some("1 training task(s) failed")
        );
    }

    #[tokio::test]
    async fn test_successful_retrain_clears_degradation() {
        let registry = HealthRegistry::new();
        let failed = TrainingReport {
            started_at: Utc::now(),
            outcomes: vec![outcome(ModelType::RouteOptimizer, Some("no data"))],
        };
        registry.apply_training_report(&failed).await;

        let recovered = TrainingReport {
            started_at: Utc::now(),
            outcomes: vec![outcome(ModelType::RouteOptimizer, None)],
        };
        registry.apply_training_report(&recovered).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components[components::ROUTE_MODEL].message.is_none());
    }
}
