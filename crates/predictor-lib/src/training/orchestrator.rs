use super::TaskTrainer;
use crate::clock::Clock;
use crate::models::ModelType;
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::registry::ModelRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Result of one task within a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub model_type: ModelType,
    #[serde(flatten)]
    pub status: TaskStatus,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Trained {
        version: String,
        accuracy: f64,
        examples: usize,
    },
    Failed {
        error_kind: String,
        message: String,
    },
}

/// Per-task outcome log of a `train_all` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<TaskOutcome>,
}

impl TrainingReport {
    pub fn outcome(&self, model_type: ModelType) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.model_type == model_type)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o.status, TaskStatus::Trained { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TaskStatus::Failed { .. }))
            .count()
    }
}

/// Runs every trainer in order and activates each success in the registry
///
/// A failing task is logged and skipped; it never stops the tasks after it
/// and never touches registry rows of other model types.
pub struct TrainingOrchestrator {
    trainers: Vec<Box<dyn TaskTrainer>>,
    registry: Arc<ModelRegistry>,
    clock: Arc<dyn Clock>,
    logger: StructuredLogger,
    metrics: PredictorMetrics,
}

impl TrainingOrchestrator {
    pub fn new(
        trainers: Vec<Box<dyn TaskTrainer>>,
        registry: Arc<ModelRegistry>,
        clock: Arc<dyn Clock>,
        logger: StructuredLogger,
        metrics: PredictorMetrics,
    ) -> Self {
        Self {
            trainers,
            registry,
            clock,
            logger,
            metrics,
        }
    }

    pub fn train_all(&self) -> TrainingReport {
        let started_at = self.clock.now();
        let outcomes = self
            .trainers
            .iter()
            .map(|trainer| self.run_task(trainer.as_ref()))
            .collect();
        TrainingReport {
            started_at,
            outcomes,
        }
    }

    fn run_task(&self, trainer: &dyn TaskTrainer) -> TaskOutcome {
        let model_type = trainer.model_type();
        self.logger.log_training_started(model_type);
        let start = Instant::now();

        // Activation only follows a completed, scored fit
        let result = trainer.train().and_then(|trained| {
            let active = self.registry.activate(&trained.metadata)?;
            Ok((active, trained.examples))
        });

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        self.metrics
            .observe_training(model_type, elapsed.as_secs_f64(), result.is_ok());

        let status = match result {
            Ok((active, examples)) => {
                self.logger.log_model_trained(
                    model_type,
                    &active.version,
                    active.accuracy,
                    examples,
                    duration_ms,
                );
                self.logger.log_model_activated(model_type, &active.version);
                self.metrics
                    .set_active_model(model_type, &active.version, active.accuracy, examples);
                TaskStatus::Trained {
                    version: active.version,
                    accuracy: active.accuracy,
                    examples,
                }
            }
            Err(e) => {
                let message = e.to_string();
                self.logger
                    .log_training_failed(model_type, e.kind(), &message);
                TaskStatus::Failed {
                    error_kind: e.kind().to_string(),
                    message,
                }
            }
        };

        TaskOutcome {
            model_type,
            status,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{PredictorError, Result};
    use crate::models::ModelMetadata;
    use crate::store::{InMemoryStore, RegistryStore};
    use crate::training::TrainedModel;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct StubTrainer {
        model_type: ModelType,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubTrainer {
        fn new(model_type: ModelType, fail: bool) -> Self {
            Self {
                model_type,
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TaskTrainer for StubTrainer {
        fn model_type(&self) -> ModelType {
            self.model_type
        }

        fn train(&self) -> Result<TrainedModel> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PredictorError::InsufficientData {
                    model_type: self.model_type,
                });
            }
            Ok(TrainedModel {
                metadata: ModelMetadata {
                    id: Uuid::new_v4(),
                    model_type: self.model_type,
                    version: format!("v{}", call + 1),
                    parameters: serde_json::json!({}),
                    accuracy: 0.8,
                    trained_at: Utc::now(),
                    is_active: false,
                },
                examples: 10,
            })
        }
    }

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn orchestrator(
        store: Arc<InMemoryStore>,
        trainers: Vec<Box<dyn TaskTrainer>>,
    ) -> TrainingOrchestrator {
        TrainingOrchestrator::new(
            trainers,
            Arc::new(ModelRegistry::new(store)),
            Arc::new(FixedClock(started())),
            StructuredLogger::new("test"),
            PredictorMetrics::new(),
        )
    }

    #[test]
    fn test_failed_task_does_not_stop_siblings() {
        let store = Arc::new(InMemoryStore::new());
        let orchestrator = orchestrator(
            store.clone(),
            vec![
                Box::new(StubTrainer::new(ModelType::FuelPredictor, false)),
                Box::new(StubTrainer::new(ModelType::RouteOptimizer, true)),
                Box::new(StubTrainer::new(ModelType::MaintenanceForecaster, false)),
            ],
        );

        let report = orchestrator.train_all();
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.all_succeeded());

        let route = report.outcome(ModelType::RouteOptimizer).unwrap();
        assert!(matches!(
            &route.status,
            TaskStatus::Failed { error_kind, .. } if error_kind == "insufficient_data"
        ));

        assert!(store.active_model(ModelType::FuelPredictor).unwrap().is_some());
        assert!(store.active_model(ModelType::MaintenanceForecaster).unwrap().is_some());
        assert!(store.active_model(ModelType::RouteOptimizer).unwrap().is_none());
    }

    #[test]
    fn test_report_started_at_comes_from_clock() {
        let orchestrator = orchestrator(
            Arc::new(InMemoryStore::new()),
            vec![Box::new(StubTrainer::new(ModelType::FuelPredictor, false))],
        );
        assert_eq!(orchestrator.train_all().started_at, started());
    }

    #[test]
    fn test_retraining_keeps_single_active_row() {
        let store = Arc::new(InMemoryStore::new());
        let orchestrator = orchestrator(
            store.clone(),
            vec![Box::new(StubTrainer::new(ModelType::FuelPredictor, false))],
        );

        for _ in 0..3 {
            orchestrator.train_all();
        }

        let rows = store.list_models(Some(ModelType::FuelPredictor)).unwrap();
        assert_eq!(rows.len(), 3);
        let active: Vec<_> = rows.iter().filter(|m| m.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].version, "v3");
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let report = TrainingReport {
            started_at: Utc::now(),
            outcomes: vec![TaskOutcome {
                model_type: ModelType::FuelPredictor,
                status: TaskStatus::Trained {
                    version: "v1".to_string(),
                    accuracy: 0.91,
                    examples: 30,
                },
                duration_ms: 1200,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "trained");
        assert_eq!(json["outcomes"][0]["model_type"], "fuel_predictor");
        assert_eq!(json["outcomes"][0]["version"], "v1");
    }
}
