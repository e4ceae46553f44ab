//! Voyage prediction core
//!
//! This crate provides the predictive model lifecycle for a cargo fleet:
//! - Feature aggregation from historical voyages and maintenance records
//! - Fuel, route and maintenance regression training
//! - A model registry with one active row per model type
//! - Prediction services with output fallback policies
//! - Voyage planning, feedback scoring and synthetic seeding
//! - Health checks and observability

pub mod clock;
pub mod context;
pub mod error;
pub mod features;
pub mod feedback;
pub mod health;
pub mod models;
pub mod observability;
pub mod planner;
pub mod predictor;
pub mod registry;
pub mod regression;
pub mod seed;
pub mod service;
pub mod store;
pub mod training;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{PredictorError, StoreError};
pub use feedback::FeedbackRequest;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use planner::{VoyagePlan, VoyagePlanRequest};
pub use service::{EngineOptions, PredictionEngine};
pub use store::{HistoricalStore, HistoryWriter, InMemoryStore, RegistryStore, SqliteStore};
pub use training::{TaskOutcome, TaskStatus, TrainingReport};
