//! Core data models for the voyage predictor
//!
//! Historical records mirror what the surrounding service persists; the
//! feature and output types are the typed boundary of the prediction core.

use crate::error::PredictorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A cargo ship in the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: String,
    pub name: String,
    /// Cargo capacity in tons
    pub capacity: f64,
}

/// A planned or completed voyage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voyage {
    pub id: String,
    pub ship_id: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub distance: f64,
    pub cargo_weight: f64,
    pub cargo_type: Option<String>,
    pub weather_severity: f64,
    pub wind_speed: f64,
    pub departure_date: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub predicted_fuel_usage: Option<f64>,
    pub predicted_duration: Option<f64>,
    pub optimal_speed: Option<f64>,
}

impl Voyage {
    /// Feature vector describing this voyage
    pub fn features(&self) -> VoyageFeatures {
        VoyageFeatures {
            cargo_weight: self.cargo_weight,
            distance: self.distance,
            weather_severity: self.weather_severity,
            wind_speed: self.wind_speed,
        }
    }
}

/// Post-voyage feedback with the observed outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyageFeedback {
    pub id: String,
    pub voyage_id: String,
    pub actual_fuel_usage: Option<f64>,
    /// Actual duration in hours
    pub actual_duration: Option<f64>,
    pub fuel_accuracy: Option<f64>,
    pub duration_accuracy: Option<f64>,
    pub route_optimization_score: u8,
    pub submitted_at: DateTime<Utc>,
}

/// A fuel consumption log entry recorded during a voyage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLog {
    pub id: String,
    pub ship_id: String,
    pub voyage_id: String,
    pub timestamp: DateTime<Utc>,
    pub fuel_type: String,
    pub fuel_usage: f64,
    pub fuel_cost: f64,
}

/// A maintenance event for a ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: String,
    pub ship_id: String,
    pub maintained_at: DateTime<Utc>,
    pub next_due: Option<DateTime<Utc>>,
    pub voyage_ready_date: Option<DateTime<Utc>>,
    pub score: Option<u8>,
    pub description: Option<String>,
}

/// Voyage joined with all of its feedback submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageWithFeedback {
    pub voyage: Voyage,
    pub feedbacks: Vec<VoyageFeedback>,
}

/// Voyage joined with its fuel logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageWithFuelLogs {
    pub voyage: Voyage,
    pub fuel_logs: Vec<FuelLog>,
}

impl VoyageWithFuelLogs {
    pub fn total_fuel_usage(&self) -> f64 {
        self.fuel_logs.iter().map(|log| log.fuel_usage).sum()
    }
}

/// Maintenance record joined with the ship's recent voyages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceWithHistory {
    pub record: MaintenanceRecord,
    /// Voyages of the same ship departing inside the requested window
    pub recent_voyages: Vec<VoyageWithFuelLogs>,
}

/// Complete history of one ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipHistory {
    pub ship_id: String,
    pub voyages: Vec<VoyageWithFuelLogs>,
    pub maintenance: Vec<MaintenanceRecord>,
}

/// Fixed-order voyage feature vector: cargo weight, distance, weather severity, wind speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoyageFeatures {
    pub cargo_weight: f64,
    pub distance: f64,
    pub weather_severity: f64,
    pub wind_speed: f64,
}

impl VoyageFeatures {
    pub const NAMES: [&'static str; 4] = ["cargo_weight", "distance", "weather_severity", "wind_speed"];

    pub fn new(cargo_weight: f64, distance: f64, weather_severity: f64, wind_speed: f64) -> Self {
        Self {
            cargo_weight,
            distance,
            weather_severity,
            wind_speed,
        }
    }

    /// Reject fields the model cannot evaluate
    pub fn validate(&self) -> Result<(), PredictorError> {
        for (name, value) in Self::NAMES.iter().zip(self.to_array()) {
            check_model_input(name, value)?;
        }
        Ok(())
    }

    pub fn to_array(&self) -> [f64; 4] {
        [
            self.cargo_weight,
            self.distance,
            self.weather_severity,
            self.wind_speed,
        ]
    }

    pub(crate) fn to_f32(&self) -> [f32; 4] {
        self.to_array().map(|v| v as f32)
    }
}

/// Fixed-order maintenance feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceFeatures {
    pub total_voyages_last_6m: f64,
    pub avg_fuel_usage_per_voyage: f64,
    pub days_since_last_maintenance: f64,
}

impl MaintenanceFeatures {
    pub const NAMES: [&'static str; 3] = [
        "total_voyages_last_6m",
        "avg_fuel_usage_per_voyage",
        "days_since_last_maintenance",
    ];

    pub fn new(
        total_voyages_last_6m: f64,
        avg_fuel_usage_per_voyage: f64,
        days_since_last_maintenance: f64,
    ) -> Self {
        Self {
            total_voyages_last_6m,
            avg_fuel_usage_per_voyage,
            days_since_last_maintenance,
        }
    }

    pub fn validate(&self) -> Result<(), PredictorError> {
        for (name, value) in Self::NAMES.iter().zip(self.to_array()) {
            check_model_input(name, value)?;
        }
        Ok(())
    }

    pub fn to_array(&self) -> [f64; 3] {
        [
            self.total_voyages_last_6m,
            self.avg_fuel_usage_per_voyage,
            self.days_since_last_maintenance,
        ]
    }

    pub(crate) fn to_f32(&self) -> [f32; 3] {
        self.to_array().map(|v| v as f32)
    }
}

/// Inputs are narrowed to `f32` before evaluation, so values outside its range
/// would reach the network as infinities
fn check_model_input(name: &str, value: f64) -> Result<(), PredictorError> {
    if !value.is_finite() {
        return Err(PredictorError::invalid_input(name, "must be a finite number"));
    }
    if value.abs() > f32::MAX as f64 {
        return Err(PredictorError::invalid_input(name, "is out of range"));
    }
    Ok(())
}

/// Labeled example for the fuel task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelExample {
    pub features: VoyageFeatures,
    pub actual_fuel_usage: f64,
}

/// Labeled example for the route task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteExample {
    pub features: VoyageFeatures,
    /// Actual duration in hours
    pub actual_duration: f64,
}

impl RouteExample {
    /// Average speed implied by the observed duration
    pub fn implied_speed(&self) -> f64 {
        self.features.distance / self.actual_duration
    }
}

/// Labeled example for the maintenance task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceExample {
    pub features: MaintenanceFeatures,
    pub next_due_days: f64,
    /// Days from next-due to voyage-ready; negative when voyage-ready comes first
    pub voyage_ready_offset_days: f64,
    pub score: f64,
}

/// Prediction task a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    FuelPredictor,
    RouteOptimizer,
    MaintenanceForecaster,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [
        ModelType::FuelPredictor,
        ModelType::RouteOptimizer,
        ModelType::MaintenanceForecaster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::FuelPredictor => "fuel_predictor",
            ModelType::RouteOptimizer => "route_optimizer",
            ModelType::MaintenanceForecaster => "maintenance_forecaster",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fuel_predictor" => Ok(ModelType::FuelPredictor),
            "route_optimizer" => Ok(ModelType::RouteOptimizer),
            "maintenance_forecaster" => Ok(ModelType::MaintenanceForecaster),
            other => Err(PredictorError::invalid_input(
                "model_type",
                format!("unknown model type '{}'", other),
            )),
        }
    }
}

/// Registry row describing one trained model generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub id: Uuid,
    pub model_type: ModelType,
    pub version: String,
    /// Architecture and hyperparameters
    pub parameters: serde_json::Value,
    /// In-sample accuracy, 1 - MAE / mean(label); negative for fits worse than the mean
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub is_active: bool,
}

/// One leg of the speed schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSegment {
    pub segment: u8,
    pub distance: f64,
    pub speed: f64,
}

/// Route prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Hours
    pub predicted_duration: f64,
    pub optimal_speed: f64,
    pub speed_schedule: Vec<SpeedSegment>,
}

/// Maintenance prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceForecast {
    pub next_due_date: DateTime<Utc>,
    /// Offset from the prediction time, not from `next_due_date`
    pub voyage_ready_date: DateTime<Utc>,
    pub score: u8,
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
