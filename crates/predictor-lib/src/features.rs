//! Training dataset aggregation
//!
//! Flattens historical records into labeled examples for each task. Empty
//! results are not errors here; trainers decide whether empty data is fatal.

use crate::clock::Clock;
use crate::error::{PredictorError, Result};
use crate::models::{
    FuelExample, MaintenanceExample, MaintenanceFeatures, MaintenanceRecord, RouteExample,
};
use crate::store::HistoricalStore;
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;
use tracing::debug;

/// Days since last maintenance assumed when a ship has no earlier record
pub const DEFAULT_DAYS_SINCE_MAINTENANCE: f64 = 180.0;

/// Length of the recent-voyage window
pub const HISTORY_WINDOW_MONTHS: u32 = 6;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Builds labeled datasets and inference features from the historical store
pub struct FeatureAggregator {
    store: Arc<dyn HistoricalStore>,
    clock: Arc<dyn Clock>,
}

impl FeatureAggregator {
    pub fn new(store: Arc<dyn HistoricalStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// One example per feedback row with an actual fuel usage
    pub fn fuel_training_data(&self) -> Result<Vec<FuelExample>> {
        let voyages = self.store.voyages_with_feedback()?;
        let examples: Vec<FuelExample> = voyages
            .iter()
            .flat_map(|entry| {
                let features = entry.voyage.features();
                entry
                    .feedbacks
                    .iter()
                    .filter_map(move |feedback| {
                        feedback.actual_fuel_usage.map(|actual_fuel_usage| FuelExample {
                            features,
                            actual_fuel_usage,
                        })
                    })
            })
            .collect();
        debug!(examples = examples.len(), "Aggregated fuel training data");
        Ok(examples)
    }

    /// One example per feedback row with an actual duration
    pub fn route_training_data(&self) -> Result<Vec<RouteExample>> {
        let voyages = self.store.voyages_with_feedback()?;
        let examples: Vec<RouteExample> = voyages
            .iter()
            .flat_map(|entry| {
                let features = entry.voyage.features();
                entry
                    .feedbacks
                    .iter()
                    .filter_map(move |feedback| {
                        feedback.actual_duration.map(|actual_duration| RouteExample {
                            features,
                            actual_duration,
                        })
                    })
            })
            .collect();
        debug!(examples = examples.len(), "Aggregated route training data");
        Ok(examples)
    }

    /// One example per complete maintenance record whose ship logged fuel
    /// on a voyage inside the recent window
    pub fn maintenance_training_data(&self) -> Result<Vec<MaintenanceExample>> {
        let since = self.window_start();
        let rows = self.store.maintenance_with_history(since)?;

        let mut examples = Vec::new();
        for row in &rows {
            let record = &row.record;
            let (next_due, voyage_ready, score) =
                match (record.next_due, record.voyage_ready_date, record.score) {
                    (Some(next_due), Some(voyage_ready), Some(score)) => {
                        (next_due, voyage_ready, score)
                    }
                    _ => continue,
                };
            if !row.recent_voyages.iter().any(|v| !v.fuel_logs.is_empty()) {
                continue;
            }

            let voyage_count = row.recent_voyages.len() as f64;
            let total_fuel: f64 = row.recent_voyages.iter().map(|v| v.total_fuel_usage()).sum();
            let previous = previous_maintenance(&rows, record);
            let days_since_last = previous
                .map(|at| days_between(at, record.maintained_at))
                .unwrap_or(DEFAULT_DAYS_SINCE_MAINTENANCE);

            examples.push(MaintenanceExample {
                features: MaintenanceFeatures::new(
                    voyage_count,
                    total_fuel / voyage_count,
                    days_since_last,
                ),
                next_due_days: days_between(record.maintained_at, next_due),
                // May be negative; kept as-is
                voyage_ready_offset_days: days_between(next_due, voyage_ready),
                score: f64::from(score),
            });
        }
        debug!(
            records = rows.len(),
            examples = examples.len(),
            "Aggregated maintenance training data"
        );
        Ok(examples)
    }

    /// Inference-time maintenance features for one ship
    ///
    /// Voyage count covers the recent window only, while the fuel average
    /// spans every voyage of the ship.
    pub fn maintenance_features_for_ship(&self, ship_id: &str) -> Result<MaintenanceFeatures> {
        let history = self.store.ship_history(ship_id)?;
        if history.voyages.is_empty() {
            return Err(PredictorError::NoVoyageHistory {
                ship_id: ship_id.to_string(),
            });
        }

        let now = self.clock.now();
        let since = self.window_start();
        let recent = history
            .voyages
            .iter()
            .filter(|v| v.voyage.departure_date >= since)
            .count();
        let total_fuel: f64 = history.voyages.iter().map(|v| v.total_fuel_usage()).sum();
        let days_since_last = history
            .maintenance
            .iter()
            .map(|m| m.maintained_at)
            .max()
            .map(|at| days_between(at, now).floor())
            .unwrap_or(DEFAULT_DAYS_SINCE_MAINTENANCE);

        Ok(MaintenanceFeatures::new(
            recent as f64,
            total_fuel / history.voyages.len() as f64,
            days_since_last,
        ))
    }

    fn window_start(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        now.checked_sub_months(Months::new(HISTORY_WINDOW_MONTHS))
            .unwrap_or(now)
    }
}

/// Most recent maintenance of the same ship strictly before `record`
fn previous_maintenance(
    rows: &[crate::models::MaintenanceWithHistory],
    record: &MaintenanceRecord,
) -> Option<DateTime<Utc>> {
    rows.iter()
        .map(|row| &row.record)
        .filter(|other| other.ship_id == record.ship_id && other.maintained_at < record.maintained_at)
        .map(|other| other.maintained_at)
        .max()
}

/// Fractional days from `from` to `to`
fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}
