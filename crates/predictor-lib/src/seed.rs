//! Synthetic fleet history for development and demos
//!
//! Generates ships with past voyages, fuel logs, feedback and maintenance
//! records whose values sit in realistic ranges, so every trainer has data
//! on a fresh database.

use crate::error::Result;
use crate::feedback::{prediction_accuracy, route_optimization_score};
use crate::models::{new_id, FuelLog, MaintenanceRecord, Ship, Voyage, VoyageFeedback};
use crate::store::HistoryWriter;
use crate::training::round_to;
use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::info;

const PORTS: [&str; 12] = [
    "Rotterdam", "Singapore", "Shanghai", "Hamburg", "Los Angeles", "Santos", "Durban",
    "Busan", "Antwerp", "Dubai", "Valencia", "Yokohama",
];

const SHIP_PREFIXES: [&str; 6] = ["Northern", "Pacific", "Atlantic", "Coral", "Silver", "Iron"];
const SHIP_SUFFIXES: [&str; 6] = ["Star", "Trader", "Voyager", "Spirit", "Pioneer", "Horizon"];

const CARGO_TYPES: [&str; 5] = ["container", "bulk", "liquid", "general", "refrigerated"];

/// Fuel type and cost per ton
const FUEL_TYPES: [(&str, f64); 2] = [("petrol", 105.0), ("diesel", 90.0)];

const MAINTENANCE_DESCRIPTIONS: [&str; 6] = [
    "Engine overhaul",
    "Hull cleaning and inspection",
    "Propeller polishing",
    "Ballast system service",
    "Navigation equipment calibration",
    "Dry dock survey",
];

/// Shape of the generated fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub ships: usize,
    pub voyages_per_ship: RangeInclusive<usize>,
    pub fuel_logs_per_voyage: RangeInclusive<usize>,
    pub maintenance_per_ship: RangeInclusive<usize>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            ships: 10,
            voyages_per_ship: 2..=5,
            fuel_logs_per_voyage: 4..=8,
            maintenance_per_ship: 1..=3,
        }
    }
}

/// Row counts written by `seed_fleet`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub ships: usize,
    pub voyages: usize,
    pub fuel_logs: usize,
    pub feedback: usize,
    pub maintenance_records: usize,
}

/// Write a synthetic fleet history through `writer`
pub fn seed_fleet<R: Rng + ?Sized>(
    writer: &dyn HistoryWriter,
    config: &SeedConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for index in 0..config.ships {
        let ship = random_ship(index, rng);
        writer.insert_ship(&ship)?;
        summary.ships += 1;

        for _ in 0..rng.random_range(config.voyages_per_ship.clone()) {
            let voyage = random_voyage(&ship, now, rng);
            writer.insert_voyage(&voyage)?;
            summary.voyages += 1;

            let logs = random_fuel_logs(&voyage, config.fuel_logs_per_voyage.clone(), rng);
            for log in &logs {
                writer.insert_fuel_log(log)?;
            }
            summary.fuel_logs += logs.len();

            let actual_fuel: f64 = logs.iter().map(|l| l.fuel_usage).sum();
            writer.insert_feedback(&feedback_for(&voyage, actual_fuel, now, rng))?;
            summary.feedback += 1;
        }

        for _ in 0..rng.random_range(config.maintenance_per_ship.clone()) {
            writer.insert_maintenance_record(&random_maintenance(&ship, now, rng))?;
            summary.maintenance_records += 1;
        }
    }

    info!(
        event = "fleet_seeded",
        ships = summary.ships,
        voyages = summary.voyages,
        fuel_logs = summary.fuel_logs,
        maintenance_records = summary.maintenance_records,
        "Synthetic fleet history written"
    );
    Ok(summary)
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn random_ship<R: Rng + ?Sized>(index: usize, rng: &mut R) -> Ship {
    Ship {
        id: new_id(),
        name: format!(
            "{} {} {}",
            pick(&SHIP_PREFIXES, rng),
            pick(&SHIP_SUFFIXES, rng),
            index + 1
        ),
        capacity: rng.random_range(15_000.0..=80_000.0_f64).round(),
    }
}

fn random_voyage<R: Rng + ?Sized>(ship: &Ship, now: DateTime<Utc>, rng: &mut R) -> Voyage {
    let origin = pick(&PORTS, rng);
    let destination = loop {
        let port = pick(&PORTS, rng);
        if port != origin {
            break port;
        }
    };

    let distance = rng.random_range(500.0..=8_000.0_f64).round();
    let base_speed = rng.random_range(12.0..=18.0);
    let predicted_duration = round_to(distance / base_speed, 2);
    let fuel_rate = rng.random_range(2.5..=4.5);
    let departure_date = now - Duration::hours(rng.random_range(24..=365 * 24));

    Voyage {
        id: new_id(),
        ship_id: ship.id.clone(),
        name: format!("{} to {}", origin, destination),
        origin: origin.to_string(),
        destination: destination.to_string(),
        distance,
        cargo_weight: (ship.capacity * rng.random_range(0.6..=0.95)).round(),
        cargo_type: Some(pick(&CARGO_TYPES, rng).to_string()),
        weather_severity: round_to(rng.random_range(0.2..=0.8), 2),
        wind_speed: round_to(rng.random_range(8.0..=35.0), 1),
        departure_date,
        arrival_time: Some(departure_date + Duration::minutes((predicted_duration * 60.0) as i64)),
        predicted_fuel_usage: Some(round_to(predicted_duration / 24.0 * fuel_rate * 1000.0, 2)),
        predicted_duration: Some(predicted_duration),
        optimal_speed: Some(round_to(rng.random_range(14.0..=20.0), 1)),
    }
}

/// Logs spread over the voyage whose total lands within 8% of the prediction
fn random_fuel_logs<R: Rng + ?Sized>(
    voyage: &Voyage,
    count: RangeInclusive<usize>,
    rng: &mut R,
) -> Vec<FuelLog> {
    let count = rng.random_range(count).max(1);
    let predicted = voyage.predicted_fuel_usage.unwrap_or(0.0);
    let target = predicted * rng.random_range(0.92..=1.08);
    let per_log = target / count as f64;
    let span_minutes = (voyage.predicted_duration.unwrap_or(24.0) * 60.0) as i64;

    (0..count)
        .map(|i| {
            let (fuel_type, cost_per_ton) = FUEL_TYPES[rng.random_range(0..FUEL_TYPES.len())];
            let fuel_usage = round_to(per_log * rng.random_range(0.85..=1.15), 2);
            let offset = span_minutes * i as i64 / count as i64;
            FuelLog {
                id: new_id(),
                ship_id: voyage.ship_id.clone(),
                voyage_id: voyage.id.clone(),
                timestamp: voyage.departure_date + Duration::minutes(offset),
                fuel_type: fuel_type.to_string(),
                fuel_usage,
                fuel_cost: round_to(fuel_usage * cost_per_ton, 2),
            }
        })
        .collect()
}

fn feedback_for<R: Rng + ?Sized>(
    voyage: &Voyage,
    actual_fuel: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> VoyageFeedback {
    let actual_fuel = round_to(actual_fuel, 2);
    let actual_duration = voyage
        .predicted_duration
        .map(|d| (d * rng.random_range(0.94..=1.06)).round());
    let fuel_accuracy = prediction_accuracy(voyage.predicted_fuel_usage, Some(actual_fuel));
    let duration_accuracy = prediction_accuracy(voyage.predicted_duration, actual_duration);

    VoyageFeedback {
        id: new_id(),
        voyage_id: voyage.id.clone(),
        actual_fuel_usage: Some(actual_fuel),
        actual_duration,
        fuel_accuracy,
        duration_accuracy,
        route_optimization_score: route_optimization_score(fuel_accuracy, duration_accuracy),
        submitted_at: voyage.arrival_time.unwrap_or(now).min(now),
    }
}

fn random_maintenance<R: Rng + ?Sized>(
    ship: &Ship,
    now: DateTime<Utc>,
    rng: &mut R,
) -> MaintenanceRecord {
    let maintained_at = now - Duration::days(rng.random_range(1..=730));
    let next_due = maintained_at + Duration::days(30 * rng.random_range(6..=12));
    MaintenanceRecord {
        id: new_id(),
        ship_id: ship.id.clone(),
        maintained_at,
        next_due: Some(next_due),
        voyage_ready_date: Some(maintained_at + Duration::days(rng.random_range(10..=15))),
        score: Some(rng.random_range(3..=5)),
        description: Some(pick(&MAINTENANCE_DESCRIPTIONS, rng).to_string()),
    }
}
