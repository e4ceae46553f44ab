//! Voyage planning on top of the route and fuel predictors

use crate::clock::Clock;
use crate::error::{PredictorError, Result};
use crate::models::{new_id, SpeedSegment, Voyage, VoyageFeatures};
use crate::predictor::{FuelPredictor, Predictor, RoutePredictor};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Voyage to plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyagePlanRequest {
    pub ship_id: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub distance: f64,
    pub cargo_weight: f64,
    #[serde(default)]
    pub cargo_type: Option<String>,
    pub weather_severity: f64,
    pub wind_speed: f64,
    /// Defaults to now
    #[serde(default)]
    pub departure_date: Option<DateTime<Utc>>,
}

impl VoyagePlanRequest {
    pub fn features(&self) -> VoyageFeatures {
        VoyageFeatures::new(
            self.cargo_weight,
            self.distance,
            self.weather_severity,
            self.wind_speed,
        )
    }
}

/// Predicted schedule of a planned voyage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyagePlan {
    pub voyage_id: String,
    pub predicted_duration: f64,
    pub predicted_fuel_usage: f64,
    pub optimal_speed: f64,
    pub speed_schedule: Vec<SpeedSegment>,
    pub departure_date: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

pub struct VoyagePlanner {
    route: Arc<RoutePredictor>,
    fuel: Arc<FuelPredictor>,
    clock: Arc<dyn Clock>,
}

impl VoyagePlanner {
    pub fn new(route: Arc<RoutePredictor>, fuel: Arc<FuelPredictor>, clock: Arc<dyn Clock>) -> Self {
        Self { route, fuel, clock }
    }

    /// Predict route and fuel for a request, returning the plan and the voyage record to persist
    pub fn plan(&self, request: &VoyagePlanRequest) -> Result<(VoyagePlan, Voyage)> {
        for (field, value) in [
            ("ship_id", &request.ship_id),
            ("name", &request.name),
            ("origin", &request.origin),
            ("destination", &request.destination),
        ] {
            if value.trim().is_empty() {
                return Err(PredictorError::invalid_input(field, "is required"));
            }
        }

        if request.distance < 0.0 {
            return Err(PredictorError::invalid_input("distance", "must not be negative"));
        }

        let now = self.clock.now();
        let departure = request.departure_date.unwrap_or(now);
        if departure < now {
            return Err(PredictorError::invalid_input(
                "departure_date",
                "cannot be in the past",
            ));
        }

        let features = request.features();
        let route = self.route.predict(&features)?;
        let fuel = self.fuel.predict(&features)?;
        let arrival = arrival_time(departure, route.predicted_duration)?;

        let voyage = Voyage {
            id: new_id(),
            ship_id: request.ship_id.clone(),
            name: request.name.clone(),
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            distance: request.distance,
            cargo_weight: request.cargo_weight,
            cargo_type: request.cargo_type.clone(),
            weather_severity: request.weather_severity,
            wind_speed: request.wind_speed,
            departure_date: departure,
            arrival_time: Some(arrival),
            predicted_fuel_usage: Some(fuel),
            predicted_duration: Some(route.predicted_duration),
            optimal_speed: Some(route.optimal_speed),
        };
        let plan = VoyagePlan {
            voyage_id: voyage.id.clone(),
            predicted_duration: route.predicted_duration,
            predicted_fuel_usage: fuel,
            optimal_speed: route.optimal_speed,
            speed_schedule: route.speed_schedule,
            departure_date: departure,
            arrival_time: arrival,
        };
        Ok((plan, voyage))
    }
}

fn arrival_time(departure: DateTime<Utc>, duration_hours: f64) -> Result<DateTime<Utc>> {
    let millis = (duration_hours * MILLIS_PER_HOUR).round();
    if !millis.is_finite() {
        return Err(PredictorError::numeric(
            "arrival_time",
            format!("duration of {} hours", duration_hours),
        ));
    }
    TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| departure.checked_add_signed(delta))
        .ok_or_else(|| {
            PredictorError::numeric("arrival_time", format!("duration of {} hours", duration_hours))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouteModels;
    use crate::predictor::test_support::{constant_model, env, now};
    use chrono::Duration;

    fn planner(duration: f32, fuel: f32) -> VoyagePlanner {
        let env = env();
        env.models.route.install(RouteModels {
            duration: constant_model(4, &[duration]),
            speed: constant_model(4, &[13.0]),
        });
        env.models.fuel.install(constant_model(4, &[fuel]));
        VoyagePlanner::new(
            Arc::new(RoutePredictor::new(env.clone())),
            Arc::new(FuelPredictor::new(env.clone())),
            env.clock.clone(),
        )
    }

    fn request() -> VoyagePlanRequest {
        VoyagePlanRequest {
            ship_id: "ship-9".to_string(),
            name: "Valencia to Genoa".to_string(),
            origin: "Valencia".to_string(),
            destination: "Genoa".to_string(),
            distance: 780.0,
            cargo_weight: 18_000.0,
            cargo_type: None,
            weather_severity: 0.3,
            wind_speed: 11.0,
            departure_date: None,
        }
    }

    #[test]
    fn test_plan_departs_now_and_adds_duration() {
        let (plan, voyage) = planner(60.5, 41.25).plan(&request()).unwrap();

        assert_eq!(plan.departure_date, now());
        assert_eq!(plan.arrival_time, now() + Duration::minutes(60 * 60 + 30));
        assert_eq!(plan.predicted_fuel_usage, 41.25);
        assert_eq!(plan.speed_schedule.len(), 4);
        assert_eq!(voyage.id, plan.voyage_id);
        assert_eq!(voyage.predicted_duration, Some(60.5));
        assert_eq!(voyage.optimal_speed, Some(13.0));
    }

    #[test]
    fn test_past_departure_rejected() {
        let mut request = request();
        request.departure_date = Some(now() - Duration::hours(1));
        assert!(matches!(
            planner(1.0, 1.0).plan(&request),
            Err(PredictorError::InvalidInput { field, .. }) if field == "departure_date"
        ));
    }

    #[test]
    fn test_missing_text_field_rejected() {
        let mut request = request();
        request.origin = "  ".to_string();
        assert!(matches!(
            planner(1.0, 1.0).plan(&request),
            Err(PredictorError::InvalidInput { field, .. }) if field == "origin"
        ));
    }

    #[test]
    fn test_negative_distance_rejected() {
        let mut request = request();
        request.distance = -10.0;
        assert!(matches!(
            planner(1.0, 1.0).plan(&request),
            Err(PredictorError::InvalidInput { field, .. }) if field == "distance"
        ));
    }

    #[test]
    fn test_non_finite_fuel_rejected() {
        assert!(matches!(
            planner(10.0, f32::NAN).plan(&request()),
            Err(PredictorError::NumericInstability { .. })
        ));
    }

    #[test]
    fn test_untrained_models_propagate() {
        let env = env();
        let planner = VoyagePlanner::new(
            Arc::new(RoutePredictor::new(env.clone())),
            Arc::new(FuelPredictor::new(env.clone())),
            env.clock.clone(),
        );
        assert!(matches!(
            planner.plan(&request()),
            Err(PredictorError::ModelNotTrained { .. })
        ));
    }
}
