//! Post-voyage feedback scoring
//!
//! Feedback rows compare the observed outcome with what was predicted when
//! the voyage was planned; the rows later become fuel and route training data.

use crate::error::{PredictorError, Result};
use crate::models::{new_id, Voyage, VoyageFeedback};
use crate::training::round_to;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observed outcome reported for a voyage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub voyage_id: String,
    pub actual_fuel_usage: Option<f64>,
    /// Hours
    pub actual_duration: Option<f64>,
}

/// Accuracy thresholds (percent) for route optimisation scores 5, 4, 3 and 2
const SCORE_THRESHOLDS: [(f64, u8); 4] = [(95.0, 5), (90.0, 4), (80.0, 3), (70.0, 2)];

/// Percentage accuracy of a prediction, floored at zero and rounded to 2 decimals
///
/// Absent when either side is missing or zero.
pub fn prediction_accuracy(predicted: Option<f64>, actual: Option<f64>) -> Option<f64> {
    match (predicted, actual) {
        (Some(predicted), Some(actual)) if predicted != 0.0 && actual != 0.0 => {
            let relative_error = (actual - predicted).abs() / predicted;
            Some(round_to((1.0 - relative_error).max(0.0) * 100.0, 2))
        }
        _ => None,
    }
}

/// 5/4/3/2 when both accuracies exceed 95/90/80/70 percent, otherwise 1
pub fn route_optimization_score(fuel_accuracy: Option<f64>, duration_accuracy: Option<f64>) -> u8 {
    let fuel = fuel_accuracy.unwrap_or(0.0);
    let duration = duration_accuracy.unwrap_or(0.0);
    SCORE_THRESHOLDS
        .iter()
        .find(|(threshold, _)| fuel > *threshold && duration > *threshold)
        .map(|(_, score)| *score)
        .unwrap_or(1)
}

/// Score a feedback submission against the voyage's stored predictions
pub fn score_feedback(
    voyage: &Voyage,
    request: &FeedbackRequest,
    submitted_at: DateTime<Utc>,
) -> Result<VoyageFeedback> {
    validate_actual("actual_fuel_usage", request.actual_fuel_usage)?;
    validate_actual("actual_duration", request.actual_duration)?;

    let fuel_accuracy = prediction_accuracy(voyage.predicted_fuel_usage, request.actual_fuel_usage);
    let duration_accuracy = prediction_accuracy(voyage.predicted_duration, request.actual_duration);

    Ok(VoyageFeedback {
        id: new_id(),
        voyage_id: voyage.id.clone(),
        actual_fuel_usage: request.actual_fuel_usage,
        actual_duration: request.actual_duration,
        fuel_accuracy,
        duration_accuracy,
        route_optimization_score: route_optimization_score(fuel_accuracy, duration_accuracy),
        submitted_at,
    })
}

fn validate_actual(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(PredictorError::invalid_input(field, "must be a finite number")),
        Some(v) if v < 0.0 => Err(PredictorError::invalid_input(field, "must not be negative")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voyage(predicted_fuel: Option<f64>, predicted_duration: Option<f64>) -> Voyage {
        Voyage {
            id: "voyage-1".to_string(),
            ship_id: "ship-1".to_string(),
            name: "Santos to Durban".to_string(),
            origin: "Santos".to_string(),
            destination: "Durban".to_string(),
            distance: 4_800.0,
            cargo_weight: 51_000.0,
            cargo_type: Some("bulk".to_string()),
            weather_severity: 0.6,
            wind_speed: 22.0,
            departure_date: Utc::now(),
            arrival_time: None,
            predicted_fuel_usage: predicted_fuel,
            predicted_duration,
            optimal_speed: Some(15.0),
        }
    }

    fn request(fuel: Option<f64>, duration: Option<f64>) -> FeedbackRequest {
        FeedbackRequest {
            voyage_id: "voyage-1".to_string(),
            actual_fuel_usage: fuel,
            actual_duration: duration,
        }
    }

    #[test]
    fn test_prediction_accuracy() {
        assert_eq!(prediction_accuracy(Some(100.0), Some(97.0)), Some(97.0));
        assert_eq!(prediction_accuracy(Some(300.0), Some(310.0)), Some(96.67));
        // Floors at zero
        assert_eq!(prediction_accuracy(Some(10.0), Some(50.0)), Some(0.0));
        assert_eq!(prediction_accuracy(None, Some(50.0)), None);
        assert_eq!(prediction_accuracy(Some(10.0), Some(0.0)), None);
    }

    #[test]
    fn test_route_optimization_score_bands() {
        assert_eq!(route_optimization_score(Some(96.0), Some(99.0)), 5);
        assert_eq!(route_optimization_score(Some(96.0), Some(91.0)), 4);
        assert_eq!(route_optimization_score(Some(85.0), Some(99.0)), 3);
        assert_eq!(route_optimization_score(Some(71.0), Some(75.0)), 2);
        assert_eq!(route_optimization_score(Some(70.0), Some(99.0)), 1);
        assert_eq!(route_optimization_score(None, Some(99.0)), 1);
    }

    #[test]
    fn test_score_feedback() {
        let feedback = score_feedback(
            &voyage(Some(200.0), Some(100.0)),
            &request(Some(196.0), Some(103.0)),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(feedback.voyage_id, "voyage-1");
        assert_eq!(feedback.fuel_accuracy, Some(98.0));
        assert_eq!(feedback.duration_accuracy, Some(97.0));
        assert_eq!(feedback.route_optimization_score, 5);
    }

    #[test]
    fn test_feedback_without_predictions_scores_one() {
        let feedback =
            score_feedback(&voyage(None, None), &request(Some(196.0), None), Utc::now()).unwrap();
        assert_eq!(feedback.fuel_accuracy, None);
        assert_eq!(feedback.route_optimization_score, 1);
        assert_eq!(feedback.actual_fuel_usage, Some(196.0));
    }

    #[test]
    fn test_rejects_invalid_actuals() {
        let voyage = voyage(Some(1.0), Some(1.0));
        assert!(score_feedback(&voyage, &request(Some(-1.0), None), Utc::now()).is_err());
        assert!(score_feedback(&voyage, &request(None, Some(f64::NAN)), Utc::now()).is_err());
    }
}
