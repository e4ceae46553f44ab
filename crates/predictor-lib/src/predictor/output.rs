//! Maintenance output post-processing
//!
//! Converts the raw (next due days, voyage-ready offset days, score) outputs
//! into calendar dates and a bounded score, substituting defaults for
//! unusable values field by field.

use crate::error::{PredictorError, Result};
use crate::models::MaintenanceForecast;
use chrono::{DateTime, TimeDelta, Utc};

/// Days until next maintenance when the model output is unusable
pub const DEFAULT_NEXT_DUE_DAYS: f64 = 180.0;

/// Days until voyage-ready when the model output is unusable
pub const DEFAULT_VOYAGE_READY_DAYS: f64 = 12.0;

/// Score when the model output is non-finite
pub const DEFAULT_SCORE: f64 = 3.0;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Configuration for output fallbacks
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub default_next_due_days: f64,
    pub default_voyage_ready_days: f64,
    pub default_score: f64,
    pub min_score: u8,
    pub max_score: u8,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            default_next_due_days: DEFAULT_NEXT_DUE_DAYS,
            default_voyage_ready_days: DEFAULT_VOYAGE_READY_DAYS,
            default_score: DEFAULT_SCORE,
            min_score: MIN_SCORE,
            max_score: MAX_SCORE,
        }
    }
}

/// A raw output that was replaced by its default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedFallback {
    pub field: &'static str,
    pub raw: f64,
    pub substituted: f64,
}

/// Applies the fallback policy to raw maintenance outputs
#[derive(Debug, Clone, Default)]
pub struct ForecastPolicy {
    config: FallbackConfig,
}

impl ForecastPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FallbackConfig) -> Self {
        Self { config }
    }

    /// Build a forecast from raw outputs
    ///
    /// Both dates are offsets from `now`. The voyage-ready label is trained
    /// as an offset from the next due date, so the two definitions disagree;
    /// callers relying on the inference-time reading get it unchanged.
    pub fn resolve(
        &self,
        raw: [f64; 3],
        now: DateTime<Utc>,
    ) -> Result<(MaintenanceForecast, Vec<AppliedFallback>)> {
        let [raw_next_due, raw_ready, raw_score] = raw;
        let mut fallbacks = Vec::new();

        let next_due_date = date_or_default(
            "next_due_days",
            raw_next_due,
            self.config.default_next_due_days,
            now,
            &mut fallbacks,
        )?;
        let voyage_ready_date = date_or_default(
            "voyage_ready_offset_days",
            raw_ready,
            self.config.default_voyage_ready_days,
            now,
            &mut fallbacks,
        )?;
        let score = if raw_score.is_finite() {
            raw_score
        } else {
            fallbacks.push(AppliedFallback {
                field: "score",
                raw: raw_score,
                substituted: self.config.default_score,
            });
            self.config.default_score
        };

        let forecast = MaintenanceForecast {
            next_due_date,
            voyage_ready_date,
            score: self.clamp_score(score),
        };
        Ok((forecast, fallbacks))
    }

    fn clamp_score(&self, score: f64) -> u8 {
        let rounded = score
            .round()
            .clamp(f64::from(self.config.min_score), f64::from(self.config.max_score));
        rounded as u8
    }
}

/// `now` plus the raw day count, or plus the default when the raw value is
/// negative, non-finite or beyond the representable date range
fn date_or_default(
    field: &'static str,
    raw: f64,
    default: f64,
    now: DateTime<Utc>,
    fallbacks: &mut Vec<AppliedFallback>,
) -> Result<DateTime<Utc>> {
    if raw.is_finite() && raw >= 0.0 {
        if let Some(date) = offset_days(now, raw) {
            return Ok(date);
        }
    }
    fallbacks.push(AppliedFallback {
        field,
        raw,
        substituted: default,
    });
    offset_days(now, default).ok_or_else(|| {
        PredictorError::numeric(
            "maintenance_dates",
            format!("default of {} days for {} is out of range", default, field),
        )
    })
}

/// `now` plus a whole number of days, rounding the offset
fn offset_days(now: DateTime<Utc>, days: f64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days.round() as i64).and_then(|delta| now.checked_add_signed(delta))
}
