//! Error taxonomy for training and prediction

use crate::models::ModelType;
use thiserror::Error;

/// Errors raised by the historical store and model registry backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the prediction core
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("no training examples available for {model_type}")]
    InsufficientData { model_type: ModelType },

    #[error("{model_type} model has not been trained")]
    ModelNotTrained { model_type: ModelType },

    #[error("non-finite value during {stage}: {detail}")]
    NumericInstability { stage: &'static str, detail: String },

    #[error("invalid input '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("no voyages recorded for ship {ship_id}")]
    NoVoyageHistory { ship_id: String },

    #[error("voyage {voyage_id} not found")]
    VoyageNotFound { voyage_id: String },

    #[error("training {model_type} failed: {reason}")]
    Training { model_type: ModelType, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PredictorError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PredictorError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn numeric(stage: &'static str, detail: impl Into<String>) -> Self {
        PredictorError::NumericInstability {
            stage,
            detail: detail.into(),
        }
    }

    /// Stable label used in metrics and API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::InsufficientData { .. } => "insufficient_data",
            PredictorError::ModelNotTrained { .. } => "model_not_trained",
            PredictorError::NumericInstability { .. } => "numeric_instability",
            PredictorError::InvalidInput { .. } => "invalid_input",
            PredictorError::NoVoyageHistory { .. } => "no_voyage_history",
            PredictorError::VoyageNotFound { .. } => "voyage_not_found",
            PredictorError::Training { .. } => "training_failed",
            PredictorError::Store(_) => "store_error",
        }
    }
}

pub type Result<T, E = PredictorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_stable() {
        let err = PredictorError::InsufficientData {
            model_type: ModelType::RouteOptimizer,
        };
        assert_eq!(err.kind(), "insufficient_data");
        assert_eq!(
            err.to_string(),
            "no training examples available for route_optimizer"
        );

        let err = PredictorError::from(StoreError::Poisoned);
        assert_eq!(err.kind(), "store_error");
    }
}
