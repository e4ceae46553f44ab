//! Dense feed-forward regression primitive
//!
//! Networks are fitted with burn (ndarray backend + autodiff) and then
//! exported to an immutable `RegressionModel` that serves predictions
//! without the autodiff graph.

mod model;
mod network;

pub use model::RegressionModel;
pub use network::{fit, FitOutcome};

use serde_json::json;
use thiserror::Error;

/// Adam learning rate used by every task
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// Errors raised while fitting or evaluating a network
#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("no rows to fit")]
    Empty,
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("failed to export trained weights: {0}")]
    Export(String),
}

/// Architecture and fit hyperparameters for one network
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSpec {
    pub input_features: usize,
    /// Widths of every dense layer; the last one is the linear output layer
    pub layers: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of trailing rows held out for validation loss
    pub validation_split: f64,
    pub shuffle: bool,
    pub learning_rate: f64,
}

impl NetworkSpec {
    pub fn output_width(&self) -> usize {
        self.layers.last().copied().unwrap_or(0)
    }

    /// Number of rows held out for validation, never leaving zero training rows
    pub fn validation_rows(&self, rows: usize) -> usize {
        let held_out = (rows as f64 * self.validation_split).floor() as usize;
        held_out.min(rows.saturating_sub(1))
    }

    /// Hyperparameters as recorded in the model registry
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "layers": self.layers,
            "activation": "relu",
            "output_activation": "linear",
            "loss": "mean_squared_error",
            "optimizer": "adam",
            "learning_rate": self.learning_rate,
            "epochs": self.epochs,
            "batch_size": self.batch_size,
            "validation_split": self.validation_split,
            "shuffle": self.shuffle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(split: f64) -> NetworkSpec {
        NetworkSpec {
            input_features: 4,
            layers: vec![16, 8, 1],
            epochs: 100,
            batch_size: 8,
            validation_split: split,
            shuffle: true,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    #[test]
    fn test_validation_rows_floor() {
        assert_eq!(spec(0.3).validation_rows(10), 3);
        assert_eq!(spec(0.3).validation_rows(7), 2);
        assert_eq!(spec(0.2).validation_rows(4), 0);
    }

    #[test]
    fn test_validation_rows_keep_one_training_row() {
        assert_eq!(spec(0.3).validation_rows(1), 0);
        assert_eq!(spec(1.0).validation_rows(5), 4);
        assert_eq!(spec(0.3).validation_rows(0), 0);
    }

    #[test]
    fn test_spec_json_records_architecture() {
        let json = spec(0.3).to_json();
        assert_eq!(json["layers"], serde_json::json!([16, 8, 1]));
        assert_eq!(json["batch_size"], 8);
        assert_eq!(json["optimizer"], "adam");
    }
}
