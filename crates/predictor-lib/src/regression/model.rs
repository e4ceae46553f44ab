//! Exported network weights used for inference

use super::RegressionError;
use ndarray::{Array1, Array2, ArrayView1};

#[derive(Debug, Clone)]
struct DenseLayer {
    /// Shape [inputs, outputs]
    weights: Array2<f32>,
    bias: Array1<f32>,
}

/// Immutable trained regression function
///
/// ReLU between layers, linear output. This is the in-memory model handle:
/// it is shared behind `Arc` and replaced wholesale on retraining.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    layers: Vec<DenseLayer>,
}

impl RegressionModel {
    /// Build a model from `(weights[in, out], bias[out])` pairs, validating that shapes chain
    pub fn from_parameters(
        parameters: Vec<(Array2<f32>, Array1<f32>)>,
    ) -> Result<Self, RegressionError> {
        if parameters.is_empty() {
            return Err(RegressionError::ShapeMismatch("model has no layers".to_string()));
        }
        let mut previous_out: Option<usize> = None;
        let mut layers = Vec::with_capacity(parameters.len());
        for (index, (weights, bias)) in parameters.into_iter().enumerate() {
            let (inputs, outputs) = weights.dim();
            if bias.len() != outputs {
                return Err(RegressionError::ShapeMismatch(format!(
                    "layer {} bias has {} values, expected {}",
                    index,
                    bias.len(),
                    outputs
                )));
            }
            if let Some(prev) = previous_out {
                if prev != inputs {
                    return Err(RegressionError::ShapeMismatch(format!(
                        "layer {} expects {} inputs, previous layer yields {}",
                        index, inputs, prev
                    )));
                }
            }
            previous_out = Some(outputs);
            layers.push(DenseLayer { weights, bias });
        }
        Ok(Self { layers })
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map(|l| l.weights.nrows()).unwrap_or(0)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(|l| l.bias.len()).unwrap_or(0)
    }

    /// Evaluate a batch of rows
    pub fn predict_batch(&self, inputs: &Array2<f32>) -> Result<Array2<f32>, RegressionError> {
        if inputs.ncols() != self.input_width() {
            return Err(RegressionError::ShapeMismatch(format!(
                "got {} input columns, model expects {}",
                inputs.ncols(),
                self.input_width()
            )));
        }
        let last = self.layers.len() - 1;
        let mut activations = inputs.to_owned();
        for (index, layer) in self.layers.iter().enumerate() {
            activations = activations.dot(&layer.weights) + &layer.bias;
            if index < last {
                // NaN passes through so callers can detect it
                activations.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v });
            }
        }
        Ok(activations)
    }

    /// Evaluate a single feature row
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>, RegressionError> {
        let row = ArrayView1::from(input)
            .into_shape_with_order((1, input.len()))
            .map_err(|e| RegressionError::ShapeMismatch(e.to_string()))?
            .to_owned();
        Ok(self.predict_batch(&row)?.row(0).to_vec())
    }
}
