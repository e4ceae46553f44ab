use super::model::RegressionModel;
use super::{NetworkSpec, RegressionError};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Module};
use burn::nn::loss::{MseLoss, Reduction};
use burn::nn::{Linear, LinearConfig};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use tracing::{debug, warn};

type InferenceBackend = NdArray<f32>;
type TrainingBackend = Autodiff<InferenceBackend>;

#[derive(Module, Debug)]
struct DenseNetwork<B: Backend> {
    layers: Vec<Linear<B>>,
}

impl<B: Backend> DenseNetwork<B> {
    fn new(input_features: usize, widths: &[usize], device: &B::Device) -> Self {
        let mut layers = Vec::with_capacity(widths.len());
        let mut fan_in = input_features;
        for &width in widths {
            layers.push(LinearConfig::new(fan_in, width).init(device));
            fan_in = width;
        }
        Self { layers }
    }

    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = input;
        for (index, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if index < last {
                x = relu(x);
            }
        }
        x
    }
}

/// Result of a completed fit
#[derive(Debug)]
pub struct FitOutcome {
    pub model: RegressionModel,
    /// Mean batch loss of the final epoch
    pub train_loss: f32,
    /// Loss on the held-out rows after the final epoch
    pub validation_loss: Option<f32>,
}

/// Fit a dense network to `inputs -> targets` with MSE loss and Adam
///
/// The trailing `validation_split` fraction of rows is held out before any
/// shuffling; training rows are reshuffled every epoch when `spec.shuffle`.
pub fn fit(
    spec: &NetworkSpec,
    inputs: &Array2<f32>,
    targets: &Array2<f32>,
) -> Result<FitOutcome, RegressionError> {
    let rows = inputs.nrows();
    if rows == 0 {
        return Err(RegressionError::Empty);
    }
    if spec.layers.is_empty() {
        return Err(RegressionError::ShapeMismatch("no layers configured".to_string()));
    }
    if targets.nrows() != rows {
        return Err(RegressionError::ShapeMismatch(format!(
            "{} input rows but {} target rows",
            rows,
            targets.nrows()
        )));
    }
    if inputs.ncols() != spec.input_features || targets.ncols() != spec.output_width() {
        return Err(RegressionError::ShapeMismatch(format!(
            "expected {} -> {} columns, got {} -> {}",
            spec.input_features,
            spec.output_width(),
            inputs.ncols(),
            targets.ncols()
        )));
    }

    let device = NdArrayDevice::default();
    let train_rows = rows - spec.validation_rows(rows);
    let mut order: Vec<usize> = (0..train_rows).collect();
    let held_out: Vec<usize> = (train_rows..rows).collect();

    let mut network = DenseNetwork::<TrainingBackend>::new(spec.input_features, &spec.layers, &device);
    let mut optimizer = AdamConfig::new().init::<TrainingBackend, DenseNetwork<TrainingBackend>>();
    let loss_fn = MseLoss::new();
    let mut rng = rand::rng();

    let mut train_loss = f32::NAN;
    let mut validation_loss = None;

    for epoch in 0..spec.epochs {
        if spec.shuffle {
            order.shuffle(&mut rng);
        }

        let mut loss_sum = 0.0f32;
        let mut batches = 0usize;
        for chunk in order.chunks(spec.batch_size.max(1)) {
            let x = batch_tensor::<TrainingBackend>(inputs, chunk, &device);
            let y = batch_tensor::<TrainingBackend>(targets, chunk, &device);
            let loss = loss_fn.forward(network.forward(x), y, Reduction::Mean);
            loss_sum += loss.clone().into_scalar().elem::<f32>();
            batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &network);
            network = optimizer.step(spec.learning_rate, network, grads);
        }
        train_loss = loss_sum / batches.max(1) as f32;

        if !held_out.is_empty() {
            let valid = network.valid();
            let x = batch_tensor::<InferenceBackend>(inputs, &held_out, &device);
            let y = batch_tensor::<InferenceBackend>(targets, &held_out, &device);
            let loss = loss_fn
                .forward(valid.forward(x), y, Reduction::Mean)
                .into_scalar()
                .elem::<f32>();
            validation_loss = Some(loss);
        }

        debug!(
            epoch = epoch + 1,
            train_loss = train_loss,
            validation_loss = ?validation_loss,
            "Epoch complete"
        );
    }

    if !train_loss.is_finite() {
        warn!(train_loss = train_loss, "Training loss is not finite");
    }

    let model = export(&network.valid())?;
    Ok(FitOutcome {
        model,
        train_loss,
        validation_loss,
    })
}

fn batch_tensor<B: Backend>(matrix: &Array2<f32>, rows: &[usize], device: &B::Device) -> Tensor<B, 2> {
    let cols = matrix.ncols();
    let mut values = Vec::with_capacity(rows.len() * cols);
    for &row in rows {
        values.extend(matrix.row(row).iter().copied());
    }
    Tensor::from_data(TensorData::new(values, [rows.len(), cols]), device)
}

fn export<B: Backend>(network: &DenseNetwork<B>) -> Result<RegressionModel, RegressionError> {
    let mut parameters = Vec::with_capacity(network.layers.len());
    for layer in &network.layers {
        let weight = layer.weight.val();
        let [fan_in, fan_out] = weight.dims();
        let values = weight
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| RegressionError::Export(format!("{:?}", e)))?;
        let weights = Array2::from_shape_vec((fan_in, fan_out), values)
            .map_err(|e| RegressionError::Export(e.to_string()))?;

        let bias = match &layer.bias {
            Some(bias) => Array1::from_vec(
                bias.val()
                    .into_data()
                    .to_vec::<f32>()
                    .map_err(|e| RegressionError::Export(format!("{:?}", e)))?,
            ),
            None => Array1::zeros(fan_out),
        };
        parameters.push((weights, bias));
    }
    RegressionModel::from_parameters(parameters)
}
