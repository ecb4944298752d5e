//! Dense feed-forward evaluation of the embedding network.
//!
//! Layers are materialized from the model asset as flat row-major weight
//! buffers. The forward pass runs in the precision the asset declares so
//! that embeddings stay within an ulp of the values the centroid table
//! was trained against.

use crate::error::{FoldcodeError, Result};

/// Numeric precision declared by the asset for weights and evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// Width in bytes of one serialized float.
    pub fn width(&self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }

    /// Inverse of [`Precision::width`].
    pub fn from_width(width: u8) -> Option<Precision> {
        match width {
            4 => Some(Precision::Single),
            8 => Some(Precision::Double),
            _ => None,
        }
    }
}

/// Activation applied after a layer's affine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Activation {
    Identity,
    Relu,
    Tanh,
    Sigmoid,
    Softmax,
}

impl Activation {
    /// Wire tag used in the serialized asset.
    pub fn tag(&self) -> u8 {
        match self {
            Activation::Identity => 0,
            Activation::Relu => 1,
            Activation::Tanh => 2,
            Activation::Sigmoid => 3,
            Activation::Softmax => 4,
        }
    }

    /// Inverse of [`Activation::tag`].
    pub fn from_tag(tag: u8) -> Option<Activation> {
        match tag {
            0 => Some(Activation::Identity),
            1 => Some(Activation::Relu),
            2 => Some(Activation::Tanh),
            3 => Some(Activation::Sigmoid),
            4 => Some(Activation::Softmax),
            _ => None,
        }
    }
}

/// One dense layer: `y = activation(W x + b)`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layer {
    pub rows: usize,
    pub cols: usize,
    pub activation: Activation,
    /// Row-major `rows * cols` weight matrix.
    pub weights: Vec<f64>,
    /// `rows` bias values.
    pub biases: Vec<f64>,
}

impl Layer {
    /// Build a layer, validating buffer sizes against the dimensions.
    pub fn new(
        rows: usize,
        cols: usize,
        activation: Activation,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Layer> {
        if rows == 0 || cols == 0 {
            return Err(FoldcodeError::AssetMalformed(format!(
                "layer has zero dimension ({rows}x{cols})"
            )));
        }
        if weights.len() != rows * cols {
            return Err(FoldcodeError::AssetMalformed(format!(
                "weight buffer holds {} values, expected {}x{}",
                weights.len(),
                rows,
                cols
            )));
        }
        if biases.len() != rows {
            return Err(FoldcodeError::AssetMalformed(format!(
                "bias buffer holds {} values, expected {}",
                biases.len(),
                rows
            )));
        }
        Ok(Layer {
            rows,
            cols,
            activation,
            weights,
            biases,
        })
    }

    /// Affine step plus activation, writing into `out` (length `rows`).
    fn apply(&self, input: &[f64], out: &mut [f64], precision: Precision) {
        debug_assert_eq!(input.len(), self.cols);
        debug_assert_eq!(out.len(), self.rows);
        match precision {
            Precision::Double => {
                for r in 0..self.rows {
                    let row = &self.weights[r * self.cols..(r + 1) * self.cols];
                    let mut acc = self.biases[r];
                    for (w, x) in row.iter().zip(input.iter()) {
                        acc += w * x;
                    }
                    out[r] = acc;
                }
            }
            Precision::Single => {
                for r in 0..self.rows {
                    let row = &self.weights[r * self.cols..(r + 1) * self.cols];
                    let mut acc = self.biases[r] as f32;
                    for (w, x) in row.iter().zip(input.iter()) {
                        acc += (*w as f32) * (*x as f32);
                    }
                    out[r] = acc as f64;
                }
            }
        }
        activate(self.activation, out, precision);
    }
}

fn activate(activation: Activation, values: &mut [f64], precision: Precision) {
    match activation {
        Activation::Identity => {}
        Activation::Relu => {
            for v in values.iter_mut() {
                if *v < 0.0 {
                    *v = 0.0;
                }
            }
        }
        Activation::Tanh => match precision {
            Precision::Double => {
                for v in values.iter_mut() {
                    *v = v.tanh();
                }
            }
            Precision::Single => {
                for v in values.iter_mut() {
                    *v = (*v as f32).tanh() as f64;
                }
            }
        },
        Activation::Sigmoid => match precision {
            Precision::Double => {
                for v in values.iter_mut() {
                    *v = sigmoid(*v);
                }
            }
            Precision::Single => {
                for v in values.iter_mut() {
                    *v = (1.0f32 / (1.0f32 + (-(*v as f32)).exp())) as f64;
                }
            }
        },
        Activation::Softmax => softmax(values, precision),
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Max-shifted softmax for numerical stability.
fn softmax(values: &mut [f64], precision: Precision) {
    match precision {
        Precision::Double => {
            let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for v in values.iter_mut() {
                *v = (*v - max_val).exp();
                sum += *v;
            }
            for v in values.iter_mut() {
                *v /= sum;
            }
        }
        Precision::Single => {
            let max_val = values
                .iter()
                .map(|&v| v as f32)
                .fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0f32;
            for v in values.iter_mut() {
                let e = ((*v as f32) - max_val).exp();
                sum += e;
                *v = e as f64;
            }
            for v in values.iter_mut() {
                *v = ((*v as f32) / sum) as f64;
            }
        }
    }
}

/// Reusable activation buffers for the forward pass; sized once to the
/// widest layer and then allocation-free per call.
#[derive(Debug, Default)]
pub(crate) struct ForwardScratch {
    cur: Vec<f64>,
    next: Vec<f64>,
}

impl ForwardScratch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The output of the last [`forward_into`] call.
    pub(crate) fn output(&self) -> &[f64] {
        &self.cur
    }
}

/// Run the layer stack on `input`, leaving the result in the scratch
/// buffers. Dimension agreement was validated when the asset was built.
pub(crate) fn forward_into(
    layers: &[Layer],
    precision: Precision,
    input: &[f64],
    scratch: &mut ForwardScratch,
) {
    scratch.cur.clear();
    scratch.cur.extend_from_slice(input);
    for layer in layers {
        scratch.next.clear();
        scratch.next.resize(layer.rows, 0.0);
        layer.apply(&scratch.cur, &mut scratch.next, precision);
        std::mem::swap(&mut scratch.cur, &mut scratch.next);
    }
}

/// Convenience forward pass that allocates its own buffers.
pub fn forward(layers: &[Layer], precision: Precision, input: &[f64]) -> Vec<f64> {
    let mut scratch = ForwardScratch::new();
    forward_into(layers, precision, input, &mut scratch);
    scratch.cur
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_validates_buffer_sizes() {
        assert!(Layer::new(2, 3, Activation::Identity, vec![0.0; 6], vec![0.0; 2]).is_ok());
        assert!(Layer::new(2, 3, Activation::Identity, vec![0.0; 5], vec![0.0; 2]).is_err());
        assert!(Layer::new(2, 3, Activation::Identity, vec![0.0; 6], vec![0.0; 3]).is_err());
        assert!(Layer::new(0, 3, Activation::Identity, vec![], vec![]).is_err());
    }

    #[test]
    fn identity_layer_is_affine() {
        let layer = Layer::new(
            2,
            3,
            Activation::Identity,
            vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0],
            vec![0.5, -1.0],
        )
        .unwrap();
        let out = forward(&[layer], Precision::Double, &[3.0, 4.0, 5.0]);
        assert!((out[0] - 3.5).abs() < 1e-12);
        assert!((out[1] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn relu_clamps_negatives() {
        let layer = Layer::new(
            2,
            1,
            Activation::Relu,
            vec![1.0, -1.0],
            vec![0.0, 0.0],
        )
        .unwrap();
        let out = forward(&[layer], Precision::Double, &[2.0]);
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!(out[1].abs() < 1e-12);
    }

    #[test]
    fn tanh_and_sigmoid_match_std() {
        let layer = Layer::new(1, 1, Activation::Tanh, vec![1.0], vec![0.0]).unwrap();
        let out = forward(&[layer], Precision::Double, &[0.7]);
        assert!((out[0] - 0.7f64.tanh()).abs() < 1e-12);

        let layer = Layer::new(1, 1, Activation::Sigmoid, vec![1.0], vec![0.0]).unwrap();
        let out = forward(&[layer], Precision::Double, &[0.0]);
        assert!((out[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn softmax_sums_to_one() {
        let layer = Layer::new(
            3,
            1,
            Activation::Softmax,
            vec![1.0, 2.0, 3.0],
            vec![0.0; 3],
        )
        .unwrap();
        let out = forward(&[layer], Precision::Double, &[1.0]);
        let sum: f64 = out.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(out[2] > out[1] && out[1] > out[0]);
    }

    #[test]
    fn stacked_layers_chain_dimensions() {
        let l1 = Layer::new(
            2,
            3,
            Activation::Relu,
            vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0],
            vec![0.0, 0.0],
        )
        .unwrap();
        let l2 = Layer::new(1, 2, Activation::Identity, vec![1.0, 1.0], vec![0.25]).unwrap();
        let out = forward(&[l1, l2], Precision::Double, &[1.0, 2.0, 3.0]);
        // Layer 1: [6, 0]; layer 2: 6 + 0 + 0.25.
        assert_eq!(out.len(), 1);
        assert!((out[0] - 6.25).abs() < 1e-12);
    }

    #[test]
    fn single_precision_rounds_like_f32() {
        let w = 0.1;
        let b = 0.3;
        let x = 2.0;
        let layer = Layer::new(1, 1, Activation::Tanh, vec![w], vec![b]).unwrap();
        let out = forward(&[layer], Precision::Single, &[x]);
        let expected = ((b as f32) + (w as f32) * (x as f32)).tanh() as f64;
        assert_eq!(out[0], expected);
    }
}
