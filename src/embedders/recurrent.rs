//! Recurrent description encoder
//!
//! Loads pre-trained weights from JSON and steps an Elman or GRU cell over
//! word vectors, followed by a linear projection to the output space.
//!
//! ## Weights file
//!
//! ```json
//! {
//!   "cell": "gru",
//!   "input_size": 100,
//!   "hidden_size": 64,
//!   "output_size": 100,
//!   "weight_ih": [[...]],
//!   "weight_hh": [[...]],
//!   "bias_ih": [...],
//!   "bias_hh": [...],
//!   "weight_out": [[...]],
//!   "bias_out": [...]
//! }
//! ```
//!
//! GRU gate rows are stacked reset, update, new (PyTorch layout), so the
//! input/hidden matrices have `3 * hidden_size` rows. An Elman cell has
//! `hidden_size` rows.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::traits::{EncodeError, HiddenState, SequenceModel};

/// Recurrent cell type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// `h' = tanh(W_ih x + b_ih + W_hh h + b_hh)`
    Elman,
    /// Gated recurrent unit
    Gru,
}

impl CellKind {
    /// Stacked gate count in the weight matrices
    pub fn gates(&self) -> usize {
        match self {
            Self::Elman => 1,
            Self::Gru => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Elman => "elman",
            Self::Gru => "gru",
        }
    }
}

/// Serialized weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrentWeights {
    pub cell: CellKind,
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub weight_ih: Vec<Vec<f32>>,
    pub weight_hh: Vec<Vec<f32>>,
    pub bias_ih: Vec<f32>,
    pub bias_hh: Vec<f32>,
    pub weight_out: Vec<Vec<f32>>,
    pub bias_out: Vec<f32>,
}

impl RecurrentWeights {
    /// Check every matrix against the declared sizes
    pub fn validate(&self) -> Result<()> {
        let gate_rows = self.cell.gates() * self.hidden_size;

        check_matrix("weight_ih", &self.weight_ih, gate_rows, self.input_size)?;
        check_matrix("weight_hh", &self.weight_hh, gate_rows, self.hidden_size)?;
        check_vector("bias_ih", &self.bias_ih, gate_rows)?;
        check_vector("bias_hh", &self.bias_hh, gate_rows)?;
        check_matrix("weight_out", &self.weight_out, self.output_size, self.hidden_size)?;
        check_vector("bias_out", &self.bias_out, self.output_size)?;

        if self.hidden_size == 0 {
            anyhow::bail!("hidden_size must be greater than zero");
        }
        Ok(())
    }
}

fn check_matrix(name: &str, m: &[Vec<f32>], rows: usize, cols: usize) -> Result<()> {
    if m.len() != rows {
        anyhow::bail!("{} has {} rows, expected {}", name, m.len(), rows);
    }
    if let Some((i, row)) = m.iter().enumerate().find(|(_, r)| r.len() != cols) {
        anyhow::bail!("{} row {} has {} columns, expected {}", name, i, row.len(), cols);
    }
    Ok(())
}

fn check_vector(name: &str, v: &[f32], len: usize) -> Result<()> {
    if v.len() != len {
        anyhow::bail!("{} has length {}, expected {}", name, v.len(), len);
    }
    Ok(())
}

/// `W[rows] x + b[rows]` for a contiguous block of rows
fn affine(weights: &[Vec<f32>], bias: &[f32], x: &[f32], rows: std::ops::Range<usize>) -> Vec<f32> {
    rows.map(|r| {
        weights[r].iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + bias[r]
    })
    .collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Pre-trained recurrent encoder, loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct RecurrentEncoder {
    weights: RecurrentWeights,
}

impl RecurrentEncoder {
    pub fn new(weights: RecurrentWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let weights: RecurrentWeights =
            serde_json::from_str(json).context("Failed to parse encoder weights")?;
        Self::new(weights)
    }

    pub fn cell(&self) -> CellKind {
        self.weights.cell
    }

    pub fn hidden_size(&self) -> usize {
        self.weights.hidden_size
    }

    fn next_hidden(&self, x: &[f32], h: &[f32]) -> Vec<f32> {
        let w = &self.weights;
        let hs = w.hidden_size;

        match w.cell {
            CellKind::Elman => {
                let xi = affine(&w.weight_ih, &w.bias_ih, x, 0..hs);
                let hh = affine(&w.weight_hh, &w.bias_hh, h, 0..hs);
                xi.iter().zip(&hh).map(|(a, b)| (a + b).tanh()).collect()
            }
            CellKind::Gru => {
                let xi = affine(&w.weight_ih, &w.bias_ih, x, 0..3 * hs);
                let hh = affine(&w.weight_hh, &w.bias_hh, h, 0..3 * hs);
                (0..hs)
                    .map(|j| {
                        let r = sigmoid(xi[j] + hh[j]);
                        let z = sigmoid(xi[hs + j] + hh[hs + j]);
                        let n = (xi[2 * hs + j] + r * hh[2 * hs + j]).tanh();
                        (1.0 - z) * n + z * h[j]
                    })
                    .collect()
            }
        }
    }
}

impl SequenceModel for RecurrentEncoder {
    fn input_size(&self) -> usize {
        self.weights.input_size
    }

    fn output_size(&self) -> usize {
        self.weights.output_size
    }

    fn init_hidden(&self) -> HiddenState {
        HiddenState::zeros(self.weights.hidden_size)
    }

    fn step(&self, input: &[f32], hidden: &HiddenState) -> Result<(Vec<f32>, HiddenState), EncodeError> {
        if input.len() != self.weights.input_size {
            return Err(EncodeError::DimensionMismatch {
                expected: self.weights.input_size,
                actual: input.len(),
            });
        }
        if hidden.0.len() != self.weights.hidden_size {
            return Err(EncodeError::EncoderRuntimeFault(format!(
                "hidden state has {} units, expected {}",
                hidden.0.len(),
                self.weights.hidden_size
            )));
        }

        let next = self.next_hidden(input, hidden.as_slice());
        let output = affine(
            &self.weights.weight_out,
            &self.weights.bias_out,
            &next,
            0..self.weights.output_size,
        );
        Ok((output, HiddenState(next)))
    }
}

/// Load encoder weights from a JSON file
pub fn load_recurrent_encoder(path: &Path) -> Result<RecurrentEncoder> {
    tracing::info!("Loading description encoder from {:?}", path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read encoder weights: {:?}", path))?;
    let encoder = RecurrentEncoder::from_json(&content)
        .with_context(|| format!("Invalid encoder weights: {:?}", path))?;
    tracing::info!(
        "Loaded {} encoder ({} -> {} hidden -> {})",
        encoder.cell().name(),
        encoder.input_size(),
        encoder.hidden_size(),
        encoder.output_size()
    );
    Ok(encoder)
}
