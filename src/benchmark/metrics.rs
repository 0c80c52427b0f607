//! Vector metrics for embedding evaluation
//!
//! Distance, cosine similarity, normalization and the summary statistics used
//! by the report.
//!
//! ## Degenerate inputs
//!
//! - Cosine similarity against a zero-magnitude vector is `0.0`, never NaN.
//! - `normalize` refuses zero-magnitude and non-finite vectors instead of
//!   dividing by zero.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const BOOTSTRAP_SEED: u64 = 0x5eed;

/// Euclidean (L2) magnitude
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Unit-length copy of `v`, or `None` when the magnitude is zero or not finite
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// L2 norm of `a - b`
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

pub fn has_nan(v: &[f32]) -> bool {
    v.iter().any(|x| x.is_nan())
}

/// Elementwise mean of equally sized rows, `None` for no rows
pub fn mean_rows(rows: &[&[f32]]) -> Option<Vec<f32>> {
    let first = rows.first()?;
    let mut sum = vec![0.0f32; first.len()];
    for row in rows {
        for (s, x) in sum.iter_mut().zip(row.iter()) {
            *s += x;
        }
    }
    let n = rows.len() as f32;
    Some(sum.into_iter().map(|s| s / n).collect())
}

/// Bootstrap confidence interval
#[derive(Debug, Clone)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: f64,
}

/// Bootstrap confidence interval calculation
///
/// Resampling uses a fixed-seed generator so repeated reports over the same
/// values agree.
pub fn bootstrap_confidence_interval(values: &[f64], confidence_level: f64, n_bootstrap: usize) -> ConfidenceInterval {
    if values.is_empty() || n_bootstrap == 0 {
        return ConfidenceInterval {
            mean: 0.0,
            lower: 0.0,
            upper: 0.0,
            confidence_level,
        };
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;

    let mut rng = ChaCha8Rng::seed_from_u64(BOOTSTRAP_SEED);
    let mut bootstrap_means: Vec<f64> = Vec::with_capacity(n_bootstrap);
    for _ in 0..n_bootstrap {
        let sum: f64 = (0..n).map(|_| values[rng.gen_range(0..n)]).sum();
        bootstrap_means.push(sum / n as f64);
    }

    bootstrap_means.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let alpha = 1.0 - confidence_level;
    let lower_idx = ((alpha / 2.0) * n_bootstrap as f64) as usize;
    let upper_idx = ((1.0 - alpha / 2.0) * n_bootstrap as f64) as usize;

    ConfidenceInterval {
        mean,
        lower: bootstrap_means.get(lower_idx).copied().unwrap_or(mean),
        upper: bootstrap_means.get(upper_idx.min(n_bootstrap - 1)).copied().unwrap_or(mean),
        confidence_level,
    }
}

/// Calculate standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
