//! Normalization of log-domain importance scores onto the probability simplex.

use ndarray::{Array1, ArrayView1};
use ndarray_stats::QuantileExt;

use crate::error::{Result, SmcError};

/// Softmax of raw log-scores with max subtraction.
///
/// Non-finite scores get weight zero. If no score is finite there is nothing to normalize and
/// [`SmcError::NumericDegeneracy`] is returned instead of NaN weights.
///
/// ```
/// use ndarray::arr1;
/// use smc_logistic::reweight::normalize_log_weights;
///
/// let w = normalize_log_weights(arr1(&[0.0, 2.0_f64.ln()]).view()).unwrap();
/// assert!((w[1] - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn normalize_log_weights(scores: ArrayView1<f64>) -> Result<Array1<f64>> {
    if scores.is_empty() {
        return Err(SmcError::NumericDegeneracy(
            "cannot normalize an empty score vector".to_string(),
        ));
    }
    let finite = scores.mapv(|s| if s.is_finite() { s } else { f64::NAN });
    let max = match finite.max_skipnan() {
        m if m.is_finite() => *m,
        _ => {
            return Err(SmcError::NumericDegeneracy(format!(
                "none of the {} particle scores is finite",
                scores.len()
            )))
        }
    };
    let mut weights = finite.mapv(|s| if s.is_nan() { 0.0 } else { (s - max).exp() });
    let total = weights.sum();
    weights /= total;
    Ok(weights)
}

/// Effective sample size `1 / Σ wᵢ²` of a normalized weight vector.
pub fn effective_sample_size(weights: ArrayView1<f64>) -> f64 {
    let sum_sq = weights.dot(&weights);
    if sum_sq > 0.0 {
        1.0 / sum_sq
    } else {
        0.0
    }
}
