//! Per-step diagnostics of the particle filter: effective sample size, weight concentration,
//! an estimate of the incremental log-evidence and a summary of the raw scores.

use core::fmt;
use ndarray::{Array1, ArrayView1};
use ndarray_stats::QuantileExt;
use std::cmp::Ordering;

use crate::math::log_sum_exp;
use crate::reweight::effective_sample_size;

/// Summary statistics of a sample of scalars.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct BasicStats {
    pub name: String,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// Computes basic statistics of the finite entries of `data`.
///
/// Returns NaN fields when `data` holds no finite entry.
pub fn basic_stats(name: &str, data: ArrayView1<f64>) -> BasicStats {
    let mut finite: Array1<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return BasicStats {
            name: name.to_string(),
            min: f64::NAN,
            median: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            std: f64::NAN,
        };
    }
    let min = *finite.min_skipnan();
    let max = *finite.max_skipnan();
    if let Some(values) = finite.as_slice_mut() {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    }
    let median = finite[finite.len() / 2];
    let mean = finite.mean().unwrap_or(f64::NAN);
    let std = if finite.len() > 1 { finite.std(1.0) } else { 0.0 };
    BasicStats {
        name: name.to_string(),
        min,
        median,
        max,
        mean,
        std,
    }
}

impl fmt::Display for BasicStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in [{:.3}, {:.3}], median: {:.3}, mean: {:.3} ± {:.3}",
            self.name, self.min, self.max, self.median, self.mean, self.std
        )
    }
}

/// Diagnostics of one completed reweighting step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepStats {
    /// Zero-based index of the step within the session (or time block within a fit).
    pub step: usize,
    /// Rows in the scored batch.
    pub n_samples: usize,
    /// Effective sample size `1 / Σ wᵢ²` before resampling.
    pub ess: f64,
    /// Largest normalized weight.
    pub max_weight: f64,
    /// `ln(mean(exp(score)))`, the log of the mean unnormalized weight.
    pub log_mean_weight: f64,
    /// Summary of the raw log-domain scores.
    pub scores: BasicStats,
}

impl StepStats {
    pub fn new(
        step: usize,
        n_samples: usize,
        scores: ArrayView1<f64>,
        weights: ArrayView1<f64>,
    ) -> Self {
        let raw: Vec<f64> = scores.iter().copied().collect();
        let log_mean_weight = log_sum_exp(&raw) - (raw.len() as f64).ln();
        let max_weight = weights.max_skipnan();
        Self {
            step,
            n_samples,
            ess: effective_sample_size(weights),
            max_weight: *max_weight,
            log_mean_weight,
            scores: basic_stats("score", scores),
        }
    }

    /// ESS as a fraction of the population size.
    pub fn relative_ess(&self, n_particles: usize) -> f64 {
        self.ess / n_particles.max(1) as f64
    }
}

impl fmt::Display for StepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({} rows): ESS≈{:.1}, max(w)≈{:.3}, log-mean-weight≈{:.3}\n{}",
            self.step, self.n_samples, self.ess, self.max_weight, self.log_mean_weight, self.scores
        )
    }
}
