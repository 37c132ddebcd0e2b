/*!
# Multinomial Resampling.

Draws `N` offspring counts from `Multinomial(N, w)` and replicates every particle by its
count. Counts are produced by sequential conditional binomials: particle `i` receives
`Binomial(remaining, wᵢ / Σ_{j ≥ i} wⱼ)` offspring, and the last particle with positive
weight takes whatever is left, so the counts always sum to exactly `N`.
*/

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Binomial, Distribution};

use crate::error::{Result, SmcError};

fn check_weights(weights: ArrayView1<f64>) -> Result<()> {
    if weights.is_empty() {
        return Err(SmcError::ShapeMismatch(
            "cannot resample an empty population".to_string(),
        ));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(SmcError::NumericDegeneracy(
            "weights must be finite and non-negative".to_string(),
        ));
    }
    if weights.sum() <= 0.0 {
        return Err(SmcError::NumericDegeneracy(
            "weights carry no probability mass".to_string(),
        ));
    }
    Ok(())
}

/// Offspring counts for `n` draws with probabilities `weights`.
pub fn multinomial_counts<R: Rng + ?Sized>(
    n: usize,
    weights: ArrayView1<f64>,
    rng: &mut R,
) -> Result<Vec<usize>> {
    check_weights(weights)?;
    let len = weights.len();
    let mut counts = vec![0_usize; len];
    // Index of the last particle that can receive offspring.
    let last = weights
        .iter()
        .rposition(|&w| w > 0.0)
        .unwrap_or(len - 1);

    let mut tail = vec![0.0; len + 1];
    for i in (0..len).rev() {
        tail[i] = tail[i + 1] + weights[i];
    }

    let mut remaining = n as u64;
    for i in 0..=last {
        if remaining == 0 {
            break;
        }
        if i == last {
            counts[i] = remaining as usize;
            break;
        }
        let w = weights[i];
        if w == 0.0 {
            continue;
        }
        let p = (w / tail[i]).clamp(0.0, 1.0);
        let k = Binomial::new(remaining, p)
            .map_err(|e| SmcError::NumericDegeneracy(format!("invalid binomial draw: {e}")))?
            .sample(rng);
        counts[i] = k as usize;
        remaining -= k;
    }
    Ok(counts)
}

/// Particle indices of the resampled population, in ascending order.
pub fn resample_indices<R: Rng + ?Sized>(
    weights: ArrayView1<f64>,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let counts = multinomial_counts(weights.len(), weights, rng)?;
    Ok(counts
        .iter()
        .enumerate()
        .flat_map(|(i, &c)| std::iter::repeat(i).take(c))
        .collect())
}

/// Resamples `population` (rows are particles) according to `weights`.
///
/// The output has exactly as many rows as the input.
pub fn resample<R: Rng + ?Sized>(
    weights: ArrayView1<f64>,
    population: ArrayView2<f64>,
    rng: &mut R,
) -> Result<Array2<f64>> {
    if weights.len() != population.nrows() {
        return Err(SmcError::ShapeMismatch(format!(
            "{} weights for {} particles",
            weights.len(),
            population.nrows()
        )));
    }
    let indices = resample_indices(weights, rng)?;
    Ok(population.select(Axis(0), &indices))
}
