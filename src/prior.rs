//! Initial particle population drawn from an isotropic Gaussian prior.

use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{Result, SmcError};

/// Draws `n` particles of dimension `dim` from `N(0, prior_scale * I)`.
///
/// `prior_scale` is a variance. Rows of the returned array are particles. The draw consumes
/// `n * dim` standard normals from `rng` in row-major order, so equal seeds give equal
/// populations.
///
/// # Examples
/// ```
/// use rand::{rngs::SmallRng, SeedableRng};
/// use smc_logistic::prior::sample_prior;
///
/// let mut rng = SmallRng::seed_from_u64(42);
/// let population = sample_prior(3, 100, 10.0, &mut rng).unwrap();
/// assert_eq!(population.dim(), (100, 3));
/// ```
pub fn sample_prior<R: Rng + ?Sized>(
    dim: usize,
    n: usize,
    prior_scale: f64,
    rng: &mut R,
) -> Result<Array2<f64>> {
    if dim == 0 {
        return Err(SmcError::Configuration(
            "particle dimension must be positive".to_string(),
        ));
    }
    if n == 0 {
        return Err(SmcError::Configuration(
            "particle count must be positive".to_string(),
        ));
    }
    if !(prior_scale.is_finite() && prior_scale > 0.0) {
        return Err(SmcError::Configuration(format!(
            "prior_scale must be finite and positive, got {prior_scale}"
        )));
    }
    let std = prior_scale.sqrt();
    Ok(Array2::from_shape_fn((n, dim), |_| {
        let z: f64 = rng.sample(StandardNormal);
        z * std
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Axis;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_population() {
        let a = sample_prior(4, 50, 2.0, &mut SmallRng::seed_from_u64(1)).unwrap();
        let b = sample_prior(4, 50, 2.0, &mut SmallRng::seed_from_u64(1)).unwrap();
        let c = sample_prior(4, 50, 2.0, &mut SmallRng::seed_from_u64(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn moments_match_prior() {
        let population = sample_prior(2, 20_000, 4.0, &mut SmallRng::seed_from_u64(42)).unwrap();
        let mean = population.mean_axis(Axis(0)).unwrap();
        let var = population.var_axis(Axis(0), 1.0);
        assert_abs_diff_eq!(mean[0], 0.0, epsilon = 0.1);
        assert_abs_diff_eq!(mean[1], 0.0, epsilon = 0.1);
        assert_abs_diff_eq!(var[0], 4.0, epsilon = 0.2);
        assert_abs_diff_eq!(var[1], 4.0, epsilon = 0.2);
    }

    #[test]
    fn rejects_empty_shapes() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(matches!(
            sample_prior(0, 10, 1.0, &mut rng),
            Err(SmcError::Configuration(_))
        ));
        assert!(matches!(
            sample_prior(3, 0, 1.0, &mut rng),
            Err(SmcError::Configuration(_))
        ));
        assert!(sample_prior(3, 10, 0.0, &mut rng).is_err());
    }
}
