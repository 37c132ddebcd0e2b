//! Point estimates from a particle population.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, SmcError};
use crate::likelihood::ParticleLayout;

/// One coefficient matrix (`n_outputs × n_features`) and its intercepts (`n_outputs`).
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub coef: Array2<f64>,
    pub intercept: Array1<f64>,
}

/// Mean particle of `population`, split according to `layout`.
///
/// With `weights = None` every particle counts equally, which is the right reduction for a
/// freshly resampled population. Otherwise `weights` must be a normalized vector with one
/// entry per particle.
pub fn aggregate(
    weights: Option<ArrayView1<f64>>,
    population: ArrayView2<f64>,
    layout: &ParticleLayout,
) -> Result<Coefficients> {
    if population.nrows() == 0 {
        return Err(SmcError::ShapeMismatch(
            "cannot aggregate an empty population".to_string(),
        ));
    }
    let mean = match weights {
        None => population
            .mean_axis(Axis(0))
            .ok_or_else(|| SmcError::ShapeMismatch("empty population".to_string()))?,
        Some(w) => {
            if w.len() != population.nrows() {
                return Err(SmcError::ShapeMismatch(format!(
                    "{} weights for {} particles",
                    w.len(),
                    population.nrows()
                )));
            }
            let total = w.sum();
            if !(total.is_finite() && total > 0.0) {
                return Err(SmcError::NumericDegeneracy(
                    "aggregation weights carry no probability mass".to_string(),
                ));
            }
            population.t().dot(&w) / total
        }
    };
    let (coef, intercept) = layout.split(mean.view())?;
    Ok(Coefficients { coef, intercept })
}
