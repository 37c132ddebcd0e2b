/*!
# Penalized Log-Likelihood of a Particle.

A particle is a flat vector holding one row per model output. Each row stores the feature
coefficients followed (when intercepts are fitted) by the intercept. Binary problems collapse
to a single output passed through the sigmoid; multi-class problems, or binary problems with
the multinomial parameterization forced on, use one output per class and a row-wise softmax.

The importance score of a particle `θ` on a batch `(X, y)` is

```text
score(θ) = -CrossEntropy(y, p(X; θ)) - α · θᵀθ
```

Larger scores mean more plausible particles; scores are unnormalized log-weights.
*/

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{Result, SmcError};
use crate::math::{dot, sigmoid, softmax_rows};
use crate::metrics::{cross_entropy_encoded, LabelSet};

/// How a flat particle maps onto coefficients and intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleLayout {
    /// Number of linear outputs: 1 for the collapsed binary model, `K` otherwise.
    pub n_outputs: usize,
    pub n_features: usize,
    pub fit_intercept: bool,
}

impl ParticleLayout {
    pub fn new(
        labels: &LabelSet,
        n_features: usize,
        fit_intercept: bool,
        multinomial: bool,
    ) -> Result<Self> {
        if n_features == 0 {
            return Err(SmcError::Configuration(
                "feature count must be positive".to_string(),
            ));
        }
        let n_outputs = if labels.is_binary() && !multinomial {
            1
        } else {
            labels.len()
        };
        Ok(Self {
            n_outputs,
            n_features,
            fit_intercept,
        })
    }

    /// Entries per output row.
    pub fn row_len(&self) -> usize {
        self.n_features + usize::from(self.fit_intercept)
    }

    /// Total particle dimension.
    pub fn dim(&self) -> usize {
        self.n_outputs * self.row_len()
    }

    pub fn is_collapsed(&self) -> bool {
        self.n_outputs == 1
    }

    /// Splits a particle into `(coef, intercept)` with shapes `n_outputs × n_features` and
    /// `n_outputs`. Intercepts are zero when they are not fitted.
    pub fn split(&self, particle: ArrayView1<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
        if particle.len() != self.dim() {
            return Err(SmcError::ShapeMismatch(format!(
                "particle has {} entries, layout expects {}",
                particle.len(),
                self.dim()
            )));
        }
        let rows = Array2::from_shape_vec((self.n_outputs, self.row_len()), particle.to_vec())?;
        let coef = rows.slice(s![.., ..self.n_features]).to_owned();
        let intercept = if self.fit_intercept {
            rows.column(self.n_features).to_owned()
        } else {
            Array1::zeros(self.n_outputs)
        };
        Ok((coef, intercept))
    }

    /// Checks that a feature matrix has the width this layout was built for.
    pub fn check_features(&self, x: ArrayView2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(SmcError::ShapeMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }
}

/// `X · coefᵀ + intercept`, one column per output.
pub fn linear_scores(
    x: ArrayView2<f64>,
    coef: ArrayView2<f64>,
    intercept: ArrayView1<f64>,
) -> Array2<f64> {
    let mut z = x.dot(&coef.t());
    z += &intercept;
    z
}

/// Turns linear scores into probabilities: sigmoid for one output, softmax otherwise.
pub fn link(mut z: Array2<f64>) -> Array2<f64> {
    if z.ncols() == 1 {
        z.mapv_inplace(sigmoid);
    } else {
        softmax_rows(z.view_mut());
    }
    z
}

/// Scores particles against one validated batch.
///
/// Construction checks the batch once; [`LikelihoodScorer::score`] is then a pure function of
/// the particle and can be called from many workers at once.
#[derive(Debug, Clone)]
pub struct LikelihoodScorer<'a> {
    x: ArrayView2<'a, f64>,
    classes: Vec<usize>,
    layout: ParticleLayout,
    alpha: f64,
}

impl<'a> LikelihoodScorer<'a> {
    pub fn new(
        x: ArrayView2<'a, f64>,
        y: ArrayView1<i64>,
        labels: &LabelSet,
        layout: ParticleLayout,
        alpha: f64,
    ) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(SmcError::ShapeMismatch(format!(
                "feature matrix has {} rows but label vector has {} entries",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(SmcError::ShapeMismatch("empty batch".to_string()));
        }
        layout.check_features(x)?;
        let classes = labels.encode(y)?;
        Ok(Self {
            x,
            classes,
            layout,
            alpha,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Predicted probabilities of every batch row under `particle`.
    pub fn probabilities(&self, particle: ArrayView1<f64>) -> Result<Array2<f64>> {
        let (coef, intercept) = self.layout.split(particle)?;
        Ok(link(linear_scores(self.x, coef.view(), intercept.view())))
    }

    /// Penalized log-likelihood of `particle`.
    pub fn score(&self, particle: ArrayView1<f64>) -> Result<f64> {
        let probs = self.probabilities(particle)?;
        let loss = cross_entropy_encoded(&self.classes, probs.view())?;
        let penalty = match particle.as_slice() {
            Some(values) => dot(values, values),
            None => particle.dot(&particle),
        };
        Ok(-loss - self.alpha * penalty)
    }
}
