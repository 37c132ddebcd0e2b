/*!
# Fitted Models and Prediction.

A [`FittedModel`] is an immutable snapshot produced at the end of every completed SMC step.
It holds either one global [`Coefficients`] pair or, after a time-indexed fit, one pair per
time block together with the key → block map used to route rows at prediction time.

All prediction methods take `&self`: calling them twice with the same inputs returns the same
output.
*/

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;

use crate::aggregate::Coefficients;
use crate::error::{Result, SmcError};
use crate::likelihood::{link, linear_scores, ParticleLayout};
use crate::math::sigmoid;
use crate::metrics::{accuracy, LabelSet};

/// Coefficients of a fitted model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelCoefficients {
    /// One pair shared by every row.
    Global(Coefficients),
    /// One pair per time block, in ascending key order.
    TimeIndexed {
        blocks: Vec<Coefficients>,
        index: BTreeMap<i64, usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    labels: LabelSet,
    layout: ParticleLayout,
    coefficients: ModelCoefficients,
}

impl FittedModel {
    pub fn global(labels: LabelSet, layout: ParticleLayout, coefficients: Coefficients) -> Self {
        Self {
            labels,
            layout,
            coefficients: ModelCoefficients::Global(coefficients),
        }
    }

    /// `keys[i]` is the time key of `blocks[i]`.
    pub fn time_indexed(
        labels: LabelSet,
        layout: ParticleLayout,
        keys: &[i64],
        blocks: Vec<Coefficients>,
    ) -> Result<Self> {
        if keys.len() != blocks.len() || keys.is_empty() {
            return Err(SmcError::ShapeMismatch(format!(
                "{} time keys for {} coefficient blocks",
                keys.len(),
                blocks.len()
            )));
        }
        let index = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        Ok(Self {
            labels,
            layout,
            coefficients: ModelCoefficients::TimeIndexed { blocks, index },
        })
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn layout(&self) -> &ParticleLayout {
        &self.layout
    }

    pub fn coefficients(&self) -> &ModelCoefficients {
        &self.coefficients
    }

    pub fn is_time_indexed(&self) -> bool {
        matches!(self.coefficients, ModelCoefficients::TimeIndexed { .. })
    }

    /// Coefficient matrix of a global model.
    pub fn coef(&self) -> Option<&Array2<f64>> {
        match &self.coefficients {
            ModelCoefficients::Global(c) => Some(&c.coef),
            ModelCoefficients::TimeIndexed { .. } => None,
        }
    }

    /// Intercepts of a global model.
    pub fn intercept(&self) -> Option<&Array1<f64>> {
        match &self.coefficients {
            ModelCoefficients::Global(c) => Some(&c.intercept),
            ModelCoefficients::TimeIndexed { .. } => None,
        }
    }

    /// Time keys of a time-indexed model in ascending order; empty for global models.
    pub fn time_keys(&self) -> Vec<i64> {
        match &self.coefficients {
            ModelCoefficients::Global(_) => Vec::new(),
            ModelCoefficients::TimeIndexed { index, .. } => index.keys().copied().collect(),
        }
    }

    /// Coefficients used for rows carrying time key `key`.
    pub fn block(&self, key: i64) -> Result<&Coefficients> {
        match &self.coefficients {
            ModelCoefficients::Global(c) => Ok(c),
            ModelCoefficients::TimeIndexed { blocks, index } => index
                .get(&key)
                .map(|&i| &blocks[i])
                .ok_or_else(|| SmcError::TimeKey(format!("time key {key} was not seen during fit"))),
        }
    }

    /// Linear scores `X · coefᵀ + intercept`, one column per output.
    ///
    /// Time-indexed models need one key per row; global models ignore `t`.
    pub fn decision_function(&self, x: ArrayView2<f64>, t: Option<&[i64]>) -> Result<Array2<f64>> {
        self.layout.check_features(x)?;
        match &self.coefficients {
            ModelCoefficients::Global(c) => {
                Ok(linear_scores(x, c.coef.view(), c.intercept.view()))
            }
            ModelCoefficients::TimeIndexed { .. } => {
                let t = t.ok_or_else(|| {
                    SmcError::TimeKey("time-indexed model needs one time key per row".to_string())
                })?;
                if t.len() != x.nrows() {
                    return Err(SmcError::ShapeMismatch(format!(
                        "{} rows but {} time keys",
                        x.nrows(),
                        t.len()
                    )));
                }
                let mut z = Array2::zeros((x.nrows(), self.layout.n_outputs));
                for ((row, mut out), &key) in x
                    .axis_iter(Axis(0))
                    .zip(z.axis_iter_mut(Axis(0)))
                    .zip(t.iter())
                {
                    let c = self.block(key)?;
                    out.assign(&(c.coef.dot(&row) + &c.intercept));
                }
                Ok(z)
            }
        }
    }

    /// Class probabilities, one column per label.
    pub fn predict_proba(&self, x: ArrayView2<f64>, t: Option<&[i64]>) -> Result<Array2<f64>> {
        let z = self.decision_function(x, t)?;
        if self.layout.is_collapsed() {
            let mut probs = Array2::zeros((z.nrows(), 2));
            for (mut out, &zi) in probs.axis_iter_mut(Axis(0)).zip(z.column(0).iter()) {
                let p = sigmoid(zi);
                out[0] = 1.0 - p;
                out[1] = p;
            }
            Ok(probs)
        } else {
            Ok(link(z))
        }
    }

    /// Predicted labels: the second label iff the single linear score is positive, otherwise
    /// the label with the largest score.
    pub fn predict(&self, x: ArrayView2<f64>, t: Option<&[i64]>) -> Result<Array1<i64>> {
        let z = self.decision_function(x, t)?;
        if self.layout.is_collapsed() {
            return Ok(z
                .column(0)
                .mapv(|zi| self.labels.label(usize::from(zi > 0.0))));
        }
        z.axis_iter(Axis(0))
            .map(|row| {
                row.argmax()
                    .map(|k| self.labels.label(k))
                    .map_err(|e| SmcError::NumericDegeneracy(format!("argmax failed: {e}")))
            })
            .collect()
    }

    /// Mean accuracy on `(x, y)`. Labels unseen at fit time are a shape mismatch.
    pub fn score(&self, x: ArrayView2<f64>, y: ArrayView1<i64>, t: Option<&[i64]>) -> Result<f64> {
        self.labels.encode(y)?;
        let predicted = self.predict(x, t)?;
        accuracy(y, predicted.view())
    }
}
