/*!
Label bookkeeping and the scoring primitives used by the likelihood.

[`LabelSet`] is the sorted, de-duplicated set of class labels seen at initialization; class
indices used throughout the crate are positions in this set. [`cross_entropy`] is the mean
negative log-likelihood of the true labels under a matrix of predicted probabilities.
*/

use ndarray::{ArrayView1, ArrayView2};

use crate::error::{Result, SmcError};

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logarithms.
pub const PROB_EPS: f64 = 1e-15;

/// Sorted, distinct class labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSet {
    labels: Vec<i64>,
}

impl LabelSet {
    /// Builds a label set from arbitrary labels; needs at least two distinct values.
    pub fn new(labels: &[i64]) -> Result<Self> {
        let mut labels = labels.to_vec();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() < 2 {
            return Err(SmcError::Configuration(format!(
                "label set needs at least two distinct labels, got {labels:?}"
            )));
        }
        Ok(Self { labels })
    }

    /// The distinct values of `y`.
    pub fn from_targets(y: ArrayView1<i64>) -> Result<Self> {
        Self::new(&y.to_vec())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_binary(&self) -> bool {
        self.labels.len() == 2
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> i64 {
        self.labels[index]
    }

    pub fn index_of(&self, label: i64) -> Option<usize> {
        self.labels.binary_search(&label).ok()
    }

    /// Maps every target to its class index, rejecting labels outside the set.
    ///
    /// A batch may hold only a subset of the classes.
    pub fn encode(&self, y: ArrayView1<i64>) -> Result<Vec<usize>> {
        y.iter()
            .map(|&label| {
                self.index_of(label).ok_or_else(|| {
                    SmcError::ShapeMismatch(format!(
                        "label {label} is not in the label set {:?}",
                        self.labels
                    ))
                })
            })
            .collect()
    }
}

/// Mean negative log-likelihood of `y` under `probs`.
///
/// `probs` is either `n × 1` (probability of the second label of a binary set) or
/// `n × labels.len()`.
pub fn cross_entropy(y: ArrayView1<i64>, probs: ArrayView2<f64>, labels: &LabelSet) -> Result<f64> {
    let encoded = labels.encode(y)?;
    cross_entropy_encoded(&encoded, probs)
}

/// [`cross_entropy`] for targets already mapped to class indices.
pub(crate) fn cross_entropy_encoded(classes: &[usize], probs: ArrayView2<f64>) -> Result<f64> {
    if probs.nrows() != classes.len() {
        return Err(SmcError::ShapeMismatch(format!(
            "{} targets but {} probability rows",
            classes.len(),
            probs.nrows()
        )));
    }
    if classes.is_empty() {
        return Err(SmcError::ShapeMismatch(
            "cannot score an empty batch".to_string(),
        ));
    }
    let collapsed = probs.ncols() == 1;
    let mut total = 0.0;
    for (row, &class) in probs.rows().into_iter().zip(classes) {
        let p = if collapsed {
            match class {
                0 => 1.0 - row[0],
                1 => row[0],
                _ => {
                    return Err(SmcError::ShapeMismatch(format!(
                        "class index {class} in a single-output binary problem"
                    )))
                }
            }
        } else if class < row.len() {
            row[class]
        } else {
            return Err(SmcError::ShapeMismatch(format!(
                "class index {class} but only {} probability columns",
                row.len()
            )));
        };
        total -= p.clamp(PROB_EPS, 1.0 - PROB_EPS).ln();
    }
    Ok(total / classes.len() as f64)
}

/// Fraction of positions where `predicted == truth`.
pub fn accuracy(truth: ArrayView1<i64>, predicted: ArrayView1<i64>) -> Result<f64> {
    if truth.len() != predicted.len() {
        return Err(SmcError::ShapeMismatch(format!(
            "{} targets but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    if truth.is_empty() {
        return Ok(0.0);
    }
    let hits = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(a, b)| a == b)
        .count();
    Ok(hits as f64 / truth.len() as f64)
}
