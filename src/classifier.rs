//! Estimator-style capability interface.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::Result;
use crate::session::SmcSession;

/// A probabilistic classifier that can be fitted in one call or refined batch by batch.
pub trait Classifier {
    /// Fits from scratch on `(x, y)`.
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<()>;

    /// Refines the current fit with one more batch.
    fn partial_fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<()>;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<i64>>;

    /// One column per class, rows sum to one.
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>>;
}

impl Classifier for SmcSession {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<()> {
        SmcSession::fit(self, x, y).map(|_| ())
    }

    /// Requires a prior call to [`SmcSession::initialize`] or [`Classifier::fit`].
    fn partial_fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<()> {
        self.update(x, y).map(|_| ())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<i64>> {
        SmcSession::predict(self, x, None)
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        SmcSession::predict_proba(self, x, None)
    }
}
