/*!
Numerically stable link functions.

Generic over the floating-point precision via [`num_traits::Float`], so the same kernels serve
the scorer (which works in `f64`) and any caller holding `f32` data.
*/

use ndarray::{ArrayViewMut1, ArrayViewMut2, Axis};
use num_traits::Float;

/// Logistic function evaluated without overflowing `exp` for large `|z|`.
#[inline]
pub fn sigmoid<T: Float>(z: T) -> T {
    if z >= T::zero() {
        T::one() / (T::one() + (-z).exp())
    } else {
        let e = z.exp();
        e / (T::one() + e)
    }
}

/// `ln(sum(exp(v)))` with max subtraction. Returns `-inf` for an empty slice.
pub fn log_sum_exp<T: Float>(values: &[T]) -> T {
    let max = values
        .iter()
        .cloned()
        .fold(T::neg_infinity(), |acc, v| if v > acc { v } else { acc });
    if !max.is_finite() {
        return max;
    }
    let sum = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - max).exp());
    max + sum.ln()
}

/// Replaces `row` with its softmax, subtracting the maximum before exponentiation.
pub fn softmax_inplace<T: Float>(mut row: ArrayViewMut1<T>) {
    let max = row
        .iter()
        .cloned()
        .fold(T::neg_infinity(), |acc, v| if v > acc { v } else { acc });
    row.mapv_inplace(|v| (v - max).exp());
    let sum = row.iter().fold(T::zero(), |acc, &v| acc + v);
    row.mapv_inplace(|v| v / sum);
}

/// Row-wise softmax of a `samples × classes` logit matrix.
pub fn softmax_rows<T: Float>(mut logits: ArrayViewMut2<T>) {
    for row in logits.axis_iter_mut(Axis(0)) {
        softmax_inplace(row);
    }
}

/// Plain dot product of two equally long slices.
#[inline]
pub fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}
