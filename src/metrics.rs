//! Fallback scoring metrics.
//!
//! When an estimator has no native scoring capability, the grid search scores
//! it by classification accuracy of its predictions against the true labels.

use crate::primitives::Vector;

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`. Empty inputs score
/// 0.0 rather than panicking so a degenerate validation set cannot take down
/// a worker.
///
/// # Examples
///
/// ```
/// use afinar::metrics::accuracy;
/// use afinar::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[0.0, 1.0, 1.0, 0.0]);
/// let y_pred = Vector::from_slice(&[0.0, 1.0, 0.0, 0.0]);
/// assert!((accuracy(&y_true, &y_pred) - 0.75).abs() < 1e-6);
/// ```
#[must_use]
pub fn accuracy(y_true: &Vector<f32>, y_pred: &Vector<f32>) -> f32 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f32 / n as f32
}

/// Compute classification accuracy with per-sample weights.
///
/// Each correct prediction contributes its weight; the result is the weighted
/// fraction of correct predictions. Zero total weight scores 0.0.
///
/// # Examples
///
/// ```
/// use afinar::metrics::weighted_accuracy;
/// use afinar::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[0.0, 1.0]);
/// let y_pred = Vector::from_slice(&[0.0, 0.0]);
/// let w = Vector::from_slice(&[3.0, 1.0]);
/// assert!((weighted_accuracy(&y_true, &y_pred, &w) - 0.75).abs() < 1e-6);
/// ```
#[must_use]
pub fn weighted_accuracy(y_true: &Vector<f32>, y_pred: &Vector<f32>, weights: &Vector<f32>) -> f32 {
    let n = y_true.len().min(y_pred.len()).min(weights.len());
    if n == 0 {
        return 0.0;
    }
    let mut correct = 0.0_f32;
    let mut total = 0.0_f32;
    for i in 0..n {
        total += weights[i];
        if y_true[i] == y_pred[i] {
            correct += weights[i];
        }
    }
    if total == 0.0 {
        return 0.0;
    }
    correct / total
}
