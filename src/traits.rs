//! The estimator capability contract consumed by the grid search.
//!
//! The required methods mirror the fit/predict convention; the optional
//! capabilities (seeding, native scoring, weighted scoring, probability
//! output) default to "absent" and are queried through ordinary trait
//! dispatch, never through runtime reflection.

use crate::error::Result;
use crate::grid::ParamSet;
use crate::primitives::{Matrix, Vector};

/// A supervised estimator that can be configured with named parameters.
///
/// Grid search additionally requires `Clone + Send + Sync`: the template is
/// shared immutably across workers and every worker fits its own private
/// clone, so no synchronization is needed between jobs.
///
/// # Examples
///
/// ```
/// use afinar::prelude::*;
///
/// #[derive(Clone)]
/// struct Threshold {
///     cutoff: f32,
/// }
///
/// impl Estimator for Threshold {
///     fn set_params(&mut self, params: &ParamSet) -> afinar::error::Result<()> {
///         if let Some(c) = params.get_f64("cutoff") {
///             self.cutoff = c as f32;
///         }
///         Ok(())
///     }
///
///     fn fit(&mut self, _x: &Matrix<f32>, _y: &Vector<f32>) -> afinar::error::Result<()> {
///         Ok(())
///     }
///
///     fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
///         let labels: Vec<f32> = (0..x.n_rows())
///             .map(|i| if x.get(i, 0) > self.cutoff { 1.0 } else { 0.0 })
///             .collect();
///         Vector::from_vec(labels)
///     }
/// }
/// ```
pub trait Estimator {
    /// Applies one concrete parameter setting to this estimator.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter name or value is not accepted.
    fn set_params(&mut self, params: &ParamSet) -> Result<()>;

    /// Fits the estimator to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (dimension mismatch, divergence,
    /// invalid hyperparameter, etc.). Inside a grid search job the error is
    /// isolated; it never aborts sibling jobs.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()>;

    /// Predicts labels for input data.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32>;

    /// Seeds the estimator's internal randomness.
    ///
    /// Stochastic estimators should override this so that every parameter
    /// setting is compared under the same randomness. The default is a no-op
    /// for deterministic estimators.
    fn set_seed(&mut self, _seed: u64) {}

    /// Native scoring capability (higher is better).
    ///
    /// Returns `None` when the estimator has no scorer of its own, in which
    /// case the search falls back to classification accuracy of
    /// [`predict`](Estimator::predict) against the true labels.
    fn score(&self, _x: &Matrix<f32>, _y: &Vector<f32>) -> Option<f32> {
        None
    }

    /// Native scoring capability that accepts per-sample weights.
    ///
    /// Returns `None` when the estimator's scorer does not take weights;
    /// callers then retry the unweighted [`score`](Estimator::score).
    fn score_weighted(
        &self,
        _x: &Matrix<f32>,
        _y: &Vector<f32>,
        _sample_weight: &Vector<f32>,
    ) -> Option<f32> {
        None
    }

    /// Per-class probability output, one row per sample.
    ///
    /// Returns `None` when the estimator cannot produce probabilities.
    fn predict_proba(&self, _x: &Matrix<f32>) -> Option<Matrix<f32>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AfinarError;

    // Mock estimator exercising the default capability methods.
    #[derive(Clone)]
    struct MockClassifier {
        label: f32,
        fitted: bool,
    }

    impl MockClassifier {
        fn new() -> Self {
            Self {
                label: 0.0,
                fitted: false,
            }
        }
    }

    impl Estimator for MockClassifier {
        fn set_params(&mut self, params: &ParamSet) -> Result<()> {
            match params.get_f64("label") {
                Some(v) => {
                    self.label = v as f32;
                    Ok(())
                }
                None => Err(AfinarError::estimator("unknown parameter")),
            }
        }

        fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
            if x.n_rows() != y.len() {
                return Err(AfinarError::estimator("x/y length mismatch"));
            }
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
            Vector::from_vec(vec![self.label; x.n_rows()])
        }
    }

    #[test]
    fn test_default_capabilities_absent() {
        let model = MockClassifier::new();
        let x = Matrix::zeros(2, 1);
        let y = Vector::from_slice(&[0.0, 1.0]);
        assert!(model.score(&x, &y).is_none());
        assert!(model
            .score_weighted(&x, &y, &Vector::from_slice(&[1.0, 1.0]))
            .is_none());
        assert!(model.predict_proba(&x).is_none());
    }

    #[test]
    fn test_set_seed_default_noop() {
        let mut model = MockClassifier::new();
        model.set_seed(42);
        assert_eq!(model.label, 0.0);
    }

    #[test]
    fn test_set_params_applies_values() {
        let mut model = MockClassifier::new();
        let params = ParamSet::new().with("label", 1.0);
        model.set_params(&params).expect("set_params");
        assert_eq!(model.label, 1.0);
    }

    #[test]
    fn test_set_params_rejects_unknown() {
        let mut model = MockClassifier::new();
        let params = ParamSet::new().with("unknown", 1.0);
        assert!(model.set_params(&params).is_err());
    }

    #[test]
    fn test_fit_dimension_mismatch() {
        let mut model = MockClassifier::new();
        let x = Matrix::zeros(3, 1);
        let y = Vector::from_slice(&[0.0, 1.0]);
        assert!(model.fit(&x, &y).is_err());
        assert!(!model.fitted);
    }
}
