//! Grid search orchestration.
//!
//! [`GridSearch`] owns an estimator template plus the search configuration,
//! runs the parallel validation-set path or delegates to the cross-validated
//! search primitive, ranks the outcomes, and exposes the winning fitted model
//! through a uniform predict / predict_proba / score surface.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{AfinarError, Result};
use crate::executor::{default_num_threads, evaluate_grid, JobContext};
use crate::grid::{ParamGrid, ParamSet};
use crate::metrics::{accuracy, weighted_accuracy};
use crate::model_selection::{cross_validated_search, KFold};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

/// Everything produced by one successful `fit`, replaced atomically when
/// `fit` is re-run. `ranking` is never empty.
#[derive(Debug, Clone)]
struct SearchState {
    ranking: Vec<(ParamSet, f32)>,
}

/// Hyperparameter grid search over a pluggable estimator.
///
/// With a validation set, every parameter setting is fitted and scored in
/// parallel and failed settings are silently dropped from the ranking. Without
/// one, settings are compared by mean K-fold cross-validation score instead.
/// Either way the winning fitted model replaces the held estimator and serves
/// subsequent [`predict`](GridSearch::predict) / [`score`](GridSearch::score)
/// calls.
///
/// # Examples
///
/// ```
/// use afinar::prelude::*;
/// # use afinar::error::Result;
/// #
/// # #[derive(Clone)]
/// # struct Stub { x: i64 }
/// # impl Estimator for Stub {
/// #     fn set_params(&mut self, params: &ParamSet) -> Result<()> {
/// #         self.x = params.get_i64("x").unwrap_or(0);
/// #         Ok(())
/// #     }
/// #     fn fit(&mut self, _x: &Matrix<f32>, _y: &Vector<f32>) -> Result<()> { Ok(()) }
/// #     fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
/// #         Vector::from_vec(vec![0.0; x.n_rows()])
/// #     }
/// #     fn score(&self, _x: &Matrix<f32>, _y: &Vector<f32>) -> Option<f32> {
/// #         Some(self.x as f32)
/// #     }
/// # }
/// let x_train = Matrix::zeros(4, 1);
/// let y_train = Vector::from_slice(&[0.0, 1.0, 0.0, 1.0]);
/// let x_val = Matrix::zeros(2, 1);
/// let y_val = Vector::from_slice(&[0.0, 1.0]);
///
/// let grid = ParamGrid::new().add("x", [1, 2, 3]);
/// let mut search = GridSearch::new(Stub { x: 0 }).with_num_threads(2);
/// search.fit(&x_train, &y_train, &grid, Some((&x_val, &y_val)))?;
///
/// assert_eq!(search.get_best_params()?.get_i64("x"), Some(3));
/// assert_eq!(search.get_best_score()?, 3.0);
/// # Ok::<(), afinar::error::AfinarError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GridSearch<E> {
    model: E,
    num_threads: usize,
    cv_folds: usize,
    seed: u64,
    state: Option<SearchState>,
}

impl<E> GridSearch<E> {
    /// Create a grid search around an estimator template.
    ///
    /// Defaults: one worker per available core, 3 cross-validation folds,
    /// seed 0.
    #[must_use]
    pub fn new(model: E) -> Self {
        Self {
            model,
            num_threads: default_num_threads(),
            cv_folds: 3,
            seed: 0,
            state: None,
        }
    }

    /// Set the worker count (clamped to at least 1).
    #[must_use]
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    /// Set the number of folds for the no-validation-set path.
    #[must_use]
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// Set the fixed seed threaded through every worker task.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn state(&self) -> Result<&SearchState> {
        self.state.as_ref().ok_or(AfinarError::NotFitted)
    }
}

impl<E> GridSearch<E>
where
    E: Estimator + Clone + Send + Sync,
{
    /// Search the grid and keep the best model.
    ///
    /// When `validation` is given, every expanded setting is fitted on the
    /// training data and scored on the validation data in parallel; settings
    /// that fail are dropped from the ranking. Without a validation set the
    /// settings are compared by mean K-fold score and the winner is refitted
    /// on the full training data.
    ///
    /// On success the winning fitted model replaces the held estimator (and
    /// becomes the template for any subsequent `fit`), the ranked outcome is
    /// stored, and a reference to the model is returned. The previous search
    /// state is only replaced at the very end; a failed `fit` leaves it
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`AfinarError::InvalidGrid`] for an empty or malformed grid,
    /// [`AfinarError::NoSuccessfulJobs`] when every validation-path job
    /// failed, plus any error surfaced by the cross-validated path.
    pub fn fit(
        &mut self,
        x_train: &Matrix<f32>,
        y_train: &Vector<f32>,
        grid: &ParamGrid,
        validation: Option<(&Matrix<f32>, &Vector<f32>)>,
    ) -> Result<&E> {
        let settings = grid.expand()?;

        let (best_model, ranking) = match validation {
            Some((x_val, y_val)) => {
                debug!(
                    settings = settings.len(),
                    threads = self.num_threads,
                    "grid search on held-out validation set"
                );
                let ctx = JobContext {
                    template: &self.model,
                    x_train,
                    y_train,
                    x_val,
                    y_val,
                };
                let results = evaluate_grid(&ctx, &settings, self.num_threads, self.seed)?;
                let attempted = results.len();

                let mut survivors: Vec<(ParamSet, E, f32)> = settings
                    .into_iter()
                    .zip(results)
                    .filter_map(|(params, result)| {
                        result.into_success().map(|(model, score)| (params, model, score))
                    })
                    .collect();
                if survivors.is_empty() {
                    return Err(AfinarError::NoSuccessfulJobs { attempted });
                }

                // Stable sort: tied scores keep enumeration order.
                survivors.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

                let (best_params, best_model, best_score) = survivors.remove(0);
                let mut ranking = Vec::with_capacity(survivors.len() + 1);
                ranking.push((best_params, best_score));
                ranking.extend(survivors.into_iter().map(|(params, _, score)| (params, score)));
                (best_model, ranking)
            }
            None => {
                debug!(
                    settings = settings.len(),
                    folds = self.cv_folds,
                    threads = self.num_threads,
                    "grid search by cross-validation"
                );
                let cv = KFold::new(self.cv_folds);
                let outcome = cross_validated_search(
                    &self.model,
                    x_train,
                    y_train,
                    &settings,
                    &cv,
                    self.num_threads,
                )?;
                let mut ranking = outcome.results;
                ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
                (outcome.best_model, ranking)
            }
        };

        self.model = best_model;
        self.state = Some(SearchState { ranking });
        Ok(&self.model)
    }

    /// Predict labels with the winning model.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        self.state()?;
        Ok(self.model.predict(x))
    }

    /// Per-class probabilities from the winning model.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before `fit`; [`AfinarError::Unsupported`]
    /// when the winning model has no probability output.
    pub fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.state()?;
        self.model.predict_proba(x).ok_or(AfinarError::Unsupported {
            operation: "predict_proba",
        })
    }

    /// Score the winning model on a test set.
    ///
    /// Preference order: the weighted native scorer when `sample_weight` is
    /// given, then the unweighted native scorer (weights dropped, as a scorer
    /// that cannot accept them would do), then (weighted) classification
    /// accuracy over [`predict`](GridSearch::predict).
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn score(
        &self,
        x: &Matrix<f32>,
        y: &Vector<f32>,
        sample_weight: Option<&Vector<f32>>,
    ) -> Result<f32> {
        self.state()?;
        let score = match sample_weight {
            Some(w) => self
                .model
                .score_weighted(x, y, w)
                .or_else(|| self.model.score(x, y))
                .unwrap_or_else(|| weighted_accuracy(y, &self.model.predict(x), w)),
            None => self
                .model
                .score(x, y)
                .unwrap_or_else(|| accuracy(y, &self.model.predict(x))),
        };
        Ok(score)
    }

    /// The winning fitted model.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn best_model(&self) -> Result<&E> {
        self.state()?;
        Ok(&self.model)
    }

    /// (setting, score) pairs ordered by descending score.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn get_param_scores(&self) -> Result<&[(ParamSet, f32)]> {
        Ok(&self.state()?.ranking)
    }

    /// The best-scoring parameter setting.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn get_best_params(&self) -> Result<&ParamSet> {
        Ok(&self.state()?.ranking[0].0)
    }

    /// The best validation (or mean cross-validation) score.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn get_best_score(&self) -> Result<f32> {
        Ok(self.state()?.ranking[0].1)
    }

    /// All surviving parameter settings, ordered by descending score.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn get_params(&self) -> Result<Vec<&ParamSet>> {
        Ok(self.state()?.ranking.iter().map(|(p, _)| p).collect())
    }

    /// All scores, ordered descending.
    ///
    /// # Errors
    ///
    /// [`AfinarError::NotFitted`] before a successful `fit`.
    pub fn get_scores(&self) -> Result<Vec<f32>> {
        Ok(self.state()?.ranking.iter().map(|(_, s)| *s).collect())
    }
}
