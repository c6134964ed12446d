//! K-fold cross-validation and the cross-validated search primitive.
//!
//! This is the path [`GridSearch`](crate::search::GridSearch) delegates to
//! when no held-out validation set is supplied: every parameter setting is
//! evaluated by its mean K-fold score and the winner is refitted on the full
//! training set. Unlike the validation-set path there is no per-job failure
//! isolation here; an estimator error in any fold fails the whole search.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{AfinarError, Result};
use crate::grid::ParamSet;
use crate::metrics::accuracy;
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

/// Per-fold scores from one cross-validation run.
#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    /// Score for each fold.
    pub scores: Vec<f32>,
}

impl CrossValidationResult {
    /// Mean score across folds.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f32>() / self.scores.len() as f32
    }

    /// Standard deviation of fold scores.
    #[must_use]
    pub fn std(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .scores
            .iter()
            .map(|&s| (s - mean).powi(2))
            .sum::<f32>()
            / self.scores.len() as f32;
        variance.sqrt()
    }

    /// Minimum fold score.
    #[must_use]
    pub fn min(&self) -> f32 {
        self.scores.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Maximum fold score.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.scores
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// K-Fold cross-validator.
///
/// Splits data into K consecutive folds; each fold serves once as the test
/// set while the remaining K-1 folds form the training set.
///
/// # Examples
///
/// ```
/// use afinar::model_selection::KFold;
///
/// let kfold = KFold::new(5);
/// let splits = kfold.split(10);
/// assert_eq!(splits.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator with `n_splits` folds.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits: n_splits.max(2),
            shuffle: false,
            random_state: None,
        }
    }

    /// Enable or disable shuffling before splitting.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set a random state for reproducible shuffling (implies shuffle).
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true;
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate (train_indices, test_indices) for each fold.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            if let Some(seed) = self.random_state {
                let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
                indices.shuffle(&mut rng);
            } else {
                let mut rng = rand::thread_rng();
                indices.shuffle(&mut rng);
            }
        }

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut result = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            // Remainder samples go to the first folds.
            let current = if i < remainder { fold_size + 1 } else { fold_size };
            let end = start + current;

            let test: Vec<usize> = indices[start..end].to_vec();
            let mut train = Vec::with_capacity(n_samples - current);
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);

            result.push((train, test));
            start = end;
        }
        result
    }
}

/// Run cross-validation for one configured estimator.
///
/// Each fold clones the estimator, fits it on the fold's training rows, and
/// scores it on the held-out rows (natively, or by classification accuracy
/// when the estimator has no scorer).
///
/// # Errors
///
/// Propagates any estimator fitting error; fold failures are not isolated.
pub fn cross_validate<E>(
    estimator: &E,
    x: &Matrix<f32>,
    y: &Vector<f32>,
    cv: &KFold,
) -> Result<CrossValidationResult>
where
    E: Estimator + Clone,
{
    let splits = cv.split(x.n_rows());
    let mut scores = Vec::with_capacity(splits.len());

    for (train_idx, test_idx) in splits {
        let x_train = x.select_rows(&train_idx);
        let y_train = y.select(&train_idx);
        let x_test = x.select_rows(&test_idx);
        let y_test = y.select(&test_idx);

        let mut fold_model = estimator.clone();
        fold_model.fit(&x_train, &y_train)?;

        let score = match fold_model.score(&x_test, &y_test) {
            Some(s) => s,
            None => accuracy(&y_test, &fold_model.predict(&x_test)),
        };
        scores.push(score);
    }

    Ok(CrossValidationResult { scores })
}

/// Outcome of a cross-validated grid search.
#[derive(Debug, Clone)]
pub struct CvSearchOutcome<E> {
    /// The best setting refitted on the full training set.
    pub best_model: E,
    /// (setting, mean fold score) per setting, in enumeration order.
    pub results: Vec<(ParamSet, f32)>,
}

/// Cross-validated search over an enumerated list of parameter settings.
///
/// Settings are scored by mean K-fold score, in parallel on a scoped pool of
/// `num_threads` workers; the earliest setting with the maximum mean score is
/// refitted on the full training data and returned as the best model.
///
/// # Errors
///
/// Returns [`AfinarError::InvalidGrid`] for an empty settings list,
/// [`AfinarError::ThreadPool`] if the pool cannot be built, and any estimator
/// error raised while fitting folds or refitting the winner.
pub fn cross_validated_search<E>(
    template: &E,
    x: &Matrix<f32>,
    y: &Vector<f32>,
    settings: &[ParamSet],
    cv: &KFold,
    num_threads: usize,
) -> Result<CvSearchOutcome<E>>
where
    E: Estimator + Clone + Send + Sync,
{
    if settings.is_empty() {
        return Err(AfinarError::invalid_grid("no parameter settings to search"));
    }

    let num_threads = num_threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| AfinarError::ThreadPool(e.to_string()))?;

    debug!(
        settings = settings.len(),
        folds = cv.n_splits(),
        threads = num_threads,
        "running cross-validated search"
    );

    let mean_scores: Vec<Result<f32>> = pool.install(|| {
        settings
            .par_iter()
            .map(|params| {
                let mut model = template.clone();
                model.set_params(params)?;
                let cv_result = cross_validate(&model, x, y, cv)?;
                Ok(cv_result.mean())
            })
            .collect()
    });

    let mut results = Vec::with_capacity(settings.len());
    for (params, score) in settings.iter().zip(mean_scores) {
        results.push((params.clone(), score?));
    }

    // Earliest setting wins ties.
    let mut best_idx = 0;
    for (i, (_, score)) in results.iter().enumerate().skip(1) {
        if *score > results[best_idx].1 {
            best_idx = i;
        }
    }

    let mut best_model = template.clone();
    best_model.set_params(&results[best_idx].0)?;
    best_model.fit(x, y)?;

    Ok(CvSearchOutcome {
        best_model,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ParamGrid;

    // Predicts a constant label; no native scorer, so cross-validation falls
    // back to accuracy.
    #[derive(Clone, Debug)]
    struct ConstModel {
        label: f32,
        fitted: bool,
    }

    impl ConstModel {
        fn new() -> Self {
            Self {
                label: 0.0,
                fitted: false,
            }
        }
    }

    impl Estimator for ConstModel {
        fn set_params(&mut self, params: &ParamSet) -> Result<()> {
            self.label = params
                .get_f64("label")
                .ok_or_else(|| AfinarError::estimator("missing parameter 'label'"))?
                as f32;
            Ok(())
        }

        fn fit(&mut self, _x: &Matrix<f32>, _y: &Vector<f32>) -> Result<()> {
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
            Vector::from_vec(vec![self.label; x.n_rows()])
        }
    }

    fn ones_data(n: usize) -> (Matrix<f32>, Vector<f32>) {
        (Matrix::zeros(n, 1), Vector::from_vec(vec![1.0; n]))
    }

    #[test]
    fn test_kfold_covers_every_sample_once() {
        let kfold = KFold::new(5);
        let splits = kfold.split(10);
        assert_eq!(splits.len(), 5);

        let mut all_test: Vec<usize> = splits.iter().flat_map(|(_, t)| t).copied().collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());

        for (train, test) in &splits {
            assert_eq!(train.len(), 8);
            assert_eq!(test.len(), 2);
            assert!(test.iter().all(|t| !train.contains(t)));
        }
    }

    #[test]
    fn test_kfold_no_shuffle_is_consecutive() {
        let splits = KFold::new(3).split(9);
        assert_eq!(splits[0].1, vec![0, 1, 2]);
        assert_eq!(splits[1].1, vec![3, 4, 5]);
        assert_eq!(splits[2].1, vec![6, 7, 8]);
    }

    #[test]
    fn test_kfold_uneven_remainder_goes_first() {
        let splits = KFold::new(3).split(10);
        let sizes: Vec<usize> = splits.iter().map(|(_, t)| t.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_kfold_shuffle_reproducible() {
        let a = KFold::new(4).with_random_state(42).split(20);
        let b = KFold::new(4).with_random_state(42).split(20);
        assert_eq!(a, b);

        let c = KFold::new(4).with_random_state(7).split(20);
        assert_ne!(a, c);
    }

    #[test]
    fn test_kfold_clamps_to_two_splits() {
        let kfold = KFold::new(0);
        assert_eq!(kfold.n_splits(), 2);
    }

    #[test]
    fn test_cross_validation_result_stats() {
        let result = CrossValidationResult {
            scores: vec![0.9, 1.0, 0.8],
        };
        assert!((result.mean() - 0.9).abs() < 1e-6);
        assert_eq!(result.min(), 0.8);
        assert_eq!(result.max(), 1.0);
        assert!(result.std() > 0.0);
    }

    #[test]
    fn test_cross_validate_accuracy_fallback() {
        let (x, y) = ones_data(8);
        let mut model = ConstModel::new();
        model
            .set_params(&ParamSet::new().with("label", 1.0))
            .expect("set_params");

        let result = cross_validate(&model, &x, &y, &KFold::new(4)).expect("cross_validate");
        assert_eq!(result.scores.len(), 4);
        assert!((result.mean() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_validated_search_picks_matching_label() {
        let (x, y) = ones_data(9);
        let settings = ParamGrid::new()
            .add("label", [0.0, 1.0, 2.0])
            .expand()
            .expect("expand");

        let outcome =
            cross_validated_search(&ConstModel::new(), &x, &y, &settings, &KFold::new(3), 2)
                .expect("search");

        assert_eq!(outcome.results.len(), 3);
        // Only label=1.0 matches the all-ones targets.
        assert!((outcome.results[1].1 - 1.0).abs() < 1e-6);
        assert_eq!(outcome.best_model.label, 1.0);
        assert!(outcome.best_model.fitted);
    }

    #[test]
    fn test_cross_validated_search_tie_prefers_earliest() {
        // Neither label matches the targets, so both settings score 0 and the
        // first enumerated one must win.
        let (x, y) = ones_data(6);
        let settings = ParamGrid::new()
            .add("label", [5.0, 6.0])
            .expand()
            .expect("expand");

        let outcome =
            cross_validated_search(&ConstModel::new(), &x, &y, &settings, &KFold::new(3), 1)
                .expect("search");
        assert_eq!(outcome.best_model.label, 5.0);
    }

    #[test]
    fn test_cross_validated_search_empty_settings_fails() {
        let (x, y) = ones_data(6);
        let err = cross_validated_search(&ConstModel::new(), &x, &y, &[], &KFold::new(3), 1)
            .expect_err("empty settings must fail");
        assert!(matches!(err, AfinarError::InvalidGrid { .. }));
    }

    #[test]
    fn test_cross_validated_search_propagates_estimator_error() {
        let (x, y) = ones_data(6);
        // Setting without the expected name makes set_params fail.
        let settings = vec![ParamSet::new().with("wrong", 1.0)];
        let err = cross_validated_search(&ConstModel::new(), &x, &y, &settings, &KFold::new(3), 1)
            .expect_err("bad setting must propagate");
        assert!(matches!(err, AfinarError::Estimator(_)));
    }
}
