//! Parallel evaluation of parameter settings.
//!
//! The worker task ([`run_job`]) fits and scores one parameter setting in
//! isolation; [`evaluate_grid`] fans all settings out across a scoped rayon
//! pool and returns results in input order. A failing job becomes an
//! [`Evaluation::Failure`] value, never an error: one bad setting must not
//! abort its siblings.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{AfinarError, Result};
use crate::grid::ParamSet;
use crate::metrics::accuracy;
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

/// Shared, read-only job context: the estimator template plus the training
/// and validation data every worker reads.
///
/// Workers borrow the context instead of receiving per-job copies; the data
/// is never mutated, so sharing it by reference is safe and avoids
/// duplicating large matrices per worker.
pub struct JobContext<'a, E> {
    /// Estimator template cloned by each worker.
    pub template: &'a E,
    /// Training features.
    pub x_train: &'a Matrix<f32>,
    /// Training labels.
    pub y_train: &'a Vector<f32>,
    /// Validation features.
    pub x_val: &'a Matrix<f32>,
    /// Validation labels.
    pub y_val: &'a Vector<f32>,
}

/// Outcome of one worker task.
#[derive(Debug, Clone)]
pub enum Evaluation<E> {
    /// The setting was fitted and scored.
    Success {
        /// The fitted estimator.
        model: E,
        /// Validation score (higher is better).
        score: f32,
    },
    /// The setting failed somewhere between configuration and scoring.
    /// The reason is kept for debug logging only; failed settings simply
    /// contribute no candidate.
    Failure {
        /// Rendered estimator error.
        reason: String,
    },
}

impl<E> Evaluation<E> {
    /// True if the job produced a candidate model.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Consume the evaluation, yielding the fitted model and score on success.
    #[must_use]
    pub fn into_success(self) -> Option<(E, f32)> {
        match self {
            Self::Success { model, score } => Some((model, score)),
            Self::Failure { .. } => None,
        }
    }
}

/// Execute exactly one parameter setting in isolation.
///
/// In order: clone the template, thread the fixed seed through
/// [`Estimator::set_seed`] so stochastic estimators are compared under the
/// same randomness, apply the setting, fit on the training data, then score
/// on the validation data — natively if the estimator has a scorer, else by
/// classification accuracy. Any error along the way is converted into
/// [`Evaluation::Failure`].
pub fn run_job<E>(ctx: &JobContext<'_, E>, params: &ParamSet, seed: u64) -> Evaluation<E>
where
    E: Estimator + Clone,
{
    match try_run(ctx, params, seed) {
        Ok((model, score)) => Evaluation::Success { model, score },
        Err(err) => {
            debug!(params = %params, error = %err, "grid search job failed");
            Evaluation::Failure {
                reason: err.to_string(),
            }
        }
    }
}

fn try_run<E>(ctx: &JobContext<'_, E>, params: &ParamSet, seed: u64) -> Result<(E, f32)>
where
    E: Estimator + Clone,
{
    let mut model = ctx.template.clone();
    model.set_seed(seed);
    model.set_params(params)?;
    model.fit(ctx.x_train, ctx.y_train)?;
    let score = match model.score(ctx.x_val, ctx.y_val) {
        Some(s) => s,
        None => accuracy(ctx.y_val, &model.predict(ctx.x_val)),
    };
    Ok((model, score))
}

/// Evaluate all settings concurrently on a pool of `num_threads` workers.
///
/// Blocks until every job completes and returns one [`Evaluation`] per
/// setting, in input order; execution order across workers is unspecified.
/// The pool lives only for this batch: its workers are joined when the pool
/// is dropped, on both success and failure paths.
///
/// # Errors
///
/// Returns [`AfinarError::ThreadPool`] if the worker pool cannot be built.
/// Job failures are not errors; they come back as [`Evaluation::Failure`].
pub fn evaluate_grid<E>(
    ctx: &JobContext<'_, E>,
    settings: &[ParamSet],
    num_threads: usize,
    seed: u64,
) -> Result<Vec<Evaluation<E>>>
where
    E: Estimator + Clone + Send + Sync,
{
    let num_threads = num_threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| AfinarError::ThreadPool(e.to_string()))?;

    debug!(
        jobs = settings.len(),
        threads = num_threads,
        "dispatching grid search jobs"
    );

    let results = pool.install(|| {
        settings
            .par_iter()
            .map(|params| run_job(ctx, params, seed))
            .collect()
    });

    Ok(results)
}

/// Number of worker threads to use when the caller does not specify one.
#[must_use]
pub fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}
