//! Afinar: Parallel hyperparameter grid search in pure Rust.
//!
//! Afinar tunes any estimator implementing the [`Estimator`](traits::Estimator)
//! trait over a parameter grid, using a held-out validation set (scored in
//! parallel, with per-setting failures isolated) or K-fold cross-validation
//! when no validation set is available.
//!
//! # Quick Start
//!
//! ```
//! use afinar::prelude::*;
//! # use afinar::error::Result;
//! #
//! # #[derive(Clone)]
//! # struct Threshold { cutoff: f32 }
//! # impl Estimator for Threshold {
//! #     fn set_params(&mut self, params: &ParamSet) -> Result<()> {
//! #         self.cutoff = params.get_f64("cutoff").unwrap_or(0.0) as f32;
//! #         Ok(())
//! #     }
//! #     fn fit(&mut self, _x: &Matrix<f32>, _y: &Vector<f32>) -> Result<()> { Ok(()) }
//! #     fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
//! #         let labels: Vec<f32> = (0..x.n_rows())
//! #             .map(|i| if x.get(i, 0) > self.cutoff { 1.0 } else { 0.0 })
//! #             .collect();
//! #         Vector::from_vec(labels)
//! #     }
//! # }
//! // Training and validation splits.
//! let x_train = Matrix::from_vec(4, 1, vec![0.1, 0.4, 0.6, 0.9]).unwrap();
//! let y_train = Vector::from_slice(&[0.0, 0.0, 1.0, 1.0]);
//! let x_val = Matrix::from_vec(2, 1, vec![0.3, 0.7]).unwrap();
//! let y_val = Vector::from_slice(&[0.0, 1.0]);
//!
//! // Search the grid; the best fitted model is kept for prediction.
//! let grid = ParamGrid::new().add("cutoff", [0.2, 0.5, 0.8]);
//! let mut search = GridSearch::new(Threshold { cutoff: 0.0 });
//! search.fit(&x_train, &y_train, &grid, Some((&x_val, &y_val))).unwrap();
//!
//! assert_eq!(search.get_best_score().unwrap(), 1.0);
//! let predictions = search.predict(&x_val).unwrap();
//! assert_eq!(predictions.as_slice(), &[0.0, 1.0]);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`traits`]: The [`Estimator`](traits::Estimator) trait with optional capabilities
//! - [`grid`]: Parameter grids and their deterministic expansion
//! - [`executor`]: Parallel per-setting fit-and-score jobs
//! - [`model_selection`]: K-fold cross-validation and cross-validated search
//! - [`metrics`]: Classification accuracy (plain and sample-weighted)
//! - [`search`]: The [`GridSearch`](search::GridSearch) orchestrator
//! - [`error`]: Error types

pub mod error;
pub mod executor;
pub mod grid;
pub mod metrics;
pub mod model_selection;
pub mod prelude;
pub mod primitives;
pub mod search;
pub mod traits;
