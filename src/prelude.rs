//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use afinar::prelude::*;
//! ```

pub use crate::error::{AfinarError, Result};
pub use crate::grid::{ParamGrid, ParamSet, ParamValue};
pub use crate::model_selection::{cross_validate, CrossValidationResult, KFold};
pub use crate::primitives::{Matrix, Vector};
pub use crate::search::GridSearch;
pub use crate::traits::Estimator;
