//! Core data primitives (Vector, Matrix).
//!
//! Feature matrices and label vectors passed to estimators and the grid
//! search use these types.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
