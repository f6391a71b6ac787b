//! Growth-model evaluation for logistic / Gompertz / Richards.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given timepoint and shape parameters (for
//!   the linear least-squares solve of `y0` and `k`)
//! - predict `y(t)` given full parameters (for residuals/reports)

pub mod model;

pub use model::*;
