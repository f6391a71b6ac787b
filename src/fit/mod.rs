//! Per-well curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - derive initial guesses and deterministic shape grids from the data
//! - evaluate each candidate shape tuple (parallel) with a linear solve
//! - select the best model per well using AIC + parsimony guardrails

pub mod fitter;
pub mod guess;
pub mod selection;

pub use fitter::*;
pub use guess::*;
pub use selection::*;
