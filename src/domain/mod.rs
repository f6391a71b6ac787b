//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - plate coordinates and per-well time series (`WellId`, `WellSeries`)
//! - the well-to-strain mapping (`PlateLayout`)
//! - fit outputs (`WellFitResult`, `ModelFitResult`, `FitStatus`, etc.)
//! - analysis configuration and policy enums (`AnalysisConfig`)

pub mod types;

pub use types::*;
