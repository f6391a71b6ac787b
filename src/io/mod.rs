//! Input/output helpers.
//!
//! - assay ingest + normalization (`assay`)
//! - plate-template loading (`layout`)
//! - report and JSON exports (`export`)

pub mod assay;
pub mod export;
pub mod layout;

pub use assay::*;
pub use export::*;
pub use layout::*;
