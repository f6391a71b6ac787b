//! Tabular report assembly.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - the fixed report cardinalities (a contract for downstream consumers)
//!   are enforced and tested in one module

pub mod format;

pub use format::*;
