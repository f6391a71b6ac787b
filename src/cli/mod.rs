//! Command-line parsing for the growth-curve analyser.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{CentralStat, ModelSpec, Pooling};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "gc",
    version,
    about = "Growth-curve analysis and competition prediction for 96-well plates"
)]
pub struct Cli {
    /// Print run diagnostics to stderr (stdout stays machine-readable CSV).
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse an assay file (or a directory of assay files): fit growth
    /// curves per well and predict competition against a reference strain.
    Analyse(AnalyseArgs),
    /// Print the resolved plate template as CSV.
    Plate(PlateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyseArgs {
    /// Assay file, or directory of assay files (.csv/.tsv/.txt).
    pub path: PathBuf,

    /// Plate template file (8 rows x 12 columns of strain labels).
    /// Defaults to the built-in two-strain checkerboard.
    #[arg(long)]
    pub plate_file: Option<PathBuf>,

    /// Reference strain for the fitness comparison.
    #[arg(long)]
    pub ref_strain: String,

    /// Write the report to a file instead of stdout.
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Export per-well fit results as JSON.
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Which growth model(s) to attempt per well.
    #[arg(long, value_enum, default_value = "auto")]
    pub model: ModelSpec,

    /// Central-tendency statistic for per-strain aggregation.
    #[arg(long, value_enum, default_value = "median")]
    pub stat: CentralStat,

    /// Fail when assay data contains a well absent from the layout.
    #[arg(long)]
    pub strict: bool,

    /// Append a pooled summary across files using this policy.
    #[arg(long, value_enum)]
    pub pooling: Option<Pooling>,

    /// Minimum usable points per well; fewer marks the well failed.
    #[arg(long, default_value_t = 4)]
    pub min_points: usize,

    /// Grid refinement passes per model fit (bounds the work per well).
    #[arg(long, default_value_t = 4)]
    pub refine_passes: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct PlateArgs {
    /// Plate template file; defaults to the built-in checkerboard.
    #[arg(long)]
    pub plate_file: Option<PathBuf>,

    /// Write the table to a file instead of stdout.
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}
