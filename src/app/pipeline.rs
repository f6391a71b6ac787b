//! The analyse pipeline shared by single-file and directory runs:
//! load -> per-well fit -> strain summary, per input file.
//!
//! Failure policy (a contract, not an afterthought):
//! - a malformed file in directory mode is reported and the batch continues
//! - a file whose summary lacks usable reference wells keeps its per-well
//!   table in directory mode; only its summary rows are dropped (and the
//!   reason is reported)
//! - strict-layout violations abort the run (the layout is wrong, so every
//!   file would mislabel strains)

use std::path::{Path, PathBuf};

use crate::domain::{AnalysisConfig, PlateLayout, WellFitResult};
use crate::error::{AppError, ErrorKind};
use crate::io::assay::{AssayData, load_assay};
use crate::plate::analyse_plate;
use crate::summary::{self, CompetitionSummary};

/// One analysed assay file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: String,
    pub results: Vec<WellFitResult>,
    /// `None` when the file's summary could not be computed (batch mode);
    /// the per-well results above are still reported.
    pub summary: Option<CompetitionSummary>,
    /// Why the summary is missing, when it is.
    pub summary_error: Option<AppError>,
    /// Ingest diagnostics surfaced in verbose mode.
    pub row_errors: usize,
    pub unit_note: Option<String>,
}

/// A file the batch had to skip, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: AppError,
}

/// All computed outputs of one analyse run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub files: Vec<FileOutcome>,
    pub pooled: Option<CompetitionSummary>,
    pub skipped: Vec<SkippedFile>,
}

/// Analyse one file or every assay file in a directory.
pub fn run_analyse(
    path: &Path,
    layout: &PlateLayout,
    reference: &str,
    config: &AnalysisConfig,
) -> Result<RunOutput, AppError> {
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    if path.is_dir() {
        let inputs = assay_files_in(path)?;
        if inputs.is_empty() {
            return Err(AppError::usage(format!(
                "Directory '{}' contains no assay files (.csv/.tsv/.txt).",
                path.display()
            )));
        }
        for input in inputs {
            let mut file = match analyse_one(&input, layout, config) {
                Ok(outcome) => outcome,
                // Bad file: skip it, keep the batch.
                Err(err) if err.kind() == ErrorKind::Load => {
                    skipped.push(SkippedFile { path: input, error: err });
                    continue;
                }
                Err(err) => return Err(err),
            };
            match summary::summarize(&file.results, reference, &file.source, config) {
                Ok(s) => file.summary = Some(s),
                // The wells fit fine; only this file's summary rows are
                // lost, so the per-well table stays in the report.
                Err(err) if err.kind() == ErrorKind::InsufficientData => {
                    file.summary_error = Some(err);
                }
                Err(err) => return Err(err),
            }
            files.push(file);
        }
        if files.is_empty() {
            return Err(AppError::load(format!(
                "No assay file in '{}' could be analysed.",
                path.display()
            )));
        }
    } else {
        let mut file = analyse_one(path, layout, config)?;
        file.summary = Some(summary::summarize(&file.results, reference, &file.source, config)?);
        files.push(file);
    }

    let pooled = match config.pooling {
        Some(policy) => {
            let per_file_results: Vec<Vec<WellFitResult>> =
                files.iter().map(|f| f.results.clone()).collect();
            let summaries: Vec<CompetitionSummary> =
                files.iter().filter_map(|f| f.summary.clone()).collect();
            Some(summary::pool(
                &per_file_results,
                &summaries,
                reference,
                policy,
                config,
            )?)
        }
        None => None,
    };

    Ok(RunOutput {
        files,
        pooled,
        skipped,
    })
}

fn analyse_one(
    path: &Path,
    layout: &PlateLayout,
    config: &AnalysisConfig,
) -> Result<FileOutcome, AppError> {
    let AssayData {
        source,
        wells,
        row_errors,
        unit_note,
    } = load_assay(path)?;

    let results = analyse_plate(&wells, layout, config)?;

    Ok(FileOutcome {
        source,
        results,
        summary: None,
        summary_error: None,
        row_errors: row_errors.len(),
        unit_note,
    })
}

/// Assay files in a directory, sorted by name for deterministic batch order.
fn assay_files_in(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        AppError::usage(format!("Failed to read directory '{}': {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::usage(format!("Failed to read directory entry: {e}"))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("csv") | Some("tsv") | Some("txt")
        ) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
