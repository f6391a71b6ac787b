//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the plate layout
//! - runs the analyse pipeline
//! - assembles and emits the CSV report (stdout or file)
//! - writes optional exports

use clap::Parser;

use crate::cli::{AnalyseArgs, Command, PlateArgs};
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::io::layout::{default_layout, load_layout};
use crate::report;

pub mod pipeline;

/// Entry point for the `gc` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Analyse(args) => handle_analyse(args, cli.verbose),
        Command::Plate(args) => handle_plate(args),
    }
}

fn handle_analyse(args: AnalyseArgs, verbose: bool) -> Result<(), AppError> {
    let layout = match &args.plate_file {
        Some(path) => load_layout(path)?,
        None => default_layout(),
    };
    let config = analysis_config_from_args(&args);

    if verbose {
        eprintln!(
            "gc analyse: {} | started {}",
            args.path.display(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
    }

    let run = pipeline::run_analyse(&args.path, &layout, &args.ref_strain, &config)?;

    // Skipped files and dropped summaries are reported, never silent.
    for skip in &run.skipped {
        eprintln!("gc analyse: skipped '{}': {}", skip.path.display(), skip.error);
    }
    for file in &run.files {
        if let Some(err) = &file.summary_error {
            eprintln!("gc analyse: {}: no summary: {}", file.source, err);
        }
    }
    if verbose {
        for file in &run.files {
            let usable = file
                .results
                .iter()
                .filter(|r| r.status.is_usable())
                .count();
            eprintln!(
                "gc analyse: {}: {} wells, {} usable, {} ingest cell errors{}",
                file.source,
                file.results.len(),
                usable,
                file.row_errors,
                file.unit_note
                    .as_deref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default(),
            );
        }
    }

    // Report: one well table per file, then a single summary block (the
    // summary block's line count is a downstream contract).
    let mut out = String::new();
    for file in &run.files {
        out.push_str(&report::format_well_table(&file.results));
        out.push('\n');
    }
    let mut summaries: Vec<&crate::summary::CompetitionSummary> =
        run.files.iter().filter_map(|f| f.summary.as_ref()).collect();
    if let Some(pooled) = &run.pooled {
        summaries.push(pooled);
    }
    out.push_str(&report::format_summary(&summaries));

    match &args.output_file {
        Some(path) => crate::io::export::write_report(path, &out)?,
        None => print!("{out}"),
    }

    if let Some(path) = &args.export_json {
        let all: Vec<crate::domain::WellFitResult> = run
            .files
            .iter()
            .flat_map(|f| f.results.iter().cloned())
            .collect();
        crate::io::export::write_results_json(path, &all)?;
    }

    Ok(())
}

fn handle_plate(args: PlateArgs) -> Result<(), AppError> {
    let layout = match &args.plate_file {
        Some(path) => load_layout(path)?,
        None => default_layout(),
    };

    let table = report::format_plate_table(&layout);
    match &args.output_file {
        Some(path) => crate::io::export::write_report(path, &table)?,
        None => print!("{table}"),
    }
    Ok(())
}

fn analysis_config_from_args(args: &AnalyseArgs) -> AnalysisConfig {
    AnalysisConfig {
        model_spec: args.model,
        min_points: args.min_points,
        refine_passes: args.refine_passes,
        strict_layout: args.strict,
        central_stat: args.stat,
        pooling: args.pooling,
        ..AnalysisConfig::default()
    }
}
