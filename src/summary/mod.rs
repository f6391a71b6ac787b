//! Per-strain aggregation and competition prediction.
//!
//! Grouping takes every usable (non-`Failed`) well that carries a strain
//! tag; unmapped wells stay in the per-well table but never enter strain
//! statistics. Each well counts once regardless of how many replicates a
//! strain has (equal weight per well, the documented default).
//!
//! Multi-file runs summarize each file independently; pooling across files
//! is explicit (`Pooling::Wells` concatenates wells, `Pooling::Files`
//! averages per-file coefficients), never implicit.

use std::collections::BTreeMap;

use crate::domain::{
    AnalysisConfig, CentralStat, CompetitionResult, Pooling, StrainSummary, WellFitResult,
};
use crate::error::AppError;
use crate::math::{mad, mean, median, std_dev};

/// Source label used for pooled summaries.
pub const POOLED_SOURCE: &str = "pooled";

/// Everything the report needs for one source (file or pool).
#[derive(Debug, Clone)]
pub struct CompetitionSummary {
    pub source: String,
    /// Per-strain rows, sorted by strain label.
    pub strains: Vec<StrainSummary>,
    /// One row per non-reference strain, sorted by test strain label.
    pub competitions: Vec<CompetitionResult>,
}

/// Aggregate one source's fit results against a reference strain.
///
/// Fails with an insufficient-data error when the reference strain has no
/// usable wells (or a central growth rate of zero, which would make the
/// fitness ratio meaningless).
pub fn summarize(
    results: &[WellFitResult],
    reference: &str,
    source: &str,
    config: &AnalysisConfig,
) -> Result<CompetitionSummary, AppError> {
    let mut rates: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        if !result.status.is_usable() {
            continue;
        }
        let (Some(strain), Some(rate)) = (result.strain.as_deref(), result.growth_rate()) else {
            continue;
        };
        rates.entry(strain).or_default().push(rate);
    }

    let strains: Vec<StrainSummary> = rates
        .iter()
        .map(|(strain, wells)| StrainSummary {
            strain: (*strain).to_string(),
            source: source.to_string(),
            stat: central(wells, config.central_stat),
            spread: spread(wells, config.central_stat),
            n_wells: wells.len(),
        })
        .collect();

    let Some(reference_row) = strains.iter().find(|s| s.strain == reference) else {
        return Err(AppError::insufficient_data(format!(
            "Reference strain '{reference}' has no usable wells in {source}."
        )));
    };
    if reference_row.stat <= 0.0 {
        return Err(AppError::insufficient_data(format!(
            "Reference strain '{reference}' has a non-positive central growth rate."
        )));
    }

    let competitions: Vec<CompetitionResult> = strains
        .iter()
        .filter(|s| s.strain != reference)
        .map(|test| CompetitionResult {
            reference: reference.to_string(),
            test: test.strain.clone(),
            source: source.to_string(),
            coefficient: test.stat / reference_row.stat,
            spread: propagate_spread(test, reference_row),
        })
        .collect();

    Ok(CompetitionSummary {
        source: source.to_string(),
        strains,
        competitions,
    })
}

/// Pool several files' results by the configured policy.
pub fn pool(
    per_file_results: &[Vec<WellFitResult>],
    per_file_summaries: &[CompetitionSummary],
    reference: &str,
    policy: Pooling,
    config: &AnalysisConfig,
) -> Result<CompetitionSummary, AppError> {
    match policy {
        Pooling::Wells => {
            let all: Vec<WellFitResult> = per_file_results.iter().flatten().cloned().collect();
            summarize(&all, reference, POOLED_SOURCE, config)
        }
        Pooling::Files => pool_by_files(per_file_summaries, reference),
    }
}

/// Average per-file summaries: every file counts once, regardless of how
/// many wells it contributed.
fn pool_by_files(
    summaries: &[CompetitionSummary],
    reference: &str,
) -> Result<CompetitionSummary, AppError> {
    if summaries.is_empty() {
        return Err(AppError::insufficient_data(
            "No per-file summaries to pool.",
        ));
    }

    let mut strain_stats: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
    for summary in summaries {
        for row in &summary.strains {
            let entry = strain_stats.entry(row.strain.as_str()).or_default();
            entry.0.push(row.stat);
            entry.1 += row.n_wells;
        }
    }

    let strains: Vec<StrainSummary> = strain_stats
        .iter()
        .map(|(strain, (stats, n_wells))| StrainSummary {
            strain: (*strain).to_string(),
            source: POOLED_SOURCE.to_string(),
            stat: mean(stats).unwrap_or(0.0),
            spread: std_dev(stats).unwrap_or(0.0),
            n_wells: *n_wells,
        })
        .collect();

    let mut coefficient_sets: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for summary in summaries {
        for row in &summary.competitions {
            coefficient_sets
                .entry(row.test.as_str())
                .or_default()
                .push(row.coefficient);
        }
    }

    let competitions: Vec<CompetitionResult> = coefficient_sets
        .iter()
        .map(|(test, coefficients)| CompetitionResult {
            reference: reference.to_string(),
            test: (*test).to_string(),
            source: POOLED_SOURCE.to_string(),
            coefficient: mean(coefficients).unwrap_or(0.0),
            spread: std_dev(coefficients).unwrap_or(0.0),
        })
        .collect();

    Ok(CompetitionSummary {
        source: POOLED_SOURCE.to_string(),
        strains,
        competitions,
    })
}

fn central(values: &[f64], stat: CentralStat) -> f64 {
    match stat {
        CentralStat::Median => median(values).unwrap_or(0.0),
        CentralStat::Mean => mean(values).unwrap_or(0.0),
    }
}

fn spread(values: &[f64], stat: CentralStat) -> f64 {
    match stat {
        CentralStat::Median => mad(values).unwrap_or(0.0),
        CentralStat::Mean => std_dev(values).unwrap_or(0.0),
    }
}

/// Relative dispersions combined in quadrature, scaled by the ratio.
fn propagate_spread(test: &StrainSummary, reference: &StrainSummary) -> f64 {
    let rel = |s: &StrainSummary| {
        if s.stat > 0.0 { s.spread / s.stat } else { 0.0 }
    };
    let coefficient = test.stat / reference.stat;
    let (rt, rr) = (rel(test), rel(reference));
    coefficient.abs() * (rt * rt + rr * rr).sqrt()
}
