//! Plate-level analysis: fit every well of one assay and tag strains.
//!
//! Per-well fitting is a pure function, so wells fan out across a rayon
//! worker pool; the results are then sorted back into row-major order so
//! report output never depends on scheduling. One failed well never aborts
//! the plate.

use rayon::prelude::*;

use crate::domain::{AnalysisConfig, PlateLayout, WellFitResult, WellSeries};
use crate::error::AppError;
use crate::fit::fit_well;

/// Fit all wells present in the assay (partial plates allowed) and join
/// each result with its layout strain.
///
/// Strict mode fails fast when assay data contains a well the layout does
/// not map; non-strict mode fits such wells and leaves `strain = None`,
/// which excludes them from strain aggregation downstream.
pub fn analyse_plate(
    wells: &[WellSeries],
    layout: &PlateLayout,
    config: &AnalysisConfig,
) -> Result<Vec<WellFitResult>, AppError> {
    if config.strict_layout {
        for series in wells {
            if layout.resolve(series.well).is_none() {
                return Err(AppError::layout(format!(
                    "Well {} has data but no layout entry (strict mode).",
                    series.well
                )));
            }
        }
    }

    let mut results: Vec<WellFitResult> = wells
        .par_iter()
        .map(|series| {
            let mut result = fit_well(series, config);
            result.strain = layout.resolve(series.well).map(str::to_string);
            result
        })
        .collect();

    // Row-major order is part of the report contract; restore it here
    // rather than relying on execution order.
    results.sort_by_key(|r| r.well);

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitStatus, ModelKind, WellId};
    use crate::models::predict;

    fn series(well: &str, r: f64) -> WellSeries {
        let well: WellId = well.parse().unwrap();
        let times: Vec<f64> = (0..40).map(|i| i as f64 * 0.3).collect();
        let values: Vec<f64> = times
            .iter()
            .map(|&t| predict(ModelKind::Logistic, t, 0.05, 1.0, &[r, 5.0]))
            .collect();
        WellSeries { well, times, values }
    }

    fn short_series(well: &str) -> WellSeries {
        WellSeries {
            well: well.parse().unwrap(),
            times: vec![0.0, 1.0],
            values: vec![0.1, 0.2],
        }
    }

    #[test]
    fn results_come_back_in_row_major_order() {
        let wells = vec![series("B2", 0.8), series("A12", 0.9), series("A1", 1.0)];
        let layout = PlateLayout::checkerboard("G", "R");
        let results = analyse_plate(&wells, &layout, &AnalysisConfig::default()).unwrap();

        let ids: Vec<String> = results.iter().map(|r| r.well.to_string()).collect();
        assert_eq!(ids, vec!["A1", "A12", "B2"]);
    }

    #[test]
    fn failed_well_does_not_abort_the_plate() {
        let wells = vec![series("A1", 0.9), short_series("A2"), series("A3", 0.8)];
        let layout = PlateLayout::checkerboard("G", "R");
        let results = analyse_plate(&wells, &layout, &AnalysisConfig::default()).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[1].status, FitStatus::Failed);
        assert_eq!(results[0].status, FitStatus::Converged);
        assert_eq!(results[2].status, FitStatus::Converged);
    }

    #[test]
    fn unmapped_well_is_fit_but_untagged_in_lenient_mode() {
        let mut layout = PlateLayout::new();
        layout.assign("A1".parse().unwrap(), "G");

        let wells = vec![series("A1", 0.9), series("A2", 0.8)];
        let results = analyse_plate(&wells, &layout, &AnalysisConfig::default()).unwrap();

        assert_eq!(results[0].strain.as_deref(), Some("G"));
        assert_eq!(results[1].strain, None);
        assert_eq!(results[1].status, FitStatus::Converged);
    }

    #[test]
    fn strict_mode_rejects_unmapped_wells() {
        let mut layout = PlateLayout::new();
        layout.assign("A1".parse().unwrap(), "G");

        let wells = vec![series("A1", 0.9), series("A2", 0.8)];
        let config = AnalysisConfig {
            strict_layout: true,
            ..AnalysisConfig::default()
        };
        let err = analyse_plate(&wells, &layout, &config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Layout);
    }
}
