//! Report and JSON exports.
//!
//! The CSV report itself is assembled by `report::format`; this module only
//! owns the thin I/O switch (stdout vs file) and the JSON dump of per-well
//! fits for downstream tooling.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::WellFitResult;
use crate::error::AppError;

/// Write an already-formatted report to a file.
pub fn write_report(path: &Path, report: &str) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create output file '{}': {e}",
            path.display()
        ))
    })?;
    file.write_all(report.as_bytes())
        .map_err(|e| AppError::usage(format!("Failed to write output file: {e}")))?;
    Ok(())
}

/// Dump per-well fit results as pretty JSON.
pub fn write_results_json(path: &Path, results: &[WellFitResult]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create JSON export '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, results)
        .map_err(|e| AppError::usage(format!("Failed to write JSON export: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitStatus, WellFitResult};

    #[test]
    fn json_roundtrips_well_fit_results() {
        let results = vec![WellFitResult {
            well: "A1".parse().unwrap(),
            strain: Some("G".to_string()),
            status: FitStatus::Failed,
            best: None,
            attempts: Vec::new(),
            skipped: Vec::new(),
            reason: Some("Too few points (n=2, need 4).".to_string()),
        }];

        let dir = std::env::temp_dir().join("gc-curves-export-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("results.json");
        write_results_json(&path, &results).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<WellFitResult> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].well.to_string(), "A1");
        assert_eq!(parsed[0].status, FitStatus::Failed);
    }
}
