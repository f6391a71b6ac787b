//! Plate-template loading.
//!
//! A template is delimited text with 8 rows by 12 columns of strain
//! labels, mirroring the plate geometry. Empty cells (or `0` / `blank`)
//! mark unassigned wells: those are fit individually but excluded from
//! strain aggregation.

use std::fs::File;
use std::path::Path;

use crate::domain::{PLATE_COLS, PLATE_ROWS, PlateLayout, WellId};
use crate::error::AppError;

/// The stock template used when no `--plate-file` is given: a two-strain
/// checkerboard covering the full plate.
pub fn default_layout() -> PlateLayout {
    PlateLayout::checkerboard("G", "R")
}

/// Load a plate template file.
pub fn load_layout(path: &Path) -> Result<PlateLayout, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::load(format!(
            "Failed to open plate template '{}': {e}",
            path.display()
        ))
    })?;

    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(file);

    let mut layout = PlateLayout::new();
    let mut rows = 0usize;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::load(format!("Unreadable plate template record: {e}"))
        })?;
        if row_idx >= PLATE_ROWS as usize {
            return Err(AppError::load(format!(
                "Plate template '{}' has more than {PLATE_ROWS} rows.",
                path.display()
            )));
        }
        if record.len() != PLATE_COLS as usize {
            return Err(AppError::load(format!(
                "Plate template row {} has {} columns (expected {PLATE_COLS}).",
                row_idx + 1,
                record.len()
            )));
        }
        for (col_idx, cell) in record.iter().enumerate() {
            if is_blank(cell) {
                continue;
            }
            let Some(well) = WellId::new(row_idx as u8, col_idx as u8) else {
                continue;
            };
            layout.assign(well, cell);
        }
        rows += 1;
    }

    if rows != PLATE_ROWS as usize {
        return Err(AppError::load(format!(
            "Plate template '{}' has {rows} rows (expected {PLATE_ROWS}).",
            path.display()
        )));
    }

    Ok(layout)
}

fn is_blank(cell: &str) -> bool {
    cell.is_empty() || cell == "0" || cell.eq_ignore_ascii_case("blank") || cell == "-"
}
