//! Assay ingest and normalization.
//!
//! This module turns a vendor export (delimited text) into clean per-well
//! time series that are safe to fit.
//!
//! Design goals:
//! - **Tolerant cells, strict structure**: a malformed file is a `Load`
//!   error; a malformed cell is a recorded row error or a gap, never fatal
//! - **Normalized units**: time is always hours after ingest
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here
//!
//! Two shapes are auto-detected from the header:
//! - *wide*: a time column plus one column per well (`Time,A1,A2,...`)
//! - *long*: `well,time,od` triples, one observation per record

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{WellId, WellSeries};
use crate::error::AppError;

/// A cell-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized per-well series plus diagnostics.
#[derive(Debug, Clone)]
pub struct AssayData {
    /// File label used in reports (file name without directories).
    pub source: String,
    /// Per-well series, row-major, times strictly increasing, in hours.
    pub wells: Vec<WellSeries>,
    pub row_errors: Vec<RowError>,
    /// Informational note about how time units were interpreted.
    pub unit_note: Option<String>,
}

/// Load one assay file.
pub fn load_assay(path: &Path) -> Result<AssayData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::load(format!("Failed to open assay file '{}': {e}", path.display()))
    })?;

    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::load(format!("Failed to read assay headers: {e}")))?
        .clone();

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let shape = detect_shape(&headers).ok_or_else(|| {
        AppError::load(format!(
            "Unrecognized assay header in '{source}': expected a time column plus \
             well columns, or well/time/od columns."
        ))
    })?;

    let mut row_errors = Vec::new();
    let mut points: BTreeMap<WellId, Vec<(f64, f64)>> = BTreeMap::new();
    let unit_note;

    match shape {
        Shape::Wide { time_col, wells } => {
            let scale = time_scale(&headers[time_col]);
            unit_note = scale.note();
            for (i, record) in reader.records().enumerate() {
                let line = i + 2; // 1-based, after the header
                let record = match record {
                    Ok(r) => r,
                    Err(e) => {
                        row_errors.push(RowError {
                            line,
                            message: format!("Unreadable record: {e}"),
                        });
                        continue;
                    }
                };
                // Vendor exports often append non-numeric trailer rows
                // (temperature, date stamps); skip rows whose time cell
                // does not parse.
                let Some(time) = record.get(time_col).and_then(parse_number) else {
                    continue;
                };
                let time = time * scale.factor;
                for &(col, well) in &wells {
                    match record.get(col) {
                        None | Some("") => {} // gap, tolerated
                        Some(cell) => match parse_number(cell) {
                            // Negative readings come from baseline-subtracted
                            // exports; clamp to the physical floor.
                            Some(v) => points.entry(well).or_default().push((time, v.max(0.0))),
                            None if is_missing(cell) => {}
                            None => row_errors.push(RowError {
                                line,
                                message: format!("Non-numeric measurement '{cell}' for well {well}."),
                            }),
                        },
                    }
                }
            }
        }
        Shape::Long {
            well_col,
            time_col,
            value_col,
        } => {
            let scale = time_scale(&headers[time_col]);
            unit_note = scale.note();
            for (i, record) in reader.records().enumerate() {
                let line = i + 2;
                let record = match record {
                    Ok(r) => r,
                    Err(e) => {
                        row_errors.push(RowError {
                            line,
                            message: format!("Unreadable record: {e}"),
                        });
                        continue;
                    }
                };
                let well = match record.get(well_col).map(str::parse::<WellId>) {
                    Some(Ok(w)) => w,
                    _ => {
                        row_errors.push(RowError {
                            line,
                            message: format!(
                                "Invalid well id '{}'.",
                                record.get(well_col).unwrap_or("")
                            ),
                        });
                        continue;
                    }
                };
                let Some(time) = record.get(time_col).and_then(parse_number) else {
                    continue;
                };
                match record.get(value_col) {
                    None | Some("") => {}
                    Some(cell) => match parse_number(cell) {
                        Some(v) => points
                            .entry(well)
                            .or_default()
                            .push((time * scale.factor, v.max(0.0))),
                        None if is_missing(cell) => {}
                        None => row_errors.push(RowError {
                            line,
                            message: format!("Non-numeric measurement '{cell}' for well {well}."),
                        }),
                    },
                }
            }
        }
    }

    if points.is_empty() {
        return Err(AppError::load(format!(
            "Assay file '{source}' contains no usable observations."
        )));
    }

    // Enforce the series invariant: strictly increasing times. Sort, then
    // drop any point that does not advance the clock.
    let wells = points
        .into_iter()
        .map(|(well, mut pts)| {
            pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            let mut times = Vec::with_capacity(pts.len());
            let mut values = Vec::with_capacity(pts.len());
            for (t, v) in pts {
                if times.last().is_none_or(|&prev| t > prev) {
                    times.push(t);
                    values.push(v);
                }
            }
            WellSeries { well, times, values }
        })
        .collect();

    Ok(AssayData {
        source,
        wells,
        row_errors,
        unit_note,
    })
}

enum Shape {
    Wide {
        time_col: usize,
        wells: Vec<(usize, WellId)>,
    },
    Long {
        well_col: usize,
        time_col: usize,
        value_col: usize,
    },
}

fn detect_shape(headers: &StringRecord) -> Option<Shape> {
    let lower: Vec<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();

    // Long format: explicit well/time/od columns.
    let well_col = lower.iter().position(|h| h == "well");
    let time_col = lower.iter().position(|h| h.starts_with("time"));
    let value_col = lower
        .iter()
        .position(|h| h == "od" || h == "value" || h == "measurement");
    if let (Some(well_col), Some(time_col), Some(value_col)) = (well_col, time_col, value_col) {
        return Some(Shape::Long {
            well_col,
            time_col,
            value_col,
        });
    }

    // Wide format: a time column plus columns whose names parse as wells.
    let time_col = time_col?;
    let wells: Vec<(usize, WellId)> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != time_col)
        .filter_map(|(i, h)| h.parse::<WellId>().ok().map(|w| (i, w)))
        .collect();
    if wells.is_empty() {
        return None;
    }
    Some(Shape::Wide { time_col, wells })
}

struct TimeScale {
    factor: f64,
    unit: &'static str,
}

impl TimeScale {
    fn note(&self) -> Option<String> {
        if self.factor == 1.0 {
            None
        } else {
            Some(format!("Time column in {} converted to hours.", self.unit))
        }
    }
}

/// Resolve the hours-conversion factor from the time header annotation
/// (`Time [s]`, `time (min)`, ...). Unannotated columns are taken as hours.
fn time_scale(header: &str) -> TimeScale {
    let lower = header.to_ascii_lowercase();
    if lower.contains("[s]") || lower.contains("(s)") || lower.contains("sec") {
        TimeScale {
            factor: 1.0 / 3600.0,
            unit: "seconds",
        }
    } else if lower.contains("min") {
        TimeScale {
            factor: 1.0 / 60.0,
            unit: "minutes",
        }
    } else {
        TimeScale {
            factor: 1.0,
            unit: "hours",
        }
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    let v: f64 = cell.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

fn is_missing(cell: &str) -> bool {
    matches!(cell.trim(), "" | "-" | "NA" | "na" | "NaN" | "nan" | "null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("gc-curves-assay-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_wide_format_and_sorts_times() {
        let path = write_temp(
            "wide.csv",
            "Time,A1,A2\n1.0,0.2,0.3\n0.0,0.1,0.1\n2.0,0.5,0.6\n",
        );
        let data = load_assay(&path).unwrap();
        assert_eq!(data.wells.len(), 2);
        let a1 = &data.wells[0];
        assert_eq!(a1.well.to_string(), "A1");
        assert_eq!(a1.times, vec![0.0, 1.0, 2.0]);
        assert_eq!(a1.values, vec![0.1, 0.2, 0.5]);
    }

    #[test]
    fn normalizes_minutes_to_hours() {
        let path = write_temp("minutes.csv", "Time (min),A1\n0,0.1\n30,0.2\n60,0.4\n");
        let data = load_assay(&path).unwrap();
        assert_eq!(data.wells[0].times, vec![0.0, 0.5, 1.0]);
        assert!(data.unit_note.is_some());
    }

    #[test]
    fn gaps_and_trailer_rows_are_tolerated() {
        let path = write_temp(
            "gaps.csv",
            "Time,A1,A2\n0.0,0.1,\n1.0,,0.2\n2.0,0.3,0.4\nTemperature,37,37\n",
        );
        let data = load_assay(&path).unwrap();
        let a1 = &data.wells[0];
        assert_eq!(a1.times, vec![0.0, 2.0]);
        let a2 = &data.wells[1];
        assert_eq!(a2.times, vec![1.0, 2.0]);
        assert!(data.row_errors.is_empty());
    }

    #[test]
    fn non_numeric_measurement_is_recorded_not_fatal() {
        let path = write_temp("bad-cell.csv", "Time,A1\n0.0,0.1\n1.0,oops\n2.0,0.3\n");
        let data = load_assay(&path).unwrap();
        assert_eq!(data.wells[0].times, vec![0.0, 2.0]);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 3);
    }

    #[test]
    fn loads_long_format() {
        let path = write_temp(
            "long.csv",
            "well,time,od\nA1,0.0,0.1\nA1,1.0,0.3\nB2,0.0,0.2\nB2,1.0,0.4\n",
        );
        let data = load_assay(&path).unwrap();
        assert_eq!(data.wells.len(), 2);
        assert_eq!(data.wells[1].well.to_string(), "B2");
        assert_eq!(data.wells[1].values, vec![0.2, 0.4]);
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let path = write_temp("nonsense.csv", "foo,bar\n1,2\n");
        let err = load_assay(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);

        let missing = std::path::Path::new("/definitely/not/here.csv");
        let err = load_assay(missing).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
    }

    #[test]
    fn negative_readings_clamp_to_zero() {
        let path = write_temp("neg.csv", "Time,A1\n0.0,-0.02\n1.0,0.1\n");
        let data = load_assay(&path).unwrap();
        assert_eq!(data.wells[0].values, vec![0.0, 0.1]);
    }
}
