//! CSV report formatting.
//!
//! Three blocks, each a self-contained CSV table (every line in a block has
//! the same field count):
//!
//! - per-well table: one header + one row per well, row-major
//! - summary block: one header + per source, one `growth` row per strain
//!   and one `fitness` row per non-reference strain (for the stock
//!   two-strain template that is 3 rows per file, so a directory run emits
//!   `3 * files + 1` summary lines)
//! - plate table: one header + one row per well of the full plate
//!   (97 lines regardless of how much of the layout is assigned)

use crate::domain::{PlateLayout, WellFitResult, WellId};
use crate::summary::CompetitionSummary;

/// Per-well fit table. Failed wells keep their row (empty fit fields) so
/// failures stay visible instead of silently shrinking the report.
pub fn format_well_table(results: &[WellFitResult]) -> String {
    let mut out = String::new();
    out.push_str("well,strain,status,model,y0,k,r,t_mid,nu,rss,aic\n");
    for result in results {
        let strain = result.strain.as_deref().unwrap_or("");
        match &result.best {
            Some(best) => {
                let nu = best
                    .params
                    .nu
                    .map(|v| format!("{v:.6}"))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "{},{},{},{},{:.6},{:.6},{:.6},{:.6},{},{:.6e},{:.3}\n",
                    result.well,
                    strain,
                    result.status.display_name(),
                    best.model.display_name(),
                    best.params.y0,
                    best.params.k,
                    best.params.r,
                    best.params.t_mid,
                    nu,
                    best.quality.rss,
                    best.quality.aic,
                ));
            }
            None => {
                out.push_str(&format!(
                    "{},{},{},,,,,,,,\n",
                    result.well,
                    strain,
                    result.status.display_name(),
                ));
            }
        }
    }
    out
}

/// Summary block covering one or more sources (plus an optional pooled
/// summary, which is just another source named "pooled").
pub fn format_summary(summaries: &[&CompetitionSummary]) -> String {
    let mut out = String::new();
    out.push_str("source,row,strain,reference,n_wells,value,spread\n");
    for summary in summaries {
        for row in &summary.strains {
            out.push_str(&format!(
                "{},growth,{},,{},{:.6},{:.6}\n",
                summary.source, row.strain, row.n_wells, row.stat, row.spread,
            ));
        }
        for row in &summary.competitions {
            out.push_str(&format!(
                "{},fitness,{},{},,{:.6},{:.6}\n",
                summary.source, row.test, row.reference, row.coefficient, row.spread,
            ));
        }
    }
    out
}

/// Plate-layout table: always the full 96-well grid, with empty strain
/// cells for unassigned wells.
pub fn format_plate_table(layout: &PlateLayout) -> String {
    let mut out = String::new();
    out.push_str("well,row,column,strain\n");
    for well in WellId::all() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            well,
            well.letter(),
            well.number(),
            layout.resolve(well).unwrap_or(""),
        ));
    }
    out
}
