//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of rows on a standard microplate (letters `A..H`).
pub const PLATE_ROWS: u8 = 8;
/// Number of columns on a standard microplate (numbers `1..12`).
pub const PLATE_COLS: u8 = 12;

/// One well position on a 96-well plate.
///
/// `row` is the zero-based row index (`0` = `A`), `col` is the zero-based
/// column index (`0` = `1`). Ordering is row-major (letter, then number),
/// which is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WellId {
    row: u8,
    col: u8,
}

impl WellId {
    /// Build a well from zero-based row/column indices.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < PLATE_ROWS && col < PLATE_COLS {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Row letter (`A..H`).
    pub fn letter(self) -> char {
        (b'A' + self.row) as char
    }

    /// One-based column number (`1..12`).
    pub fn number(self) -> u8 {
        self.col + 1
    }

    pub fn row_index(self) -> u8 {
        self.row
    }

    pub fn col_index(self) -> u8 {
        self.col
    }

    /// All 96 wells in row-major order.
    pub fn all() -> impl Iterator<Item = WellId> {
        (0..PLATE_ROWS)
            .flat_map(|row| (0..PLATE_COLS).map(move |col| WellId { row, col }))
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter(), self.number())
    }
}

impl FromStr for WellId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| "Empty well id.".to_string())?
            .to_ascii_uppercase();
        if !('A'..='H').contains(&letter) {
            return Err(format!("Invalid well row '{letter}' in '{s}' (expected A-H)."));
        }
        let digits = chars.as_str();
        let number: u8 = digits
            .parse()
            .map_err(|_| format!("Invalid well column in '{s}' (expected 1-12)."))?;
        if !(1..=PLATE_COLS).contains(&number) {
            return Err(format!("Well column {number} out of range 1-12 in '{s}'."));
        }
        Ok(WellId {
            row: letter as u8 - b'A',
            col: number - 1,
        })
    }
}

// Wells serialize as their display form ("C7") so exports stay readable.
impl Serialize for WellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One well's growth curve: optical density over time.
///
/// Invariant (enforced by the assay loader): `times` strictly increasing,
/// in hours; `values` the same length. Gaps (missing timepoints) are simply
/// absent entries, never sentinel values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellSeries {
    pub well: WellId,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl WellSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Largest observed measurement, if any point exists.
    pub fn observed_max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Smallest observed measurement, if any point exists.
    pub fn observed_min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Observed dynamic range (max - min); zero for empty series.
    pub fn amplitude(&self) -> f64 {
        match (self.observed_max(), self.observed_min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0.0,
        }
    }
}

/// Well-to-strain mapping for one plate.
///
/// The layout may be partial: wells without an entry are still fit
/// individually but are excluded from strain aggregation (non-strict mode).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlateLayout {
    assignments: BTreeMap<WellId, String>,
}

impl PlateLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock checkerboard template: two strains alternating per well,
    /// covering the full plate.
    pub fn checkerboard(strain_a: &str, strain_b: &str) -> Self {
        let mut assignments = BTreeMap::new();
        for well in WellId::all() {
            let strain = if (well.row_index() + well.col_index()) % 2 == 0 {
                strain_a
            } else {
                strain_b
            };
            assignments.insert(well, strain.to_string());
        }
        Self { assignments }
    }

    pub fn assign(&mut self, well: WellId, strain: impl Into<String>) {
        self.assignments.insert(well, strain.into());
    }

    /// Strain label for a well, or `None` when the well is unassigned.
    pub fn resolve(&self, well: WellId) -> Option<&str> {
        self.assignments.get(&well).map(String::as_str)
    }

    /// Distinct strain labels, sorted.
    pub fn strains(&self) -> BTreeSet<&str> {
        self.assignments.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Assigned wells in row-major order.
    pub fn wells(&self) -> impl Iterator<Item = (WellId, &str)> {
        self.assignments.iter().map(|(w, s)| (*w, s.as_str()))
    }
}

/// Which growth model(s) to attempt per well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    /// Fit all candidates and select by information criterion.
    Auto,
    Logistic,
    Gompertz,
    Richards,
}

/// Concrete fitted growth-model kind.
///
/// All three are sigmoids that are linear in `(y0, k)` given their shape
/// parameters, which is what makes the grid-search fitting strategy work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Logistic,
    Gompertz,
    Richards,
}

impl ModelKind {
    /// Human-readable label for reports.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Logistic => "logistic",
            ModelKind::Gompertz => "gompertz",
            ModelKind::Richards => "richards",
        }
    }

    /// Number of linear parameters (`y0`, `k`) solved by least squares.
    pub fn linear_len(self) -> usize {
        2
    }

    /// Number of nonlinear shape parameters searched over the grid.
    pub fn shape_len(self) -> usize {
        match self {
            ModelKind::Logistic | ModelKind::Gompertz => 2,
            ModelKind::Richards => 3,
        }
    }

    /// Total parameter count for information criteria.
    pub fn param_count(self) -> usize {
        self.linear_len() + self.shape_len()
    }

    /// Candidate order: simpler models first.
    pub fn all() -> [ModelKind; 3] {
        [ModelKind::Logistic, ModelKind::Gompertz, ModelKind::Richards]
    }
}

/// Fitted growth-curve parameters.
///
/// - `y0`: baseline population density (lower asymptote)
/// - `k`: carrying capacity (upper asymptote)
/// - `r`: growth rate (1/hour)
/// - `t_mid`: inflection/midpoint time (hours)
/// - `nu`: Richards shape parameter (`None` for 4-parameter models)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrowthParams {
    pub y0: f64,
    pub k: f64,
    pub r: f64,
    pub t_mid: f64,
    pub nu: Option<f64>,
}

/// Fit quality diagnostics for one model attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub rss: f64,
    pub rmse: f64,
    pub aic: f64,
    pub n: usize,
}

/// One converged model attempt for one well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFitResult {
    pub model: ModelKind,
    pub params: GrowthParams,
    pub quality: FitQuality,
}

/// Outcome class of a per-well fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitStatus {
    /// A model converged with plausible parameters.
    Converged,
    /// A model converged but the parameters are implausible (e.g. fitted
    /// capacity below the observed maximum). Retained and flagged.
    Degenerate,
    /// No model converged, or the series had too few usable points.
    Failed,
}

impl FitStatus {
    pub fn display_name(self) -> &'static str {
        match self {
            FitStatus::Converged => "converged",
            FitStatus::Degenerate => "degenerate",
            FitStatus::Failed => "failed",
        }
    }

    /// Wells usable for strain aggregation (everything but `Failed`).
    pub fn is_usable(self) -> bool {
        !matches!(self, FitStatus::Failed)
    }
}

/// The complete fit record for one well: status, chosen model, and the
/// per-model attempt diagnostics. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellFitResult {
    pub well: WellId,
    pub strain: Option<String>,
    pub status: FitStatus,
    /// The selected model fit; `None` iff `status == Failed`.
    pub best: Option<ModelFitResult>,
    /// All converged model attempts (selection inputs).
    pub attempts: Vec<ModelFitResult>,
    /// Models that produced no valid candidate, with the reason.
    pub skipped: Vec<(ModelKind, String)>,
    /// Why the well failed or was flagged degenerate.
    pub reason: Option<String>,
}

impl WellFitResult {
    /// Fitted growth rate, when a model was selected.
    pub fn growth_rate(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.params.r)
    }
}

/// Central-tendency statistic used for per-strain aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CentralStat {
    /// Median across wells (robust to outlier wells). Default.
    Median,
    Mean,
}

/// How multi-file results are pooled when pooling is requested.
///
/// Pooling is always explicit: per-file summaries are emitted regardless,
/// and a pooled block is appended only on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    /// Concatenate wells from every file, then summarize once.
    Wells,
    /// Average the per-file fitness coefficients.
    Files,
}

/// Per-strain aggregate over the usable wells of one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrainSummary {
    pub strain: String,
    /// File label (or "pooled") this summary was computed from.
    pub source: String,
    /// Central growth-rate statistic across wells.
    pub stat: f64,
    /// Dispersion across wells (MAD for median, standard deviation for mean).
    pub spread: f64,
    pub n_wells: usize,
}

/// Relative fitness of one test strain against the reference strain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub reference: String,
    pub test: String,
    pub source: String,
    /// Ratio of central growth statistics (test / reference). `> 1` predicts
    /// the test strain outcompetes the reference.
    pub coefficient: f64,
    /// Relative dispersions of the two strain statistics, propagated in
    /// quadrature and scaled by the coefficient.
    pub spread: f64,
}

/// Analysis configuration.
///
/// Constructed once (from CLI flags plus defaults) and passed down
/// explicitly; nothing here is mutated after construction, so the same
/// config can be shared across parallel per-well fits.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub model_spec: ModelSpec,

    /// Minimum usable points per well; fewer yields status `Failed`.
    pub min_points: usize,
    /// Minimum dynamic range; flatter series have no measurement beyond
    /// baseline and yield status `Failed`.
    pub min_amplitude: f64,

    /// Grid sizes for the shape-parameter search.
    pub rate_steps: usize,
    pub mid_steps: usize,
    pub nu_steps: usize,
    /// Zoom passes around the best grid candidate. This bounds the work per
    /// well, so one pathological well cannot stall a batch.
    pub refine_passes: usize,

    /// Plausibility floor for the fitted growth rate.
    pub rate_floor: f64,
    /// Fractional slack allowed between fitted capacity and the observed
    /// maximum before a fit is flagged degenerate.
    pub capacity_slack: f64,

    /// Fail the run when assay data contains a well absent from the layout.
    pub strict_layout: bool,

    pub central_stat: CentralStat,
    /// Pooling policy for multi-file summaries; `None` disables pooling.
    pub pooling: Option<Pooling>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_spec: ModelSpec::Auto,
            min_points: 4,
            min_amplitude: 1e-3,
            rate_steps: 13,
            mid_steps: 13,
            nu_steps: 7,
            refine_passes: 4,
            rate_floor: 1e-6,
            capacity_slack: 0.05,
            strict_layout: false,
            central_stat: CentralStat::Median,
            pooling: None,
        }
    }
}
