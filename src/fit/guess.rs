//! Initial-guess heuristics and deterministic shape grids.
//!
//! We fit each growth model by grid search over its nonlinear shape
//! parameters (rate, midpoint time, optional Richards shape).
//!
//! Why grid search?
//! - It avoids the local-minima and divergence issues of unconstrained
//!   nonlinear optimizers on noisy plate data.
//! - It is deterministic given the same series and config.
//! - Parameter bounds (rate > 0, midpoint >= 0, shape > 0) hold by
//!   construction instead of needing a constrained solver.
//!
//! The grids are centered on cheap empirical heuristics: the observed
//! maximum anchors the capacity (solved linearly, not gridded), the
//! steepest observed slope anchors the rate, and the half-maximum crossing
//! anchors the midpoint.

use crate::domain::{AnalysisConfig, ModelKind};

/// Span searched around the empirical rate guess (multiplicative, per side).
const RATE_SPAN: f64 = 6.0;
/// Richards shape search range.
const NU_MIN: f64 = 0.2;
const NU_MAX: f64 = 5.0;

/// Empirical anchors derived from one well's series.
#[derive(Debug, Clone, Copy)]
pub struct Guess {
    /// Steepest-slope-based growth-rate guess (1/hour), always positive.
    pub rate: f64,
    /// Half-maximum crossing time (hours).
    pub mid: f64,
    pub t_min: f64,
    pub t_max: f64,
}

/// Derive guesses from the data (spec'd heuristics: max value anchors the
/// capacity, steepest slope the rate, half-max crossing the midpoint).
pub fn empirical_guess(times: &[f64], values: &[f64]) -> Guess {
    let t_min = times.first().copied().unwrap_or(0.0);
    let t_max = times.last().copied().unwrap_or(1.0);

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let amplitude = (hi - lo).max(f64::MIN_POSITIVE);

    // Steepest finite-difference slope. For a logistic curve the maximum
    // slope is r * amplitude / 4, so invert that to get the rate guess.
    let mut slope_max = 0.0_f64;
    for i in 1..times.len() {
        let dt = times[i] - times[i - 1];
        if dt > 0.0 {
            let slope = (values[i] - values[i - 1]) / dt;
            if slope.is_finite() {
                slope_max = slope_max.max(slope);
            }
        }
    }
    let mut rate = 4.0 * slope_max / amplitude;
    if !(rate.is_finite() && rate > 0.0) {
        rate = 1.0;
    }

    // First crossing of the half-maximum level, linearly interpolated.
    let half = (lo + hi) / 2.0;
    let mut mid = (t_min + t_max) / 2.0;
    for i in 1..times.len() {
        if values[i - 1] < half && values[i] >= half {
            let frac = (half - values[i - 1]) / (values[i] - values[i - 1]);
            mid = times[i - 1] + frac * (times[i] - times[i - 1]);
            break;
        }
    }

    Guess {
        rate,
        mid,
        t_min,
        t_max,
    }
}

/// Per-dimension search ranges for one model's shape parameters.
#[derive(Debug, Clone, Copy)]
pub struct ShapeRanges {
    pub rate: (f64, f64),
    pub mid: (f64, f64),
    /// `None` for 2-shape models (logistic, gompertz).
    pub nu: Option<(f64, f64)>,
}

/// Initial ranges straddling the empirical guesses.
pub fn initial_ranges(model: ModelKind, guess: &Guess) -> ShapeRanges {
    let rate = (guess.rate / RATE_SPAN, guess.rate * RATE_SPAN);
    // Midpoints are searched over the whole observation window; the guess
    // only matters as a fallback when the window is degenerate.
    let mid_lo = guess.t_min.max(0.0);
    let mid_hi = if guess.t_max > mid_lo {
        guess.t_max
    } else {
        mid_lo + 1.0
    };
    ShapeRanges {
        rate,
        mid: (mid_lo, mid_hi),
        nu: match model {
            ModelKind::Richards => Some((NU_MIN, NU_MAX)),
            _ => None,
        },
    }
}

/// Shrink the ranges to one grid step on each side of the best candidate.
///
/// Applied once per refinement pass; midpoint stays clamped to `>= 0` and
/// rate/shape stay positive by construction (log-spaced around a positive
/// center).
pub fn refine_ranges(ranges: &ShapeRanges, best: &[f64], config: &AnalysisConfig) -> ShapeRanges {
    let rate = log_step_window(ranges.rate, best[0], config.rate_steps);
    let mid_step = (ranges.mid.1 - ranges.mid.0) / (config.mid_steps.max(2) as f64 - 1.0);
    let mid = ((best[1] - mid_step).max(0.0), best[1] + mid_step);
    let nu = ranges
        .nu
        .map(|range| log_step_window(range, best[2], config.nu_steps));
    ShapeRanges { rate, mid, nu }
}

fn log_step_window(range: (f64, f64), center: f64, steps: usize) -> (f64, f64) {
    let steps = steps.max(2);
    let ratio = ((range.1 / range.0).ln() / (steps as f64 - 1.0)).exp();
    (center / ratio, center * ratio)
}

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    let steps = steps.max(2);
    let (min, max) = (min.max(f64::MIN_POSITIVE), max.max(f64::MIN_POSITIVE));
    let ln_min = min.ln();
    let step = (max.ln() - ln_min) / (steps as f64 - 1.0);
    (0..steps).map(|i| (ln_min + step * i as f64).exp()).collect()
}

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    let steps = steps.max(2);
    let step = (max - min) / (steps as f64 - 1.0);
    (0..steps).map(|i| min + step * i as f64).collect()
}

/// Materialize the full candidate grid (cartesian product of dimensions).
///
/// Tuple layout matches `models::shape_value`: `[rate, mid]` or
/// `[rate, mid, nu]`.
pub fn build_grid(model: ModelKind, ranges: &ShapeRanges, config: &AnalysisConfig) -> Vec<Vec<f64>> {
    let rates = log_space(ranges.rate.0, ranges.rate.1, config.rate_steps);
    let mids = lin_space(ranges.mid.0, ranges.mid.1, config.mid_steps);

    let mut out = Vec::new();
    match (model, ranges.nu) {
        (ModelKind::Richards, Some(nu_range)) => {
            let nus = log_space(nu_range.0, nu_range.1, config.nu_steps);
            for &r in &rates {
                for &m in &mids {
                    for &nu in &nus {
                        out.push(vec![r, m, nu]);
                    }
                }
            }
        }
        _ => {
            for &r in &rates {
                for &m in &mids {
                    out.push(vec![r, m]);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::predict;

    #[test]
    fn guess_recovers_rough_logistic_anchors() {
        let shape = [0.8, 6.0];
        let times: Vec<f64> = (0..48).map(|i| i as f64 * 0.25).collect();
        let values: Vec<f64> = times
            .iter()
            .map(|&t| predict(ModelKind::Logistic, t, 0.05, 1.0, &shape))
            .collect();

        let guess = empirical_guess(&times, &values);
        // The finite-difference heuristic undershoots the analytic slope a
        // little; a factor-of-two bracket is all the grid needs.
        assert!(guess.rate > 0.4 && guess.rate < 1.6, "rate={}", guess.rate);
        assert!((guess.mid - 6.0).abs() < 0.5, "mid={}", guess.mid);
    }

    #[test]
    fn guess_is_safe_on_flat_series() {
        let times = vec![0.0, 1.0, 2.0, 3.0];
        let values = vec![0.1, 0.1, 0.1, 0.1];
        let guess = empirical_guess(&times, &values);
        assert!(guess.rate.is_finite() && guess.rate > 0.0);
        assert!(guess.mid.is_finite());
    }

    #[test]
    fn grids_respect_bounds() {
        let config = crate::domain::AnalysisConfig::default();
        let guess = Guess {
            rate: 0.5,
            mid: 4.0,
            t_min: 0.0,
            t_max: 12.0,
        };
        for model in ModelKind::all() {
            let ranges = initial_ranges(model, &guess);
            for tuple in build_grid(model, &ranges, &config) {
                assert_eq!(tuple.len(), model.shape_len());
                assert!(tuple[0] > 0.0, "rate must stay positive");
                assert!(tuple[1] >= 0.0, "midpoint must stay non-negative");
                if model == ModelKind::Richards {
                    assert!(tuple[2] > 0.0, "shape must stay positive");
                }
            }
        }
    }

    #[test]
    fn refine_shrinks_ranges_around_best() {
        let config = crate::domain::AnalysisConfig::default();
        let ranges = ShapeRanges {
            rate: (0.1, 3.6),
            mid: (0.0, 12.0),
            nu: None,
        };
        let refined = refine_ranges(&ranges, &[0.6, 6.0], &config);
        assert!(refined.rate.0 < 0.6 && refined.rate.1 > 0.6);
        assert!(refined.rate.1 / refined.rate.0 < ranges.rate.1 / ranges.rate.0);
        assert!(refined.mid.0 < 6.0 && refined.mid.1 > 6.0);
        assert!(refined.mid.1 - refined.mid.0 < ranges.mid.1 - ranges.mid.0);
    }
}
