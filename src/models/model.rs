//! Sigmoid shape functions and model evaluation.
//!
//! Every candidate model is written as
//!
//! ```text
//! y(t) = y0 * (1 - s(t)) + k * s(t)
//! ```
//!
//! where `s(t) ∈ [0, 1]` is a sigmoid that rises from 0 (baseline) to 1
//! (carrying capacity). The model is therefore linear in `(y0, k)` given the
//! shape parameters, and the fitter only has to search over the shape.
//!
//! Shape parameter layout (`shape` slices):
//! - logistic / gompertz: `[r, t_mid]`
//! - richards:            `[r, t_mid, nu]`

use crate::domain::{GrowthParams, ModelKind};

/// Sigmoid value `s(t)` for the given model kind.
///
/// # Panics
/// Panics if `shape` does not have length `model.shape_len()`. Callers size
/// these slices from the model kind.
pub fn shape_value(model: ModelKind, t: f64, shape: &[f64]) -> f64 {
    match model {
        ModelKind::Logistic => {
            let (r, t_mid) = (shape[0], shape[1]);
            1.0 / (1.0 + (-r * (t - t_mid)).exp())
        }
        ModelKind::Gompertz => {
            let (r, t_mid) = (shape[0], shape[1]);
            (-(-r * (t - t_mid)).exp()).exp()
        }
        ModelKind::Richards => {
            let (r, t_mid, nu) = (shape[0], shape[1], shape[2]);
            // nu -> 0 degenerates towards Gompertz; nu = 1 is logistic.
            let e = (-r * (t - t_mid)).exp();
            (1.0 + nu * e).powf(-1.0 / nu)
        }
    }
}

/// Fill the two-column design row `[1 - s, s]` for the linear solve.
pub fn fill_design_row(model: ModelKind, t: f64, shape: &[f64], out: &mut [f64]) {
    let s = shape_value(model, t, shape);
    out[0] = 1.0 - s;
    out[1] = s;
}

/// Predict `y(t)` from baseline/capacity plus shape parameters.
pub fn predict(model: ModelKind, t: f64, y0: f64, k: f64, shape: &[f64]) -> f64 {
    let s = shape_value(model, t, shape);
    y0 * (1.0 - s) + k * s
}

/// Predict `y(t)` from a full fitted parameter set.
pub fn predict_params(model: ModelKind, t: f64, params: &GrowthParams) -> f64 {
    match model {
        ModelKind::Logistic | ModelKind::Gompertz => {
            predict(model, t, params.y0, params.k, &[params.r, params.t_mid])
        }
        ModelKind::Richards => predict(
            model,
            t,
            params.y0,
            params.k,
            &[params.r, params.t_mid, params.nu.unwrap_or(1.0)],
        ),
    }
}

/// Pack shape values into a `GrowthParams` alongside the solved linear part.
pub fn pack_params(model: ModelKind, y0: f64, k: f64, shape: &[f64]) -> GrowthParams {
    GrowthParams {
        y0,
        k,
        r: shape[0],
        t_mid: shape[1],
        nu: match model {
            ModelKind::Richards => Some(shape[2]),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logistic_asymptotes() {
        let shape = [1.0, 10.0];
        let lo = predict(ModelKind::Logistic, -200.0, 0.1, 0.9, &shape);
        let hi = predict(ModelKind::Logistic, 200.0, 0.1, 0.9, &shape);
        assert!((lo - 0.1).abs() < 1e-9);
        assert!((hi - 0.9).abs() < 1e-9);

        // Midpoint sits halfway between baseline and capacity.
        let mid = predict(ModelKind::Logistic, 10.0, 0.1, 0.9, &shape);
        assert!((mid - 0.5).abs() < 1e-9);
    }

    #[test]
    fn gompertz_asymptotes() {
        let shape = [1.0, 5.0];
        let lo = predict(ModelKind::Gompertz, -200.0, 0.05, 1.2, &shape);
        let hi = predict(ModelKind::Gompertz, 200.0, 0.05, 1.2, &shape);
        assert!((lo - 0.05).abs() < 1e-9);
        assert!((hi - 1.2).abs() < 1e-9);
    }

    #[test]
    fn richards_with_unit_nu_matches_logistic() {
        for i in 0..30 {
            let t = i as f64 * 0.5;
            let logistic = shape_value(ModelKind::Logistic, t, &[0.8, 6.0]);
            let richards = shape_value(ModelKind::Richards, t, &[0.8, 6.0, 1.0]);
            assert!((logistic - richards).abs() < 1e-12);
        }
    }

    #[test]
    fn shape_values_stay_finite_and_bounded() {
        for model in ModelKind::all() {
            let shape = match model {
                ModelKind::Richards => vec![2.0, 4.0, 0.3],
                _ => vec![2.0, 4.0],
            };
            for i in -50..=50 {
                let t = i as f64;
                let s = shape_value(model, t, &shape);
                assert!(s.is_finite(), "{model:?} s({t}) not finite");
                assert!((-1e-12..=1.0 + 1e-12).contains(&s));
            }
        }
    }
}
