//! Two-column least squares via the normal equations.
//!
//! Given fixed shape parameters, each growth model is linear in the baseline
//! and the carrying capacity:
//!
//! ```text
//! minimize Σ (y_i - [1 - s_i, s_i] · [y0, k]^T)^2
//! ```
//!
//! The design always has exactly two columns, so the Gram matrix is 2x2 and
//! a direct solve is much cheaper than a general factorization inside the
//! shape grid loop. Near the edges of the grid the two sigmoid columns can
//! become nearly parallel (flat series, extreme rates); those candidates are
//! rejected by the determinant guard rather than solved badly.

use nalgebra::{Matrix2, Vector2};

/// Relative determinant floor below which the two columns are treated as
/// collinear and no solution is returned.
const DET_REL_TOL: f64 = 1e-12;

/// Solve `G beta = rhs` for a 2x2 Gram matrix `G = X^T X`.
///
/// Returns `None` when the system is too ill-conditioned to solve robustly.
pub fn solve_normal_2x2(gram: &Matrix2<f64>, rhs: &Vector2<f64>) -> Option<Vector2<f64>> {
    let det = gram[(0, 0)] * gram[(1, 1)] - gram[(0, 1)] * gram[(1, 0)];
    let scale = gram[(0, 0)].max(gram[(1, 1)]);
    if !det.is_finite() || det.abs() <= DET_REL_TOL * scale * scale {
        return None;
    }

    let beta = Vector2::new(
        (gram[(1, 1)] * rhs[0] - gram[(0, 1)] * rhs[1]) / det,
        (gram[(0, 0)] * rhs[1] - gram[(1, 0)] * rhs[0]) / det,
    );
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// Least squares over explicit column slices; accumulates the normal
/// equations and solves them.
pub fn fit_two_columns(u: &[f64], v: &[f64], y: &[f64]) -> Option<Vector2<f64>> {
    let mut gram = Matrix2::zeros();
    let mut rhs = Vector2::zeros();
    for i in 0..y.len() {
        gram[(0, 0)] += u[i] * u[i];
        gram[(0, 1)] += u[i] * v[i];
        gram[(1, 1)] += v[i] * v[i];
        rhs[0] += u[i] * y[i];
        rhs[1] += v[i] * y[i];
    }
    gram[(1, 0)] = gram[(0, 1)];
    solve_normal_2x2(&gram, &rhs)
}
