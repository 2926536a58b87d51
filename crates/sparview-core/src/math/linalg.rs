//! Small linear-algebra kernels
//!
//! nalgebra-backed least squares for the DC-extrapolation fit, the
//! largest singular value used by the passivity metric, and the 2x2
//! matrix square root used by half-circuit extraction. All
//! ndarray<->nalgebra conversions are contained here.

use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use num_complex::Complex64;

use crate::constants::NEAR_ZERO;

/// Solve the least-squares problem `A x = b` for real data via SVD.
///
/// Returns `None` when the system is rank-deficient beyond repair.
pub fn lstsq(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let rows = a.len();
    if rows == 0 || rows != b.len() {
        return None;
    }
    let cols = a[0].len();

    let m = DMatrix::from_fn(rows, cols, |i, j| a[i][j]);
    let rhs = DVector::from_fn(rows, |i, _| b[i]);

    let svd = m.svd(true, true);
    svd.solve(&rhs, 1e-12).ok().map(|x| x.iter().copied().collect())
}

/// Largest singular value of a complex matrix.
pub fn max_singular_value(m: &Array2<Complex64>) -> f64 {
    let (rows, cols) = m.dim();
    let na = DMatrix::from_fn(rows, cols, |i, j| m[[i, j]]);
    na.singular_values()
        .iter()
        .fold(0.0_f64, |acc, &v| acc.max(v))
}

/// Principal square root of a 2x2 complex matrix.
///
/// Closed form: `X = (M + sqrt(det M)·I) / sqrt(tr M + 2 sqrt(det M))`.
/// Returns `None` when the denominator vanishes (defective matrix).
pub fn sqrtm_2x2(m: &Array2<Complex64>) -> Option<Array2<Complex64>> {
    if m.dim() != (2, 2) {
        return None;
    }
    let (a, b, c, d) = (m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
    let det = a * d - b * c;
    let tr = a + d;

    let s = det.sqrt();
    let t = (tr + s * 2.0).sqrt();
    if t.norm() < NEAR_ZERO {
        return None;
    }

    let mut out = Array2::<Complex64>::zeros((2, 2));
    out[[0, 0]] = (a + s) / t;
    out[[0, 1]] = b / t;
    out[[1, 0]] = c / t;
    out[[1, 1]] = (d + s) / t;
    Some(out)
}
