//! S-parameter matrix transforms
//!
//! Conversions between scattering parameters and the Z/Y/T
//! representations, plus reference-impedance renormalization. All
//! functions operate on `[nfreq, nports, nports]` stacks.

use ndarray::{s, Array1, Array2, Array3};
use num_complex::Complex64;

use crate::constants::NEAR_ZERO;

/// Convert S-parameters to Z-parameters.
///
/// `Z = F (I + S) (I - S)⁻¹ F` with `F = diag(sqrt(z0))`.
pub fn s2z(sp: &Array3<Complex64>, z0: &Array1<Complex64>) -> Option<Array3<Complex64>> {
    let (nfreq, nports) = (sp.shape()[0], sp.shape()[1]);
    assert_eq!(nports, z0.len(), "z0 length must match the port count");

    let identity = Array2::<Complex64>::eye(nports);
    let f_mat = diag(&z0.mapv(|x| x.sqrt()));
    let mut z = Array3::<Complex64>::zeros((nfreq, nports, nports));

    for f in 0..nfreq {
        let s_f = sp.slice(s![f, .., ..]);
        let num = &identity + &s_f;
        let den = invert(&(&identity - &s_f).to_owned())?;
        let z_f = f_mat.dot(&num.dot(&den)).dot(&f_mat);
        z.slice_mut(s![f, .., ..]).assign(&z_f);
    }
    Some(z)
}

/// Convert Z-parameters to S-parameters.
///
/// `S = F⁻¹ (Z - Z₀) (Z + Z₀)⁻¹ F` with `Z₀ = diag(z0)`.
pub fn z2s(z: &Array3<Complex64>, z0: &Array1<Complex64>) -> Option<Array3<Complex64>> {
    let (nfreq, nports) = (z.shape()[0], z.shape()[1]);
    assert_eq!(nports, z0.len(), "z0 length must match the port count");

    let sqrt_z0 = z0.mapv(|x| x.sqrt());
    let f_mat = diag(&sqrt_z0);
    let inv_f_mat = diag(&sqrt_z0.mapv(|x| Complex64::new(1.0, 0.0) / x));
    let z0_diag = diag(z0);
    let mut sp = Array3::<Complex64>::zeros((nfreq, nports, nports));

    for f in 0..nfreq {
        let z_f = z.slice(s![f, .., ..]);
        let num = &z_f - &z0_diag;
        let den = invert(&(&z_f + &z0_diag).to_owned())?;
        let s_f = inv_f_mat.dot(&num.dot(&den)).dot(&f_mat);
        sp.slice_mut(s![f, .., ..]).assign(&s_f);
    }
    Some(sp)
}

/// Convert S-parameters to Y-parameters.
pub fn s2y(sp: &Array3<Complex64>, z0: &Array1<Complex64>) -> Option<Array3<Complex64>> {
    let (nfreq, nports) = (sp.shape()[0], sp.shape()[1]);
    assert_eq!(nports, z0.len(), "z0 length must match the port count");

    let identity = Array2::<Complex64>::eye(nports);
    let g_mat = diag(&z0.mapv(|x| Complex64::new(1.0, 0.0) / x.sqrt()));
    let mut y = Array3::<Complex64>::zeros((nfreq, nports, nports));

    for f in 0..nfreq {
        let s_f = sp.slice(s![f, .., ..]);
        let num = &identity - &s_f;
        let den = invert(&(&identity + &s_f).to_owned())?;
        let y_f = g_mat.dot(&num.dot(&den)).dot(&g_mat);
        y.slice_mut(s![f, .., ..]).assign(&y_f);
    }
    Some(y)
}

/// Convert Y-parameters to S-parameters.
///
/// Normalizes with `Y' = F Y F`, then `S = (I - Y')(I + Y')⁻¹`.
pub fn y2s(y: &Array3<Complex64>, z0: &Array1<Complex64>) -> Option<Array3<Complex64>> {
    let (nfreq, nports) = (y.shape()[0], y.shape()[1]);
    assert_eq!(nports, z0.len(), "z0 length must match the port count");

    let identity = Array2::<Complex64>::eye(nports);
    let f_mat = diag(&z0.mapv(|x| x.sqrt()));
    let mut sp = Array3::<Complex64>::zeros((nfreq, nports, nports));

    for f in 0..nfreq {
        let y_f = y.slice(s![f, .., ..]);
        let y_norm = f_mat.dot(&y_f).dot(&f_mat);
        let num = &identity - &y_norm;
        let den = invert(&(&identity + &y_norm).to_owned())?;
        sp.slice_mut(s![f, .., ..]).assign(&num.dot(&den));
    }
    Some(sp)
}

/// Convert 2-port S-parameters to scattering-transfer (T) parameters.
///
/// Returns `None` for non-2-port stacks or where S21 vanishes.
pub fn s2t(sp: &Array3<Complex64>) -> Option<Array3<Complex64>> {
    let (nfreq, nports) = (sp.shape()[0], sp.shape()[1]);
    if nports != 2 {
        return None;
    }

    let mut t = Array3::<Complex64>::zeros((nfreq, 2, 2));
    for f in 0..nfreq {
        let s11 = sp[[f, 0, 0]];
        let s12 = sp[[f, 0, 1]];
        let s21 = sp[[f, 1, 0]];
        let s22 = sp[[f, 1, 1]];
        if s21.norm() < NEAR_ZERO {
            return None;
        }
        t[[f, 0, 0]] = (s12 * s21 - s11 * s22) / s21;
        t[[f, 0, 1]] = s11 / s21;
        t[[f, 1, 0]] = -s22 / s21;
        t[[f, 1, 1]] = Complex64::new(1.0, 0.0) / s21;
    }
    Some(t)
}

/// Convert scattering-transfer (T) parameters back to 2-port S-parameters.
pub fn t2s(t: &Array3<Complex64>) -> Option<Array3<Complex64>> {
    let (nfreq, nports) = (t.shape()[0], t.shape()[1]);
    if nports != 2 {
        return None;
    }

    let mut sp = Array3::<Complex64>::zeros((nfreq, 2, 2));
    for f in 0..nfreq {
        let t11 = t[[f, 0, 0]];
        let t12 = t[[f, 0, 1]];
        let t21 = t[[f, 1, 0]];
        let t22 = t[[f, 1, 1]];
        if t22.norm() < NEAR_ZERO {
            return None;
        }
        sp[[f, 0, 0]] = t12 / t22;
        sp[[f, 0, 1]] = t11 - t12 * t21 / t22;
        sp[[f, 1, 0]] = Complex64::new(1.0, 0.0) / t22;
        sp[[f, 1, 1]] = -t21 / t22;
    }
    Some(sp)
}

/// Renormalize an S-parameter stack from `z0_old` to `z0_new`.
///
/// Goes through the impedance representation, which is exact for any
/// port count.
pub fn renormalize(
    sp: &Array3<Complex64>,
    z0_old: &Array1<Complex64>,
    z0_new: &Array1<Complex64>,
) -> Option<Array3<Complex64>> {
    let z = s2z(sp, z0_old)?;
    z2s(&z, z0_new)
}

/// Diagonal matrix from a vector.
fn diag(v: &Array1<Complex64>) -> Array2<Complex64> {
    let n = v.len();
    let mut m = Array2::<Complex64>::zeros((n, n));
    for i in 0..n {
        m[[i, i]] = v[i];
    }
    m
}

/// Invert a small square complex matrix.
///
/// Closed forms for 1x1/2x2, Gauss-Jordan with partial pivoting above.
/// Returns `None` when singular.
pub fn invert(m: &Array2<Complex64>) -> Option<Array2<Complex64>> {
    let n = m.shape()[0];
    if n != m.shape()[1] {
        return None;
    }

    match n {
        1 => {
            let det = m[[0, 0]];
            (det.norm() >= NEAR_ZERO)
                .then(|| Array2::from_elem((1, 1), Complex64::new(1.0, 0.0) / det))
        }
        2 => {
            let (a, b, c, d) = (m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
            let det = a * d - b * c;
            if det.norm() < NEAR_ZERO {
                return None;
            }
            let inv_det = Complex64::new(1.0, 0.0) / det;
            let mut out = Array2::<Complex64>::zeros((2, 2));
            out[[0, 0]] = d * inv_det;
            out[[0, 1]] = -b * inv_det;
            out[[1, 0]] = -c * inv_det;
            out[[1, 1]] = a * inv_det;
            Some(out)
        }
        _ => invert_gauss(m),
    }
}

fn invert_gauss(m: &Array2<Complex64>) -> Option<Array2<Complex64>> {
    let n = m.shape()[0];
    let mut a = m.clone();
    let mut inv = Array2::<Complex64>::eye(n);

    for i in 0..n {
        let mut pivot_row = i;
        let mut pivot_mag = a[[i, i]].norm();
        for k in i + 1..n {
            if a[[k, i]].norm() > pivot_mag {
                pivot_row = k;
                pivot_mag = a[[k, i]].norm();
            }
        }
        if pivot_mag < NEAR_ZERO {
            return None;
        }
        if pivot_row != i {
            for j in 0..n {
                a.swap([i, j], [pivot_row, j]);
                inv.swap([i, j], [pivot_row, j]);
            }
        }

        let scale = a[[i, i]];
        for j in 0..n {
            a[[i, j]] /= scale;
            inv[[i, j]] /= scale;
        }

        for k in 0..n {
            if k == i {
                continue;
            }
            let factor = a[[k, i]];
            for j in 0..n {
                let va = a[[i, j]];
                let vi = inv[[i, j]];
                a[[k, j]] -= factor * va;
                inv[[k, j]] -= factor * vi;
            }
        }
    }
    Some(inv)
}
