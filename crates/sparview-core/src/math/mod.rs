//! Mathematical support routines
//!
//! Scalar helpers shared by the curve algebra and the analysis
//! algorithms, plus the S-parameter matrix transforms and the small
//! linear-algebra kernels.

pub mod linalg;
pub mod transforms;

use num_complex::Complex64;

use crate::constants::DB_FLOOR_MAG;

/// Magnitude in dB with the -300 dB floor applied.
#[inline]
pub fn db20(z: Complex64) -> f64 {
    20.0 * z.norm().max(DB_FLOOR_MAG).log10()
}

/// Phase in radians.
#[inline]
pub fn radians(z: Complex64) -> f64 {
    z.arg()
}

/// Phase in degrees.
#[inline]
pub fn degrees(z: Complex64) -> f64 {
    z.arg().to_degrees()
}

/// Remove 2π jumps from a phase sequence in place.
pub fn unwrap_radians(phase: &mut [f64]) {
    use std::f64::consts::PI;
    let mut offset = 0.0;
    for i in 1..phase.len() {
        let diff = phase[i] + offset - phase[i - 1];
        if diff > PI {
            offset -= 2.0 * PI;
        } else if diff < -PI {
            offset += 2.0 * PI;
        }
        phase[i] += offset;
    }
}

/// Linear interpolation of tabulated real data at `xi`.
///
/// `x` must be strictly increasing and `xi` within `[x[0], x[n-1]]`;
/// values outside are clamped to the boundary samples.
pub fn interp_linear(x: &[f64], y: &[f64], xi: f64) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    if n == 1 || xi <= x[0] {
        return y[0];
    }
    if xi >= x[n - 1] {
        return y[n - 1];
    }
    let idx = match x.partition_point(|&v| v < xi) {
        0 => 0,
        i if i >= n => n - 2,
        i => i - 1,
    };
    let t = (xi - x[idx]) / (x[idx + 1] - x[idx]);
    y[idx] * (1.0 - t) + y[idx + 1] * t
}

/// Smallest power of two that is >= `n` (and >= 1).
pub fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Zeroth-order modified Bessel function of the first kind.
///
/// Series expansion, converged to machine precision for the argument
/// range a Kaiser window uses.
pub fn bessel_i0(x: f64) -> f64 {
    let half_sq = (x / 2.0) * (x / 2.0);
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..64 {
        term *= half_sq / ((k * k) as f64);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}
