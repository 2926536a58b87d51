//! Frequency-to-time transform
//!
//! Converts a frequency-domain curve to its impulse or step response:
//! enforce an equidistant grid, extrapolate to DC with a
//! symmetry-consistent fit, window, zero-pad to a power of two with
//! the implied gain correction, inverse real-FFT, optional cumulative
//! sum and a fractional time shift quantized to the sample period.

use anyhow::{bail, Context, Result};
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::constants::DC_FREQ_TOL;
use crate::curve::Curve;
use crate::frequency::{linspace, Frequency};
use crate::math::{bessel_i0, linalg::lstsq, next_pow2};

/// Window family for the spectral taper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    Rectangular,
    Hann,
    #[default]
    Hamming,
    Blackman,
    /// Kaiser window; the shape parameter is β
    Kaiser,
}

impl WindowKind {
    /// Parse a window name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rect" | "rectangular" | "none" => Some(WindowKind::Rectangular),
            "hann" | "hanning" => Some(WindowKind::Hann),
            "hamming" => Some(WindowKind::Hamming),
            "blackman" => Some(WindowKind::Blackman),
            "kaiser" => Some(WindowKind::Kaiser),
            _ => None,
        }
    }
}

/// A named window with its shape parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Window {
    pub kind: WindowKind,
    /// Shape parameter; only the Kaiser window reads it (β)
    pub param: f64,
}

/// Impulse or step response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Impulse,
    Step,
}

/// Transform options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeDomainOptions {
    pub kind: ResponseKind,
    pub window: Window,
    /// Time shift in seconds, applied as a circular rotation quantized
    /// to the sample period
    pub shift_s: f64,
}

impl Curve {
    /// Convert to the time domain.
    ///
    /// The result is a real-valued curve whose x-vector is time in
    /// seconds.
    pub fn time_domain(&self, opts: &TimeDomainOptions) -> Result<Curve> {
        if self.len() < 2 {
            bail!(
                "curve '{}': time-domain transform needs at least 2 samples",
                self.label()
            );
        }

        // 1. equidistant grid
        let equalized = if self.frequency().is_equidistant() {
            self.clone()
        } else {
            let grid = linspace(
                self.frequency().start(),
                self.frequency().stop(),
                self.len(),
            );
            self.resampled_onto(&grid)
                .with_context(|| format!("equalizing grid of '{}'", self.label()))?
        };

        // 2. extrapolate to DC when the data starts above it
        let spectrum = extend_to_dc(&equalized)?;
        let df = spectrum.frequency().step();
        let n = spectrum.len();

        // 3. window
        let taper = window_samples(opts.window, n);
        let mut one_sided: Vec<Complex64> = spectrum
            .values()
            .iter()
            .zip(taper.iter())
            .map(|(&v, &w)| v * w)
            .collect();

        // 4. zero-pad the one-sided spectrum to a power of two; padding
        // raises the effective Nyquist rate, which the gain correction
        // undoes
        let padded = next_pow2(n);
        one_sided.resize(padded, Complex64::new(0.0, 0.0));
        let time_len = 2 * (padded - 1);
        let gain_correction = time_len as f64 / (2 * (n - 1)) as f64;

        // 5. inverse real-FFT via the conjugate-symmetric full spectrum
        let mut full = vec![Complex64::new(0.0, 0.0); time_len];
        full[..padded].copy_from_slice(&one_sided);
        for k in 1..padded - 1 {
            full[time_len - k] = one_sided[k].conj();
        }

        let mut planner = FftPlanner::new();
        planner.plan_fft_inverse(time_len).process(&mut full);

        let mut response: Vec<f64> = full.iter().map(|v| v.re / time_len as f64).collect();

        // 6. the impulse view keeps its peak invariant under padding;
        // the step view accumulates the raw per-sample weights so it
        // still settles at the DC value
        match opts.kind {
            ResponseKind::Impulse => {
                for v in response.iter_mut() {
                    *v *= gain_correction;
                }
            }
            ResponseKind::Step => {
                let mut acc = 0.0;
                for v in response.iter_mut() {
                    acc += *v;
                    *v = acc;
                }
            }
        }

        // 7. fractional shift as a circular rotation
        let dt = 1.0 / (df * time_len as f64);
        let shift = (opts.shift_s / dt).round() as i64;
        let shift = shift.rem_euclid(time_len as i64) as usize;
        response.rotate_right(shift);

        let time: Vec<f64> = (0..time_len).map(|i| i as f64 * dt).collect();
        let suffix = match opts.kind {
            ResponseKind::Impulse => "impulse",
            ResponseKind::Step => "step",
        };

        let mut out = Curve::new(
            format!("{} ({})", self.label(), suffix),
            Frequency::from_hz(time)?,
            response
                .into_iter()
                .map(|v| Complex64::new(v, 0.0))
                .collect(),
            self.z0(),
        )?;
        if let Some(p) = self.provenance() {
            out = out.with_provenance(p.to_string());
        }
        Ok(out)
    }
}

/// Extend a curve down to DC on its own spacing.
///
/// The missing leading samples are filled from a symmetry-consistent
/// least-squares fit over the leading data: an even polynomial for the
/// real part and an odd polynomial for the imaginary part, as required
/// for the spectrum of a real time-domain signal.
fn extend_to_dc(curve: &Curve) -> Result<Curve> {
    let f = curve.frequency().f();
    if f[0].abs() <= DC_FREQ_TOL {
        return Ok(curve.clone());
    }

    let df = curve.frequency().step();
    if df <= 0.0 {
        bail!("curve '{}': degenerate frequency spacing", curve.label());
    }

    // DC-aligned grid with (nearly) the original spacing
    let f_max = f[f.len() - 1];
    let n_new = (f_max / df).round() as usize + 1;
    let grid = linspace(0.0, f_max, n_new);
    let df_new = f_max / (n_new - 1) as f64;

    // leading points to synthesize from the fit
    let k0 = grid
        .iter()
        .filter(|&&x| x < f[0] - 0.25 * df_new)
        .count()
        .min(n_new - 1);

    let fit_n = curve.len().min(8);
    let scale = f[fit_n - 1];
    let fit_f: Vec<f64> = f[..fit_n].iter().map(|&x| x / scale).collect();
    let values = curve.values();

    // real: a0 + a1·x², imaginary: b0·x + b1·x³
    let a_even: Vec<Vec<f64>> = fit_f.iter().map(|&x| vec![1.0, x * x]).collect();
    let b_even: Vec<f64> = values[..fit_n].iter().map(|v| v.re).collect();
    let even = lstsq(&a_even, &b_even)
        .ok_or_else(|| anyhow::anyhow!("curve '{}': DC fit failed", curve.label()))?;

    let a_odd: Vec<Vec<f64>> = fit_f.iter().map(|&x| vec![x, x * x * x]).collect();
    let b_odd: Vec<f64> = values[..fit_n].iter().map(|v| v.im).collect();
    let odd = lstsq(&a_odd, &b_odd)
        .ok_or_else(|| anyhow::anyhow!("curve '{}': DC fit failed", curve.label()))?;

    let measured = curve.resampled_onto(&grid[k0..])?;

    let mut extended = Vec::with_capacity(n_new);
    for &x_hz in &grid[..k0] {
        let x = x_hz / scale;
        extended.push(Complex64::new(
            even[0] + even[1] * x * x,
            odd[0] * x + odd[1] * x * x * x,
        ));
    }
    extended.extend_from_slice(measured.values());

    let mut out = Curve::new(
        curve.label().to_string(),
        Frequency::from_hz(grid)?,
        extended,
        curve.z0(),
    )?;
    if let Some(p) = curve.provenance() {
        out = out.with_provenance(p.to_string());
    }
    Ok(out)
}

/// Right half of a symmetric window of length `2n-1`, so the taper is
/// 1 at DC and rolls off toward the band edge.
fn window_samples(window: Window, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let full = 2 * n - 1;

    let samples = match window.kind {
        WindowKind::Rectangular => vec![1.0; n],
        WindowKind::Hann => half_cosine(full, n, &[0.5, 0.5]),
        WindowKind::Hamming => half_cosine(full, n, &[0.54, 0.46]),
        WindowKind::Blackman => half_cosine(full, n, &[0.42, 0.5, 0.08]),
        WindowKind::Kaiser => {
            let beta = window.param.max(0.0);
            let denom = bessel_i0(beta);
            (0..n)
                .map(|i| {
                    let pos = (n - 1 + i) as f64;
                    let x = 2.0 * pos / (full - 1) as f64 - 1.0;
                    bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / denom
                })
                .collect()
        }
    };
    samples.into_iter().map(|w| w.max(0.0)).collect()
}

/// Generalized cosine window evaluated on the right half.
fn half_cosine(full: usize, n: usize, coeffs: &[f64]) -> Vec<f64> {
    use std::f64::consts::PI;
    (0..n)
        .map(|i| {
            let pos = (n - 1 + i) as f64;
            let x = 2.0 * PI * pos / (full - 1) as f64;
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * c * (k as f64 * x).cos()
                })
                .sum()
        })
        .collect()
}
