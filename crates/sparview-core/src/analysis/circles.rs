//! Smith-chart circle geometry
//!
//! Closed-form stability, constant-gain and constant-noise-figure
//! circles for a 2-port at a single frequency, plus the shared
//! point-sequence generator used to draw any of them.

use anyhow::{bail, Result};
use num_complex::Complex64;

use crate::constants::NEAR_ZERO;
use crate::curve::Curve;
use crate::frequency::Frequency;
use crate::network::Network;

/// Which reflection plane a stability circle lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilitySide {
    /// Load (output) plane; the origin is judged by |S11|
    #[default]
    Load,
    /// Source (input) plane; the origin is judged by |S22|
    Source,
}

/// Gain-circle variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GainKind {
    /// Operating power gain
    #[default]
    Operating,
    /// Available power gain (roles of S11/S22 swapped)
    Available,
}

/// Boundary between stable and potentially unstable terminations.
#[derive(Debug, Clone, Copy)]
pub struct StabilityCircle {
    pub center: Complex64,
    pub radius: f64,
    /// True when the circle interior is the stable region
    pub stable_inside: bool,
}

/// Constant-gain contour.
#[derive(Debug, Clone, Copy)]
pub struct GainCircle {
    pub center: Complex64,
    pub radius: f64,
}

/// Constant-noise-figure contour.
#[derive(Debug, Clone, Copy)]
pub struct NoiseCircle {
    pub center: Complex64,
    pub radius: f64,
}

/// `n` evenly spaced points on a circle, with the loop closed (the
/// first point is repeated at the end).
pub fn circle_points(center: Complex64, radius: f64, n: usize) -> Vec<Complex64> {
    let n = n.max(2);
    (0..=n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i % n) as f64 / n as f64;
            center + Complex64::from_polar(radius, theta)
        })
        .collect()
}

/// A closed circle sweep packaged as a curve over the sweep angle in
/// degrees, so the generic plot path renders it.
pub fn circle_curve(label: String, center: Complex64, radius: f64, n: usize) -> Result<Curve> {
    let points = circle_points(center, radius, n);
    let step = 360.0 / (points.len() - 1) as f64;
    let angles: Vec<f64> = (0..points.len()).map(|i| i as f64 * step).collect();
    Curve::new(label, Frequency::from_hz(angles)?, points, Complex64::new(50.0, 0.0))
}

impl Network {
    /// Stability circle at the sample nearest to `f_hz`.
    pub fn stability_circle(&self, f_hz: f64, side: StabilitySide) -> Result<StabilityCircle> {
        let (s11, s12, s21, s22) = self.two_port_at(f_hz, "stability circle")?;

        // the load circle formula; the source circle swaps port roles
        let (near, far) = match side {
            StabilitySide::Load => (s11, s22),
            StabilitySide::Source => (s22, s11),
        };
        let delta = s11 * s22 - s12 * s21;
        let denom = far.norm_sqr() - delta.norm_sqr();

        if denom.abs() < NEAR_ZERO {
            bail!(
                "network '{}': degenerate stability circle (|S|² equals |Δ|²)",
                self.name
            );
        }

        let center = (far - delta * near.conj()).conj() / denom;
        let radius = ((s12 * s21).norm() / denom).abs();

        let origin_inside = center.norm() < radius;
        let origin_stable = near.norm() < 1.0;

        Ok(StabilityCircle {
            center,
            radius,
            stable_inside: origin_inside == origin_stable,
        })
    }

    /// Constant-gain circle for a requested linear gain at the sample
    /// nearest to `f_hz`.
    pub fn gain_circle(&self, f_hz: f64, gain_linear: f64, kind: GainKind) -> Result<GainCircle> {
        if gain_linear <= 0.0 {
            bail!("network '{}': gain must be positive", self.name);
        }
        let (s11, s12, s21, s22) = self.two_port_at(f_hz, "gain circle")?;

        // available-gain circles swap which port is terminated
        let (near, far) = match kind {
            GainKind::Operating => (s11, s22),
            GainKind::Available => (s22, s11),
        };
        let delta = s11 * s22 - s12 * s21;

        let s21_sq = s21.norm_sqr();
        if s21_sq < NEAR_ZERO {
            bail!("network '{}': no transmission, gain circle undefined", self.name);
        }
        let g = gain_linear / s21_sq;

        let d2 = far.norm_sqr() - delta.norm_sqr();
        let denom = 1.0 + g * d2;
        if denom.abs() < NEAR_ZERO {
            bail!("network '{}': degenerate gain circle", self.name);
        }

        let k = {
            let num = 1.0 - s11.norm_sqr() - s22.norm_sqr() + delta.norm_sqr();
            num / (2.0 * (s12 * s21).norm().max(NEAR_ZERO))
        };
        let m = (s12 * s21).norm();
        let r_sq = 1.0 - 2.0 * k * m * g + m * m * g * g;
        if r_sq < 0.0 {
            bail!(
                "network '{}': requested gain {:.3} is not realizable at this frequency",
                self.name,
                gain_linear
            );
        }

        let center = g * (far - delta * near.conj()).conj() / denom;
        let radius = (r_sq.sqrt() / denom).abs();
        Ok(GainCircle { center, radius })
    }

    /// Constant-noise-figure circle from the carried noise parameters.
    pub fn noise_circle(&self, f_hz: f64, nf_db: f64) -> Result<NoiseCircle> {
        let Some(noise) = &self.noise else {
            bail!("network '{}' carries no noise parameters", self.name);
        };
        let (nfmin, gamma_opt, rn) = noise.at(f_hz);

        let nf = 10.0_f64.powf(nf_db / 10.0);
        if nf <= nfmin {
            bail!(
                "network '{}': requested NF {:.3} dB is below NFmin {:.3} dB",
                self.name,
                nf_db,
                10.0 * nfmin.log10()
            );
        }

        let n = (nf - nfmin) / (4.0 * rn) * (Complex64::new(1.0, 0.0) + gamma_opt).norm_sqr();
        let center = gamma_opt / (1.0 + n);
        let r_sq = (n * n + n * (1.0 - gamma_opt.norm_sqr())) / ((1.0 + n) * (1.0 + n));
        Ok(NoiseCircle {
            center,
            radius: r_sq.max(0.0).sqrt(),
        })
    }

    /// 2-port entries at the sample nearest to `f_hz`.
    fn two_port_at(
        &self,
        f_hz: f64,
        what: &str,
    ) -> Result<(Complex64, Complex64, Complex64, Complex64)> {
        if self.nports() != 2 {
            bail!(
                "network '{}': {} requires a 2-port ({} ports)",
                self.name,
                what,
                self.nports()
            );
        }
        let f = self.f();
        let idx = f
            .iter()
            .enumerate()
            .min_by(|a, b| {
                (a.1 - f_hz)
                    .abs()
                    .partial_cmp(&(b.1 - f_hz).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .expect("network is never empty");
        Ok((
            self.s[[idx, 0, 0]],
            self.s[[idx, 0, 1]],
            self.s[[idx, 1, 0]],
            self.s[[idx, 1, 1]],
        ))
    }
}
