//! Stability and quality metrics
//!
//! Each metric condenses the S-matrix to one scalar per frequency
//! point and is returned as a labeled curve, so the full curve algebra
//! (cropping, statistics, plotting) applies to metrics too.

use anyhow::{bail, Result};
use ndarray::s;
use num_complex::Complex64;

use super::core::Network;
use crate::constants::NEAR_ZERO;
use crate::curve::Curve;
use crate::math::linalg::max_singular_value;

/// Which entries of `SᵀS*` the losslessness metric reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LosslessKind {
    /// Worst deviation of a diagonal entry from 1
    #[default]
    Diagonal,
    /// Worst off-diagonal magnitude
    OffDiagonal,
}

impl Network {
    /// Rollett stability factor `k` of a 2-port.
    ///
    /// `k = (1 - |S11|² - |S22|² + |Δ|²) / (2|S12||S21|)` with
    /// `Δ = S11·S22 - S12·S21`.
    pub fn stability_k(&self) -> Result<Curve> {
        self.require_2port("stability factor")?;
        let values = self.per_freq(|s11, s12, s21, s22| {
            let delta = s11 * s22 - s12 * s21;
            let denom = (2.0 * s12.norm() * s21.norm()).max(NEAR_ZERO);
            (1.0 - s11.norm_sqr() - s22.norm_sqr() + delta.norm_sqr()) / denom
        });
        self.metric_curve(format!("K({})", self.name), values)
    }

    /// Directional µ-stability factor.
    ///
    /// `port = 1` measures the distance to the nearest unstable load
    /// (µ1); `port = 2` swaps which port plays the load role (µ2).
    /// µ > 1 everywhere means unconditional stability.
    pub fn stability_mu(&self, port: usize) -> Result<Curve> {
        self.require_2port("mu factor")?;
        if port != 1 && port != 2 {
            bail!("network '{}': mu port must be 1 or 2, got {}", self.name, port);
        }
        let values = self.per_freq(|s11, s12, s21, s22| {
            let delta = s11 * s22 - s12 * s21;
            let (near, far) = if port == 1 { (s11, s22) } else { (s22, s11) };
            let denom = ((far - delta * near.conj()).norm() + (s12 * s21).norm()).max(NEAR_ZERO);
            (1.0 - near.norm_sqr()) / denom
        });
        self.metric_curve(format!("mu{}({})", port, self.name), values)
    }

    /// Passivity metric: largest eigenvalue of `SᴴS` per frequency.
    ///
    /// Equals the squared largest singular value of S; a passive
    /// network stays at or below 1, a unitary (lossless) network sits
    /// at exactly 1.
    pub fn passivity(&self) -> Result<Curve> {
        let values: Vec<f64> = (0..self.nfreq())
            .map(|f| {
                let slice = self.s.slice(s![f, .., ..]).to_owned();
                let sigma = max_singular_value(&slice);
                sigma * sigma
            })
            .collect();
        self.metric_curve(format!("passivity({})", self.name), values)
    }

    /// Reciprocity error: the worst `|Sij - Sji|` pair per frequency.
    ///
    /// Zero for a reciprocal network; for N > 2 ports the
    /// worst-offending pair is reported.
    pub fn reciprocity_error(&self) -> Result<Curve> {
        let n = self.nports();
        let values: Vec<f64> = (0..self.nfreq())
            .map(|f| {
                let mut worst = 0.0_f64;
                for i in 0..n {
                    for j in i + 1..n {
                        worst = worst.max((self.s[[f, i, j]] - self.s[[f, j, i]]).norm());
                    }
                }
                worst
            })
            .collect();
        self.metric_curve(format!("reciprocity({})", self.name), values)
    }

    /// Losslessness error: deviation of `SᵀS*` from the identity.
    ///
    /// Reports the worst diagonal offset from 1 or the worst
    /// off-diagonal magnitude, depending on `kind`.
    pub fn losslessness_error(&self, kind: LosslessKind) -> Result<Curve> {
        let n = self.nports();
        let values: Vec<f64> = (0..self.nfreq())
            .map(|f| {
                let mut worst = 0.0_f64;
                for i in 0..n {
                    for j in 0..n {
                        let mut e = Complex64::new(0.0, 0.0);
                        for k in 0..n {
                            e += self.s[[f, k, i]] * self.s[[f, k, j]].conj();
                        }
                        match kind {
                            LosslessKind::Diagonal if i == j => {
                                worst = worst.max((e - 1.0).norm());
                            }
                            LosslessKind::OffDiagonal if i != j => {
                                worst = worst.max(e.norm());
                            }
                            _ => {}
                        }
                    }
                }
                worst
            })
            .collect();
        let tag = match kind {
            LosslessKind::Diagonal => "diag",
            LosslessKind::OffDiagonal => "offdiag",
        };
        self.metric_curve(format!("losslessness {}({})", tag, self.name), values)
    }

    fn require_2port(&self, what: &str) -> Result<()> {
        if self.nports() != 2 {
            bail!(
                "network '{}': {} requires a 2-port ({} ports)",
                self.name,
                what,
                self.nports()
            );
        }
        Ok(())
    }

    fn per_freq(&self, f: impl Fn(Complex64, Complex64, Complex64, Complex64) -> f64) -> Vec<f64> {
        (0..self.nfreq())
            .map(|k| {
                f(
                    self.s[[k, 0, 0]],
                    self.s[[k, 0, 1]],
                    self.s[[k, 1, 0]],
                    self.s[[k, 1, 1]],
                )
            })
            .collect()
    }

    fn metric_curve(&self, label: String, values: Vec<f64>) -> Result<Curve> {
        Curve::new(
            label,
            self.frequency.clone(),
            values.into_iter().map(|v| Complex64::new(v, 0.0)).collect(),
            self.z0_system(),
        )
        .map(|c| c.with_provenance(self.name.clone()))
    }
}
