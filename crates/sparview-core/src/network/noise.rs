//! Noise parameters
//!
//! Storage for the classic four-parameter noise model of a 2-port
//! (minimum noise figure, optimum source reflection, equivalent noise
//! resistance) and interpolation to a requested frequency. The noise
//! circle geometry built on these lives in `analysis::circles`.

use anyhow::{bail, Result};
use num_complex::Complex64;

use super::core::Network;
use crate::math::interp_linear;

/// Noise parameters sampled over frequency.
#[derive(Debug, Clone)]
pub struct NoiseParams {
    /// Sample frequencies in Hz, strictly increasing
    pub f_hz: Vec<f64>,
    /// Minimum noise figure, linear (not dB)
    pub nfmin: Vec<f64>,
    /// Optimum source reflection coefficient
    pub gamma_opt: Vec<Complex64>,
    /// Equivalent noise resistance, normalized to the system impedance
    pub rn: Vec<f64>,
}

impl NoiseParams {
    /// Build from dB-valued minimum noise figures.
    pub fn from_db(
        f_hz: Vec<f64>,
        nfmin_db: Vec<f64>,
        gamma_opt: Vec<Complex64>,
        rn: Vec<f64>,
    ) -> Result<Self> {
        let n = f_hz.len();
        if n == 0 || nfmin_db.len() != n || gamma_opt.len() != n || rn.len() != n {
            bail!("noise parameter vectors must share one non-zero length");
        }
        Ok(Self {
            f_hz,
            nfmin: nfmin_db.iter().map(|db| 10.0_f64.powf(db / 10.0)).collect(),
            gamma_opt,
            rn,
        })
    }

    /// Interpolated `(nfmin, gamma_opt, rn)` at `f` Hz.
    pub fn at(&self, f: f64) -> (f64, Complex64, f64) {
        let nfmin = interp_linear(&self.f_hz, &self.nfmin, f);
        let rn = interp_linear(&self.f_hz, &self.rn, f);
        let re: Vec<f64> = self.gamma_opt.iter().map(|g| g.re).collect();
        let im: Vec<f64> = self.gamma_opt.iter().map(|g| g.im).collect();
        let gamma = Complex64::new(
            interp_linear(&self.f_hz, &re, f),
            interp_linear(&self.f_hz, &im, f),
        );
        (nfmin, gamma, rn)
    }
}

impl Network {
    /// Attach noise parameters.
    pub fn with_noise(mut self, noise: NoiseParams) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Noise figure in dB for a given source reflection coefficient.
    ///
    /// `NF = NFmin + 4·Rn·|Γs - Γopt|² / ((1-|Γs|²)·|1+Γopt|²)`,
    /// evaluated at every noise sample frequency.
    pub fn noise_figure(&self, gamma_s: Complex64) -> Result<Vec<f64>> {
        let Some(noise) = &self.noise else {
            bail!("network '{}' carries no noise parameters", self.name);
        };

        let gs_sq = gamma_s.norm_sqr();
        if gs_sq >= 1.0 {
            bail!(
                "network '{}': source reflection magnitude must be below 1",
                self.name
            );
        }

        Ok((0..noise.f_hz.len())
            .map(|i| {
                let diff = (gamma_s - noise.gamma_opt[i]).norm_sqr();
                let denom = (1.0 - gs_sq) * (Complex64::new(1.0, 0.0) + noise.gamma_opt[i]).norm_sqr();
                let nf = noise.nfmin[i] + 4.0 * noise.rn[i] * diff / denom;
                10.0 * nf.log10()
            })
            .collect())
    }
}
