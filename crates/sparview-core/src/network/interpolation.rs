//! Network resampling
//!
//! Complex-linear interpolation of the S-matrix stack onto new
//! frequency grids. The grid reconciler delegates network resampling
//! here.

use anyhow::{Context, Result};
use ndarray::Array3;
use num_complex::Complex64;

use super::core::Network;
use crate::frequency::Frequency;

impl Network {
    /// Resample the S-matrix onto an explicit grid in Hz.
    ///
    /// Interpolation is linear in the complex plane per matrix entry.
    /// Grid points outside the data range are clamped to the boundary
    /// samples (the reconciler never requests any).
    pub fn resampled_onto(&self, grid: &[f64]) -> Result<Network> {
        let frequency = Frequency::from_hz(grid.to_vec())
            .with_context(|| format!("resampling network '{}'", self.name))?;

        let nports = self.nports();
        let f_old = self.frequency.f();
        let mut s_new = Array3::<Complex64>::zeros((grid.len(), nports, nports));

        for i in 0..nports {
            for j in 0..nports {
                for (gi, &x) in grid.iter().enumerate() {
                    s_new[[gi, i, j]] = interp_entry(f_old, &self.s, i, j, x);
                }
            }
        }

        let mut out = Network::new(self.name.clone(), frequency, s_new, self.z0.clone())?;
        out.noise = self.noise.clone();
        out.comments = self.comments.clone();
        Ok(out)
    }

    /// Crop to the inclusive frequency range `[lo, hi]` in Hz.
    ///
    /// An empty result is fatal.
    pub fn crop(&self, lo: f64, hi: f64) -> Result<Network> {
        let keep: Vec<usize> = self
            .f()
            .iter()
            .enumerate()
            .filter(|(_, &x)| x >= lo && x <= hi)
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            anyhow::bail!(
                "network '{}': no samples inside [{:.6e}, {:.6e}] Hz",
                self.name,
                lo,
                hi
            );
        }

        let nports = self.nports();
        let f_new: Vec<f64> = keep.iter().map(|&i| self.f()[i]).collect();
        let mut s_new = Array3::<Complex64>::zeros((keep.len(), nports, nports));
        for (new_i, &old_i) in keep.iter().enumerate() {
            for i in 0..nports {
                for j in 0..nports {
                    s_new[[new_i, i, j]] = self.s[[old_i, i, j]];
                }
            }
        }

        let mut out = Network::new(
            self.name.clone(),
            Frequency::from_hz(f_new)?,
            s_new,
            self.z0.clone(),
        )?;
        out.noise = self.noise.clone();
        out.comments = self.comments.clone();
        Ok(out)
    }
}

/// Linear interpolation of one matrix entry at `x`.
fn interp_entry(f: &[f64], s: &Array3<Complex64>, i: usize, j: usize, x: f64) -> Complex64 {
    let n = f.len();
    if n == 1 || x <= f[0] {
        return s[[0, i, j]];
    }
    if x >= f[n - 1] {
        return s[[n - 1, i, j]];
    }

    let idx = match f.partition_point(|&v| v < x) {
        0 => 0,
        k if k >= n => n - 2,
        k => k - 1,
    };
    let t = (x - f[idx]) / (f[idx + 1] - f[idx]);
    s[[idx, i, j]] * (1.0 - t) + s[[idx + 1, i, j]] * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{FrequencyUnit, SweepType};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn ramp_network() -> Network {
        let freq = Frequency::new(1.0, 5.0, 5, FrequencyUnit::GHz, SweepType::Linear);
        let mut s = Array3::<Complex64>::zeros((5, 1, 1));
        for f in 0..5 {
            s[[f, 0, 0]] = Complex64::new(f as f64 * 0.2, 0.0);
        }
        let z0 = Array1::from_elem(1, Complex64::new(50.0, 0.0));
        Network::new("ramp", freq, s, z0).unwrap()
    }

    #[test]
    fn test_resample_identity() {
        let ntwk = ramp_network();
        let grid = ntwk.f().to_vec();
        let out = ntwk.resampled_onto(&grid).unwrap();
        for f in 0..5 {
            assert_relative_eq!(out.s[[f, 0, 0]].re, ntwk.s[[f, 0, 0]].re, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_resample_midpoints() {
        let ntwk = ramp_network();
        let out = ntwk.resampled_onto(&[1.5e9, 2.5e9]).unwrap();
        assert_relative_eq!(out.s[[0, 0, 0]].re, 0.1, epsilon = 1e-12);
        assert_relative_eq!(out.s[[1, 0, 0]].re, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_crop_empty_fatal() {
        let ntwk = ramp_network();
        assert!(ntwk.crop(8e9, 9e9).is_err());
        let ok = ntwk.crop(2e9, 4e9).unwrap();
        assert_eq!(ok.nfreq(), 3);
    }
}
