//! Half-circuit extraction
//!
//! Splits a doubled symmetric structure (e.g. a 2xThru fixture) into
//! two equal halves, so that `half ** half` reproduces the original.

use anyhow::{anyhow, bail, Result};
use ndarray::Array3;
use num_complex::Complex64;

use super::core::Network;
use crate::math::linalg::sqrtm_2x2;
use crate::math::transforms::{s2t, t2s};

/// Splitting technique for [`Network::halved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HalfMethod {
    /// Frequency-domain de-embedding: principal square root of the
    /// scattering-transfer matrix.
    #[default]
    Deembed,
    /// Naive midpoint split assuming a symmetric reciprocal structure:
    /// `a = S11/(1+S21)`, `b² = S21(1-a²)`.
    Midpoint,
}

impl Network {
    /// Extract one half of a doubled symmetric 2-port.
    pub fn halved(&self, method: HalfMethod) -> Result<Network> {
        if self.nports() != 2 {
            bail!(
                "half-circuit extraction requires a 2-port network ('{}' has {})",
                self.name,
                self.nports()
            );
        }

        let s_half = match method {
            HalfMethod::Deembed => self.half_deembed()?,
            HalfMethod::Midpoint => self.half_midpoint(),
        };

        let mut out = Network::new(
            format!("{}/2", self.name),
            self.frequency.clone(),
            s_half,
            self.z0.clone(),
        )?;
        out.comments = self.comments.clone();
        Ok(out)
    }

    fn half_deembed(&self) -> Result<Array3<Complex64>> {
        let t = s2t(&self.s)
            .ok_or_else(|| anyhow!("'{}': S21 vanishes, cannot split", self.name))?;

        let nfreq = self.nfreq();
        let mut t_half = Array3::<Complex64>::zeros((nfreq, 2, 2));
        for f in 0..nfreq {
            let slice = t.slice(ndarray::s![f, .., ..]).to_owned();
            let root = sqrtm_2x2(&slice).ok_or_else(|| {
                anyhow!(
                    "'{}': defective T-matrix at frequency index {}, cannot split",
                    self.name,
                    f
                )
            })?;
            t_half.slice_mut(ndarray::s![f, .., ..]).assign(&root);
        }

        t2s(&t_half).ok_or_else(|| anyhow!("'{}': half has no S representation", self.name))
    }

    fn half_midpoint(&self) -> Array3<Complex64> {
        let nfreq = self.nfreq();
        let one = Complex64::new(1.0, 0.0);
        let mut s_half = Array3::<Complex64>::zeros((nfreq, 2, 2));

        for f in 0..nfreq {
            let s11 = self.s[[f, 0, 0]];
            let s21 = self.s[[f, 1, 0]];

            let a = s11 / (one + s21);
            let b = (s21 * (one - a * a)).sqrt();

            s_half[[f, 0, 0]] = a;
            s_half[[f, 0, 1]] = b;
            s_half[[f, 1, 0]] = b;
            s_half[[f, 1, 1]] = a;
        }
        s_half
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{Frequency, FrequencyUnit, SweepType};
    use ndarray::Array1;

    /// Symmetric reciprocal 2-port: a slightly mismatched line.
    fn doubled_fixture() -> Network {
        let freq = Frequency::new(1.0, 5.0, 5, FrequencyUnit::GHz, SweepType::Linear);
        let mut s = Array3::<Complex64>::zeros((5, 2, 2));
        for f in 0..5 {
            let refl = Complex64::from_polar(0.08, 0.3 * f as f64);
            let thru = Complex64::from_polar(0.95, -0.7 * f as f64);
            s[[f, 0, 0]] = refl;
            s[[f, 1, 1]] = refl;
            s[[f, 0, 1]] = thru;
            s[[f, 1, 0]] = thru;
        }
        let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
        Network::new("2xthru", freq, s, z0).unwrap()
    }

    fn assert_cascade_reproduces(original: &Network, half: &Network, tol: f64) {
        let rebuilt = half.cascade(half).unwrap();
        for f in 0..original.nfreq() {
            for i in 0..2 {
                for j in 0..2 {
                    let d = (rebuilt.s[[f, i, j]] - original.s[[f, i, j]]).norm();
                    assert!(d < tol, "S{}{} differs by {} at index {}", i + 1, j + 1, d, f);
                }
            }
        }
    }

    #[test]
    fn test_deembed_half_cascades_back() {
        let n = doubled_fixture();
        let half = n.halved(HalfMethod::Deembed).unwrap();
        assert_cascade_reproduces(&n, &half, 1e-8);
    }

    #[test]
    fn test_midpoint_half_cascades_back() {
        let n = doubled_fixture();
        let half = n.halved(HalfMethod::Midpoint).unwrap();
        assert_cascade_reproduces(&n, &half, 1e-8);
    }
}
