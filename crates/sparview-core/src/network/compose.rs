//! Network composition
//!
//! Cascade (the `**` of the expression language), inversion (`~`) and
//! port flipping. Cascade reconciles the frequency grids first, then
//! delegates the actual join to the connection operator.

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array3;
use num_complex::Complex64;

use super::core::Network;
use crate::math::transforms::{invert, s2t, t2s};
use crate::reconcile::reconcile;

impl Network {
    /// Cascade with another 2-port: port 2 of `self` into port 1 of
    /// `other`.
    ///
    /// Differently-sampled operands are reconciled onto their common
    /// grid before the join; disjoint grids are fatal.
    pub fn cascade(&self, other: &Network) -> Result<Network> {
        if self.nports() != 2 || other.nports() != 2 {
            bail!(
                "cascade requires two 2-port networks ('{}' has {}, '{}' has {})",
                self.name,
                self.nports(),
                other.name,
                other.nports()
            );
        }

        let (a, b) = reconcile(self, other)
            .with_context(|| format!("cascading '{}' with '{}'", self.name, other.name))?;

        let mut out = a.connect(1, &b, 0)?;
        out.name = format!("{} ** {}", self.name, other.name);
        Ok(out)
    }

    /// The network that cascades with this one to a pass-through.
    ///
    /// Computed by inverting the scattering-transfer matrix, so
    /// `N ** ~N` is an ideal thru within numerical tolerance.
    pub fn inverted(&self) -> Result<Network> {
        if self.nports() != 2 {
            bail!(
                "inversion requires a 2-port network ('{}' has {})",
                self.name,
                self.nports()
            );
        }

        let t = s2t(&self.s)
            .ok_or_else(|| anyhow!("'{}': S21 vanishes, cannot invert", self.name))?;

        let nfreq = self.nfreq();
        let mut t_inv = Array3::<Complex64>::zeros((nfreq, 2, 2));
        for f in 0..nfreq {
            let slice = t.slice(ndarray::s![f, .., ..]).to_owned();
            let inv = invert(&slice)
                .ok_or_else(|| anyhow!("'{}': singular T-matrix at frequency index {}", self.name, f))?;
            t_inv.slice_mut(ndarray::s![f, .., ..]).assign(&inv);
        }

        let s_inv = t2s(&t_inv)
            .ok_or_else(|| anyhow!("'{}': inverse has no S representation", self.name))?;

        let mut out = Network::new(
            format!("~{}", self.name),
            self.frequency.clone(),
            s_inv,
            self.z0.clone(),
        )?;
        out.comments = self.comments.clone();
        Ok(out)
    }

    /// Swap ports 1 and 2 of a 2-port.
    pub fn flipped(&self) -> Result<Network> {
        if self.nports() != 2 {
            bail!(
                "flip requires a 2-port network ('{}' has {})",
                self.name,
                self.nports()
            );
        }

        let nfreq = self.nfreq();
        let mut s_new = Array3::<Complex64>::zeros((nfreq, 2, 2));
        for f in 0..nfreq {
            s_new[[f, 0, 0]] = self.s[[f, 1, 1]];
            s_new[[f, 0, 1]] = self.s[[f, 1, 0]];
            s_new[[f, 1, 0]] = self.s[[f, 0, 1]];
            s_new[[f, 1, 1]] = self.s[[f, 0, 0]];
        }

        let z0 = ndarray::Array1::from_vec(vec![self.z0[1], self.z0[0]]);
        let mut out = Network::new(self.name.clone(), self.frequency.clone(), s_new, z0)?;
        out.noise = self.noise.clone();
        out.comments = self.comments.clone();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{Frequency, FrequencyUnit, SweepType};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn sample_2port() -> Network {
        let freq = Frequency::new(1.0, 3.0, 3, FrequencyUnit::GHz, SweepType::Linear);
        let mut s = Array3::<Complex64>::zeros((3, 2, 2));
        for f in 0..3 {
            s[[f, 0, 0]] = Complex64::new(0.1, 0.02 * f as f64);
            s[[f, 0, 1]] = Complex64::from_polar(0.9, -0.4 * f as f64);
            s[[f, 1, 0]] = Complex64::from_polar(0.9, -0.4 * f as f64);
            s[[f, 1, 1]] = Complex64::new(-0.05, 0.01 * f as f64);
        }
        let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
        Network::new("dut", freq, s, z0).unwrap()
    }

    #[test]
    fn test_cascade_invert_roundtrip() {
        let n = sample_2port();
        let inv = n.inverted().unwrap();
        let thru = n.cascade(&inv).unwrap();

        for f in 0..thru.nfreq() {
            assert_relative_eq!(thru.s[[f, 1, 0]].re, 1.0, epsilon = 1e-9);
            assert_relative_eq!(thru.s[[f, 1, 0]].im, 0.0, epsilon = 1e-9);
            assert_relative_eq!(thru.s[[f, 0, 1]].re, 1.0, epsilon = 1e-9);
            assert!(thru.s[[f, 0, 0]].norm() < 1e-9);
            assert!(thru.s[[f, 1, 1]].norm() < 1e-9);
        }
    }

    #[test]
    fn test_flip_swaps_reflections() {
        let n = sample_2port();
        let fl = n.flipped().unwrap();
        assert_relative_eq!(fl.s[[0, 0, 0]].re, n.s[[0, 1, 1]].re, epsilon = 1e-15);
        assert_relative_eq!(fl.s[[0, 1, 1]].re, n.s[[0, 0, 0]].re, epsilon = 1e-15);
    }

    #[test]
    fn test_cascade_rejects_1port() {
        let freq = Frequency::new(1.0, 1.0, 1, FrequencyUnit::GHz, SweepType::Linear);
        let s = Array3::<Complex64>::zeros((1, 1, 1));
        let z0 = Array1::from_elem(1, Complex64::new(50.0, 0.0));
        let one = Network::new("load", freq, s, z0).unwrap();
        let two = sample_2port();
        assert!(two.cascade(&one).is_err());
    }
}
