//! Core `Network` container and constructors

use anyhow::{bail, Result};
use ndarray::{Array1, Array3};
use num_complex::Complex64;

use super::noise::NoiseParams;
use crate::curve::Curve;
use crate::frequency::Frequency;

/// An N-port network: a stack of square S-matrices over frequency.
///
/// Invariants, enforced at construction: every matrix is NxN with
/// N >= 1, the same N at every sample, and the stack depth equals the
/// number of frequency points.
#[derive(Debug, Clone)]
pub struct Network {
    /// Network name (file stem for loaded files)
    pub name: String,
    /// Frequency axis
    pub frequency: Frequency,
    /// S-parameter data `[nfreq, nports, nports]`
    pub s: Array3<Complex64>,
    /// Reference impedance per port
    pub z0: Array1<Complex64>,
    /// Noise parameters, if the network carries any
    pub noise: Option<NoiseParams>,
    /// Free-form comments (carried through file round trips)
    pub comments: Vec<String>,
}

impl Network {
    /// Create a new network, validating the shape invariants.
    pub fn new(
        name: impl Into<String>,
        frequency: Frequency,
        s: Array3<Complex64>,
        z0: Array1<Complex64>,
    ) -> Result<Self> {
        let name = name.into();
        let shape = s.shape();
        if shape[1] != shape[2] {
            bail!(
                "network '{}': S-matrix is not square ({}x{})",
                name,
                shape[1],
                shape[2]
            );
        }
        if shape[1] == 0 {
            bail!("network '{}': S-matrix has zero ports", name);
        }
        if shape[0] != frequency.npoints() {
            bail!(
                "network '{}': {} S-matrix samples for {} frequency points",
                name,
                shape[0],
                frequency.npoints()
            );
        }
        if z0.len() != shape[1] {
            bail!(
                "network '{}': {} port impedances for {} ports",
                name,
                z0.len(),
                shape[1]
            );
        }
        Ok(Self {
            name,
            frequency,
            s,
            z0,
            noise: None,
            comments: Vec::new(),
        })
    }

    /// Number of ports
    #[inline]
    pub fn nports(&self) -> usize {
        self.s.shape()[1]
    }

    /// Number of frequency points
    #[inline]
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }

    /// Frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        self.frequency.f()
    }

    /// System reference impedance: the port-0 impedance.
    #[inline]
    pub fn z0_system(&self) -> Complex64 {
        self.z0[0]
    }

    /// Extract one S-parameter as a labeled curve.
    ///
    /// Indices are 0-based; the label uses the conventional 1-based
    /// digits (`name.S21` for `to = 1, from = 0`).
    pub fn s_curve(&self, to: usize, from: usize) -> Result<Curve> {
        let n = self.nports();
        if to >= n || from >= n {
            bail!(
                "network '{}': S{}{} requested from a {}-port network",
                self.name,
                to + 1,
                from + 1,
                n
            );
        }
        let values: Vec<Complex64> = (0..self.nfreq()).map(|f| self.s[[f, to, from]]).collect();
        Curve::new(
            format!("{}.S{}{}", self.name, to + 1, from + 1),
            self.frequency.clone(),
            values,
            self.z0[to],
        )
        .map(|c| c.with_provenance(self.name.clone()))
    }

    /// Renormalize every port to a new reference impedance.
    pub fn renormalized(&self, z_new: Complex64) -> Result<Network> {
        let z0_new = Array1::from_elem(self.nports(), z_new);
        let s_new = crate::math::transforms::renormalize(&self.s, &self.z0, &z0_new)
            .ok_or_else(|| {
                anyhow::anyhow!("network '{}': renormalization is singular", self.name)
            })?;
        let mut out = Network::new(self.name.clone(), self.frequency.clone(), s_new, z0_new)?;
        out.noise = self.noise.clone();
        out.comments = self.comments.clone();
        Ok(out)
    }

    /// Copy of this network carrying a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Network {
        let mut out = self.clone();
        out.name = name.into();
        out
    }
}
