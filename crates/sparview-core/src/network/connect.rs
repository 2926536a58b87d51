//! Port-connection operator
//!
//! Sub-network growth algorithm for joining ports of S-matrices, after
//! Filipsson, "A New General Computer Algorithm for S-Matrix
//! Calculation of Interconnected Multiports" (11th EuMC, 1981). This is
//! the composition primitive all cascading in the engine funnels into.

use anyhow::{anyhow, bail, Result};
use ndarray::Array3;
use num_complex::Complex64;

use super::core::Network;

/// Join two ports inside one S-matrix stack.
///
/// Connecting port `k` to port `l` removes both from the external port
/// list; the result has `nports - 2` ports.
pub fn innerconnect_s(a: &Array3<Complex64>, k: usize, l: usize) -> Result<Array3<Complex64>> {
    let nfreq = a.shape()[0];
    let nports = a.shape()[1];

    if k >= nports || l >= nports {
        bail!("connection ports ({}, {}) out of range for {} ports", k, l, nports);
    }
    if k == l {
        bail!("cannot connect port {} to itself", k);
    }

    let int_ports = [k, l];
    let ext_ports: Vec<usize> = (0..nports).filter(|p| *p != k && *p != l).collect();
    let n_ext = ext_ports.len();

    // Pair-exchange matrix for the single joined pair
    let mut m = nalgebra::DMatrix::<Complex64>::zeros(2, 2);
    m[(0, 1)] = Complex64::new(1.0, 0.0);
    m[(1, 0)] = Complex64::new(1.0, 0.0);

    let mut result = Array3::<Complex64>::zeros((nfreq, n_ext, n_ext));

    for f in 0..nfreq {
        let s_ee = nalgebra::DMatrix::<Complex64>::from_fn(n_ext, n_ext, |i, j| {
            a[[f, ext_ports[i], ext_ports[j]]]
        });
        let s_ei = nalgebra::DMatrix::<Complex64>::from_fn(n_ext, 2, |i, j| {
            a[[f, ext_ports[i], int_ports[j]]]
        });
        let s_ie = nalgebra::DMatrix::<Complex64>::from_fn(2, n_ext, |i, j| {
            a[[f, int_ports[i], ext_ports[j]]]
        });
        let s_ii =
            nalgebra::DMatrix::<Complex64>::from_fn(2, 2, |i, j| a[[f, int_ports[i], int_ports[j]]]);

        // S' = S_ee + S_ei (I - M S_ii)^-1 M S_ie
        let identity = nalgebra::DMatrix::<Complex64>::identity(2, 2);
        let block = (identity - &m * s_ii)
            .try_inverse()
            .ok_or_else(|| anyhow!("singular connection at frequency index {}", f))?;
        let s_new = s_ee + s_ei * block * &m * s_ie;

        for i in 0..n_ext {
            for j in 0..n_ext {
                result[[f, i, j]] = s_new[(i, j)];
            }
        }
    }

    Ok(result)
}

/// Connect port `k` of stack `a` to port `l` of stack `b`.
///
/// The stacks are placed block-diagonally into one composite matrix,
/// then the two ports are joined. The result has
/// `nports_a + nports_b - 2` ports, ordered a-ports-first.
pub fn connect_s(
    a: &Array3<Complex64>,
    k: usize,
    b: &Array3<Complex64>,
    l: usize,
) -> Result<Array3<Complex64>> {
    let nfreq = a.shape()[0];
    let (na, nb) = (a.shape()[1], b.shape()[1]);

    if k >= na {
        bail!("port {} out of range (left operand has {} ports)", k, na);
    }
    if l >= nb {
        bail!("port {} out of range (right operand has {} ports)", l, nb);
    }
    if b.shape()[0] != nfreq {
        bail!("frequency count mismatch: {} vs {}", nfreq, b.shape()[0]);
    }

    let nc = na + nb;
    let mut composite = Array3::<Complex64>::zeros((nfreq, nc, nc));
    for f in 0..nfreq {
        for i in 0..na {
            for j in 0..na {
                composite[[f, i, j]] = a[[f, i, j]];
            }
        }
        for i in 0..nb {
            for j in 0..nb {
                composite[[f, na + i, na + j]] = b[[f, i, j]];
            }
        }
    }

    innerconnect_s(&composite, k, na + l)
}

impl Network {
    /// Connect two of this network's own ports together.
    pub fn innerconnect(&self, k: usize, l: usize) -> Result<Network> {
        let s_new = innerconnect_s(&self.s, k, l)?;
        let z0_new: Vec<Complex64> = (0..self.nports())
            .filter(|p| *p != k && *p != l)
            .map(|p| self.z0[p])
            .collect();
        Network::new(
            self.name.clone(),
            self.frequency.clone(),
            s_new,
            ndarray::Array1::from_vec(z0_new),
        )
    }

    /// Connect this network's port `k` to another network's port `l`.
    ///
    /// Frequency grids must already match; the engine-level cascade
    /// reconciles them before delegating here.
    pub fn connect(&self, k: usize, other: &Network, l: usize) -> Result<Network> {
        if self.nfreq() != other.nfreq() {
            bail!(
                "'{}' and '{}': frequency count mismatch ({} vs {})",
                self.name,
                other.name,
                self.nfreq(),
                other.nfreq()
            );
        }

        let s_new = connect_s(&self.s, k, &other.s, l)?;
        let z0_new: Vec<Complex64> = (0..self.nports())
            .filter(|p| *p != k)
            .map(|p| self.z0[p])
            .chain((0..other.nports()).filter(|p| *p != l).map(|p| other.z0[p]))
            .collect();
        Network::new(
            self.name.clone(),
            self.frequency.clone(),
            s_new,
            ndarray::Array1::from_vec(z0_new),
        )
    }
}
