//! Mixed-mode transforms
//!
//! Re-expresses a single-ended 4-port in the differential/common-mode
//! basis and back. Port convention for the single-ended side:
//! 0/1 form pair 1 (positive, negative), 2/3 form pair 2. The
//! mixed-mode side is ordered `[d1, d2, c1, c2]`.

use anyhow::{bail, Result};
use ndarray::{Array2, Array3};
use num_complex::Complex64;

use super::core::Network;

/// The orthonormal modal transformation matrix.
fn modal_matrix() -> Array2<f64> {
    let h = 1.0 / 2.0_f64.sqrt();
    ndarray::arr2(&[
        [h, -h, 0.0, 0.0],
        [0.0, 0.0, h, -h],
        [h, h, 0.0, 0.0],
        [0.0, 0.0, h, h],
    ])
}

impl Network {
    /// Single-ended to mixed-mode: `S_mm = M S Mᵀ`.
    pub fn to_mixed_mode(&self) -> Result<Network> {
        self.modal_transform(false)
    }

    /// Mixed-mode back to single-ended: `S = Mᵀ S_mm M`.
    pub fn from_mixed_mode(&self) -> Result<Network> {
        self.modal_transform(true)
    }

    fn modal_transform(&self, inverse: bool) -> Result<Network> {
        if self.nports() != 4 {
            bail!(
                "network '{}': mixed-mode transform requires 4 ports ({} given)",
                self.name,
                self.nports()
            );
        }

        let m = modal_matrix();
        let nfreq = self.nfreq();
        let mut s_new = Array3::<Complex64>::zeros((nfreq, 4, 4));

        for f in 0..nfreq {
            for i in 0..4 {
                for j in 0..4 {
                    let mut sum = Complex64::new(0.0, 0.0);
                    for k in 0..4 {
                        for l in 0..4 {
                            // M is orthogonal, so the inverse transform
                            // just transposes the factors
                            let (a, b) = if inverse {
                                (m[[k, i]], m[[l, j]])
                            } else {
                                (m[[i, k]], m[[j, l]])
                            };
                            sum += self.s[[f, k, l]] * (a * b);
                        }
                    }
                    s_new[[f, i, j]] = sum;
                }
            }
        }

        let suffix = if inverse { "se" } else { "mm" };
        let mut out = Network::new(
            format!("{} ({})", self.name, suffix),
            self.frequency.clone(),
            s_new,
            self.z0.clone(),
        )?;
        out.comments = self.comments.clone();
        Ok(out)
    }
}
