//! Frequency-grid reconciliation
//!
//! Whenever two differently-sampled operands are combined, both must
//! first be brought onto one common grid. `reconcile` returns the
//! operands unchanged when their grids already match; otherwise it
//! restricts the first operand's own grid to the overlap interval and
//! resamples both onto that restriction. A disjoint overlap is fatal to
//! the calling operation and is never skipped here.

use anyhow::{bail, Result};

use crate::curve::Curve;
use crate::frequency::Frequency;
use crate::network::Network;

/// A frequency-indexed value that can be resampled onto a new grid.
pub trait FreqSampled: Sized {
    /// Display name used in error messages
    fn ident(&self) -> &str;

    /// The operand's frequency axis
    fn axis(&self) -> &Frequency;

    /// Resample onto an explicit grid in Hz
    fn resampled_onto(&self, grid: &[f64]) -> Result<Self>;
}

impl FreqSampled for Curve {
    fn ident(&self) -> &str {
        self.label()
    }

    fn axis(&self) -> &Frequency {
        self.frequency()
    }

    fn resampled_onto(&self, grid: &[f64]) -> Result<Self> {
        Curve::resampled_onto(self, grid)
    }
}

impl FreqSampled for Network {
    fn ident(&self) -> &str {
        &self.name
    }

    fn axis(&self) -> &Frequency {
        &self.frequency
    }

    fn resampled_onto(&self, grid: &[f64]) -> Result<Self> {
        Network::resampled_onto(self, grid)
    }
}

/// Bring two operands onto a common frequency grid.
///
/// Identical grids pass through untouched (no interpolation
/// artifacts). Otherwise the common grid is the first operand's sample
/// points restricted to `[max(starts), min(stops)]`.
pub fn reconcile<A, B>(a: &A, b: &B) -> Result<(A, B)>
where
    A: FreqSampled + Clone,
    B: FreqSampled + Clone,
{
    if a.axis().same_grid(b.axis()) {
        return Ok((a.clone(), b.clone()));
    }

    let Some((lo, hi)) = a.axis().overlap(b.axis()) else {
        bail!(
            "'{}' ({:.6e}..{:.6e} Hz) and '{}' ({:.6e}..{:.6e} Hz) have no frequency overlap",
            a.ident(),
            a.axis().start(),
            a.axis().stop(),
            b.ident(),
            b.axis().start(),
            b.axis().stop()
        );
    };

    let grid = a.axis().restricted(lo, hi);
    if grid.is_empty() {
        bail!(
            "'{}' has no samples inside the overlap [{:.6e}, {:.6e}] Hz with '{}'",
            a.ident(),
            lo,
            hi,
            b.ident()
        );
    }

    Ok((a.resampled_onto(&grid)?, b.resampled_onto(&grid)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn ramp(label: &str, f: &[f64]) -> Curve {
        let v: Vec<Complex64> = f.iter().map(|&x| Complex64::new(x / 1e9, 0.0)).collect();
        Curve::new(
            label,
            Frequency::from_hz(f.to_vec()).unwrap(),
            v,
            Complex64::new(50.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_identity_when_grids_match() {
        let f = [1e9, 2e9, 3e9];
        let a = ramp("a", &f);
        let b = ramp("b", &f);
        let (ra, rb) = reconcile(&a, &b).unwrap();
        // unchanged, bit for bit
        assert_eq!(ra.values(), a.values());
        assert_eq!(rb.values(), b.values());
    }

    #[test]
    fn test_overlap_restriction() {
        let fa: Vec<f64> = (1..=10).map(|i| i as f64 * 1e9).collect();
        let fb: Vec<f64> = (5..=20).map(|i| i as f64 * 1e9).collect();
        let a = ramp("a", &fa);
        let b = ramp("b", &fb);

        let (ra, rb) = reconcile(&a, &b).unwrap();
        assert_relative_eq!(ra.frequency().start(), 5e9, epsilon = 1.0);
        assert_relative_eq!(ra.frequency().stop(), 10e9, epsilon = 1.0);
        assert!(ra.frequency().same_grid(rb.frequency()));
    }

    #[test]
    fn test_disjoint_ranges_fatal() {
        let a = ramp("a", &[1e9, 2e9]);
        let b = ramp("b", &[5e9, 6e9]);
        let err = reconcile(&a, &b).unwrap_err();
        assert!(err.to_string().contains("no frequency overlap"));
    }
}
