//! Bode-Fano optimal return-loss bound
//!
//! The Bode-Fano criterion fixes the integral of `ln(1/|Γ|)` over
//! angular frequency for a given load. Redistributing that fixed
//! integral over a band of interest bounds the best average return
//! loss a lossless matching network could achieve there.

use anyhow::{bail, Result};
use std::f64::consts::PI;

use crate::constants::DB_FLOOR_MAG;
use crate::curve::Curve;
use crate::math::interp_linear;

/// An inclusive frequency band in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub start_hz: f64,
    pub stop_hz: f64,
}

impl Band {
    pub fn new(start_hz: f64, stop_hz: f64) -> Result<Self> {
        if !(start_hz >= 0.0 && stop_hz > start_hz) {
            bail!("invalid band [{:.6e}, {:.6e}] Hz", start_hz, stop_hz);
        }
        Ok(Self { start_hz, stop_hz })
    }

    fn angular_width(&self) -> f64 {
        2.0 * PI * (self.stop_hz - self.start_hz)
    }
}

/// Result of the bound computation; all figures in dB of average
/// return loss.
#[derive(Debug, Clone, Copy)]
pub struct BodeFanoResult {
    /// Average RL over the integration band as measured
    pub db_available: f64,
    /// Average RL currently realized over the target band
    pub db_current: f64,
    /// Best average RL over the target band achievable by optimally
    /// redistributing the integration-band integral
    pub db_achievable: f64,
    /// The integration band actually covered by data, after clipping
    pub actual_integration_band: (f64, f64),
}

/// Compute the Bode-Fano bound figures for a reflection curve.
///
/// `integration` is the band whose `∫ ln(1/|Γ|) dω` is treated as the
/// fixed matching budget; `target` is the band the user cares about.
pub fn bode_fano(curve: &Curve, integration: Band, target: Band) -> Result<BodeFanoResult> {
    let f = curve.frequency().f();
    let (data_lo, data_hi) = (f[0], f[f.len() - 1]);

    let clip_lo = integration.start_hz.max(data_lo);
    let clip_hi = integration.stop_hz.min(data_hi);
    if clip_lo >= clip_hi {
        bail!(
            "curve '{}' ({:.6e}..{:.6e} Hz) does not cover the integration band [{:.6e}, {:.6e}]",
            curve.label(),
            data_lo,
            data_hi,
            integration.start_hz,
            integration.stop_hz
        );
    }
    let clipped = Band::new(clip_lo, clip_hi)?;

    let integral_int = band_integral(curve, clipped)?;
    let db_available = to_avg_rl_db(integral_int, clipped.angular_width());

    let target_lo = target.start_hz.max(data_lo);
    let target_hi = target.stop_hz.min(data_hi);
    if target_lo >= target_hi {
        bail!(
            "curve '{}' does not cover the target band [{:.6e}, {:.6e}]",
            curve.label(),
            target.start_hz,
            target.stop_hz
        );
    }
    let integral_tgt = band_integral(curve, Band::new(target_lo, target_hi)?)?;
    let db_current = to_avg_rl_db(integral_tgt, Band::new(target_lo, target_hi)?.angular_width());

    // spreading the whole budget uniformly over the requested target
    // band, whether or not data covers all of it
    let db_achievable = to_avg_rl_db(integral_int, target.angular_width());

    Ok(BodeFanoResult {
        db_available,
        db_current,
        db_achievable,
        actual_integration_band: (clip_lo, clip_hi),
    })
}

/// Trapezoidal `∫ ln(1/|Γ|) dω` over a band, with interpolated
/// boundary samples.
fn band_integral(curve: &Curve, band: Band) -> Result<f64> {
    let f = curve.frequency().f();
    let ln_inv: Vec<f64> = curve
        .values()
        .iter()
        .map(|v| (1.0 / v.norm().max(DB_FLOOR_MAG)).ln())
        .collect();

    let mut xs = vec![band.start_hz];
    xs.extend(
        f.iter()
            .copied()
            .filter(|&x| x > band.start_hz && x < band.stop_hz),
    );
    xs.push(band.stop_hz);

    let mut integral = 0.0;
    for pair in xs.windows(2) {
        let y0 = interp_linear(f, &ln_inv, pair[0]);
        let y1 = interp_linear(f, &ln_inv, pair[1]);
        integral += 0.5 * (y0 + y1) * (pair[1] - pair[0]);
    }
    Ok(integral * 2.0 * PI)
}

/// Average `ln(1/|Γ|)` over an angular band expressed as dB of RL.
fn to_avg_rl_db(integral: f64, angular_width: f64) -> f64 {
    (20.0 / std::f64::consts::LN_10) * integral / angular_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    /// |Γ| = 0.1 (20 dB RL) inside 2..4 GHz, ~1 outside.
    fn notch_reflection() -> Curve {
        let f: Vec<f64> = (1..=60).map(|i| i as f64 * 1e8).collect();
        let v: Vec<Complex64> = f
            .iter()
            .map(|&x| {
                let mag = if (2e9..=4e9).contains(&x) { 0.1 } else { 0.9999999 };
                Complex64::new(mag, 0.0)
            })
            .collect();
        Curve::new(
            "gamma",
            Frequency::from_hz(f).unwrap(),
            v,
            Complex64::new(50.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_flat_reflection_figures() {
        // |Γ| = 0.1 across the whole integration band: the available
        // and current averages both read 20 dB
        let curve = notch_reflection();
        let band = Band::new(2e9, 4e9).unwrap();
        let r = bode_fano(&curve, band, band).unwrap();
        assert_relative_eq!(r.db_available, 20.0, epsilon = 0.2);
        assert_relative_eq!(r.db_current, 20.0, epsilon = 0.2);
        assert_relative_eq!(r.db_achievable, 20.0, epsilon = 0.2);
    }

    #[test]
    fn test_achievable_monotone_in_target_width() {
        let curve = notch_reflection();
        let integration = Band::new(2e9, 4e9).unwrap();

        let mut last = f64::INFINITY;
        for stop in [3e9, 4e9, 5e9, 6e9] {
            let r = bode_fano(&curve, integration, Band::new(2e9, stop).unwrap()).unwrap();
            assert!(
                r.db_achievable <= last + 1e-12,
                "achievable RL must not increase when the target band widens"
            );
            last = r.db_achievable;
        }
    }

    #[test]
    fn test_integration_band_clipped_to_data() {
        let curve = notch_reflection();
        let r = bode_fano(
            &curve,
            Band::new(0.0, 100e9).unwrap(),
            Band::new(2e9, 4e9).unwrap(),
        )
        .unwrap();
        assert_relative_eq!(r.actual_integration_band.0, 1e8, epsilon = 1.0);
        assert_relative_eq!(r.actual_integration_band.1, 6e9, epsilon = 1.0);
    }

    #[test]
    fn test_disjoint_band_fatal() {
        let curve = notch_reflection();
        assert!(bode_fano(
            &curve,
            Band::new(50e9, 60e9).unwrap(),
            Band::new(2e9, 4e9).unwrap()
        )
        .is_err());
        assert!(Band::new(4e9, 2e9).is_err());
    }
}
