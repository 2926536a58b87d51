//! Frequency axis representation
//!
//! A `Frequency` holds the sample points of a sweep in Hz together with a
//! display unit and sweep type. Every frequency-indexed value in the engine
//! (curves, networks) carries one, and the grid reconciler operates on the
//! helpers defined here.

use anyhow::{bail, Result};

use crate::constants::{EQUIDISTANT_RTOL, GRID_MATCH_RTOL};

/// Frequency unit enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyUnit {
    Hz,
    KHz,
    MHz,
    #[default]
    GHz,
    THz,
}

impl FrequencyUnit {
    /// Multiplier to convert a value in this unit to Hz
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
            FrequencyUnit::GHz => 1e9,
            FrequencyUnit::THz => 1e12,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hz" => Some(FrequencyUnit::Hz),
            "khz" => Some(FrequencyUnit::KHz),
            "mhz" => Some(FrequencyUnit::MHz),
            "ghz" => Some(FrequencyUnit::GHz),
            "thz" => Some(FrequencyUnit::THz),
            _ => None,
        }
    }
}

/// Sweep spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    #[default]
    Linear,
    Log,
}

/// A frequency axis: strictly increasing sample points in Hz
#[derive(Debug, Clone)]
pub struct Frequency {
    /// Sample points in Hz, strictly increasing
    f: Vec<f64>,
    /// Display unit
    unit: FrequencyUnit,
    /// Sweep spacing the axis was generated with
    sweep_type: SweepType,
}

impl Frequency {
    /// Create a linearly or logarithmically swept axis.
    ///
    /// `start` and `stop` are in the given unit. A single-point axis is
    /// allowed (`npoints == 1` keeps only `start`).
    pub fn new(
        start: f64,
        stop: f64,
        npoints: usize,
        unit: FrequencyUnit,
        sweep_type: SweepType,
    ) -> Self {
        let mult = unit.multiplier();
        let start_hz = start * mult;
        let stop_hz = stop * mult;
        let npoints = npoints.max(1);

        let f = match sweep_type {
            SweepType::Linear => linspace(start_hz, stop_hz, npoints),
            SweepType::Log => {
                if npoints <= 1 {
                    vec![start_hz]
                } else {
                    linspace(start_hz.ln(), stop_hz.ln(), npoints)
                        .into_iter()
                        .map(f64::exp)
                        .collect()
                }
            }
        };

        Self {
            f,
            unit,
            sweep_type,
        }
    }

    /// Create from a vector of sample points already in Hz.
    ///
    /// The points must be non-empty and strictly increasing; anything else
    /// is a shape error.
    pub fn from_hz(f: Vec<f64>) -> Result<Self> {
        if f.is_empty() {
            bail!("frequency vector is empty");
        }
        for w in f.windows(2) {
            if w[1] <= w[0] {
                bail!(
                    "frequency vector is not strictly increasing ({} followed by {})",
                    w[0],
                    w[1]
                );
            }
        }
        Ok(Self {
            f,
            unit: FrequencyUnit::Hz,
            sweep_type: SweepType::Linear,
        })
    }

    /// Create from a vector of sample points in the given unit.
    pub fn from_scaled(f: Vec<f64>, unit: FrequencyUnit) -> Result<Self> {
        let mult = unit.multiplier();
        let mut out = Self::from_hz(f.into_iter().map(|x| x * mult).collect())?;
        out.unit = unit;
        Ok(out)
    }

    /// Sample points in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Sample points scaled to the display unit
    pub fn f_scaled(&self) -> Vec<f64> {
        let mult = self.unit.multiplier();
        self.f.iter().map(|&x| x / mult).collect()
    }

    /// Number of sample points
    #[inline]
    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    /// First sample in Hz
    #[inline]
    pub fn start(&self) -> f64 {
        self.f[0]
    }

    /// Last sample in Hz
    #[inline]
    pub fn stop(&self) -> f64 {
        *self.f.last().expect("frequency vector is never empty")
    }

    /// Span in Hz
    #[inline]
    pub fn span(&self) -> f64 {
        self.stop() - self.start()
    }

    /// Display unit
    #[inline]
    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Sweep spacing
    #[inline]
    pub fn sweep_type(&self) -> SweepType {
        self.sweep_type
    }

    /// Whether two axes hold the same sample points (same length,
    /// element-wise equal within a tight relative tolerance).
    pub fn same_grid(&self, other: &Frequency) -> bool {
        if self.f.len() != other.f.len() {
            return false;
        }
        self.f.iter().zip(other.f.iter()).all(|(&a, &b)| {
            let scale = a.abs().max(b.abs()).max(1.0);
            (a - b).abs() <= GRID_MATCH_RTOL * scale
        })
    }

    /// Overlap interval `[max(starts), min(stops)]` with another axis,
    /// or `None` if the ranges are disjoint.
    pub fn overlap(&self, other: &Frequency) -> Option<(f64, f64)> {
        let lo = self.start().max(other.start());
        let hi = self.stop().min(other.stop());
        (lo <= hi).then_some((lo, hi))
    }

    /// Sample points inside the inclusive interval `[lo, hi]`.
    pub fn restricted(&self, lo: f64, hi: f64) -> Vec<f64> {
        self.f
            .iter()
            .copied()
            .filter(|&x| x >= lo && x <= hi)
            .collect()
    }

    /// Whether the axis is (approximately) equidistant.
    ///
    /// A single- or two-point axis is always equidistant.
    pub fn is_equidistant(&self) -> bool {
        if self.f.len() < 3 {
            return true;
        }
        let mean_step = self.span() / (self.f.len() - 1) as f64;
        self.f
            .windows(2)
            .all(|w| ((w[1] - w[0]) - mean_step).abs() <= EQUIDISTANT_RTOL * mean_step)
    }

    /// Mean sample spacing in Hz
    pub fn step(&self) -> f64 {
        if self.f.len() < 2 {
            0.0
        } else {
            self.span() / (self.f.len() - 1) as f64
        }
    }
}

/// `npoints` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, npoints: usize) -> Vec<f64> {
    match npoints {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (npoints - 1) as f64;
            (0..npoints).map(|i| start + i as f64 * step).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_sweep() {
        let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
        assert_eq!(freq.npoints(), 10);
        assert_relative_eq!(freq.start(), 1e9, epsilon = 1.0);
        assert_relative_eq!(freq.stop(), 10e9, epsilon = 1.0);
        assert!(freq.is_equidistant());
    }

    #[test]
    fn test_log_sweep_constant_ratio() {
        let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Log);
        let f = freq.f();
        let ratios: Vec<f64> = f.windows(2).map(|w| w[1] / w[0]).collect();
        for r in &ratios[1..] {
            assert_relative_eq!(*r, ratios[0], epsilon = 1e-10);
        }
        assert!(!freq.is_equidistant());
    }

    #[test]
    fn test_from_hz_rejects_unsorted() {
        assert!(Frequency::from_hz(vec![1e9, 1e9, 2e9]).is_err());
        assert!(Frequency::from_hz(vec![2e9, 1e9]).is_err());
        assert!(Frequency::from_hz(vec![]).is_err());
        assert!(Frequency::from_hz(vec![1e9]).is_ok());
    }

    #[test]
    fn test_overlap() {
        let a = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
        let b = Frequency::new(5.0, 20.0, 16, FrequencyUnit::GHz, SweepType::Linear);
        let (lo, hi) = a.overlap(&b).unwrap();
        assert_relative_eq!(lo, 5e9, epsilon = 1.0);
        assert_relative_eq!(hi, 10e9, epsilon = 1.0);

        let c = Frequency::new(11.0, 12.0, 2, FrequencyUnit::GHz, SweepType::Linear);
        assert!(a.overlap(&c).is_none());
    }

    #[test]
    fn test_same_grid() {
        let a = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
        let b = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
        let c = Frequency::new(1.0, 10.0, 11, FrequencyUnit::GHz, SweepType::Linear);
        assert!(a.same_grid(&b));
        assert!(!a.same_grid(&c));
    }
}
