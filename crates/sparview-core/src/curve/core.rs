//! The `Curve` value type and its elementwise algebra

use anyhow::{bail, Context, Result};
use num_complex::Complex64;
use regex::Regex;

use crate::constants::NEAR_ZERO;
use crate::frequency::{linspace, Frequency, SweepType};
use crate::math::{db20, unwrap_radians};
use crate::plot::{PlotData, PlotStyle};
use crate::reconcile::reconcile;

/// Elementwise binary operation between curves or against a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl CurveOp {
    fn apply(self, a: Complex64, b: Complex64) -> Complex64 {
        match self {
            CurveOp::Add => a + b,
            CurveOp::Sub => a - b,
            CurveOp::Mul => a * b,
            CurveOp::Div => a / b,
            CurveOp::Pow => a.powc(b),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CurveOp::Add => "+",
            CurveOp::Sub => "-",
            CurveOp::Mul => "*",
            CurveOp::Div => "/",
            CurveOp::Pow => "**",
        }
    }
}

/// Options for the phase transform
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseOptions {
    /// Remove 360° jumps
    pub unwrap: bool,
    /// Subtract the least-squares linear trend (implies unwrapping)
    pub detrend: bool,
}

/// One labeled complex curve over frequency.
///
/// Immutable value object: every transform produces a new `Curve`.
#[derive(Debug, Clone)]
pub struct Curve {
    label: String,
    frequency: Frequency,
    value: Vec<Complex64>,
    z0: Complex64,
    provenance: Option<String>,
}

impl Curve {
    /// Create a curve, enforcing `len(frequency) == len(value) >= 1`.
    pub fn new(
        label: impl Into<String>,
        frequency: Frequency,
        value: Vec<Complex64>,
        z0: Complex64,
    ) -> Result<Self> {
        let label = label.into();
        if value.len() != frequency.npoints() {
            bail!(
                "curve '{}': {} values for {} frequency points",
                label,
                value.len(),
                frequency.npoints()
            );
        }
        Ok(Self {
            label,
            frequency,
            value,
            z0,
            provenance: None,
        })
    }

    /// Attach a provenance tag (typically the source network name).
    pub fn with_provenance(mut self, tag: impl Into<String>) -> Self {
        self.provenance = Some(tag.into());
        self
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    #[inline]
    pub fn values(&self) -> &[Complex64] {
        &self.value
    }

    #[inline]
    pub fn z0(&self) -> Complex64 {
        self.z0
    }

    #[inline]
    pub fn provenance(&self) -> Option<&str> {
        self.provenance.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Replacement values on the same grid, same metadata.
    fn with_values(&self, label: String, value: Vec<Complex64>) -> Curve {
        Curve {
            label,
            frequency: self.frequency.clone(),
            value,
            z0: self.z0,
            provenance: self.provenance.clone(),
        }
    }

    // ----------------------------------------------------------------
    // Elementwise algebra
    // ----------------------------------------------------------------

    /// Elementwise binary operation against another curve.
    ///
    /// Grids are reconciled first (identity when already equal); a
    /// disjoint overlap is fatal.
    pub fn binary(&self, other: &Curve, op: CurveOp) -> Result<Curve> {
        let (a, b) = reconcile(self, other)
            .with_context(|| format!("{} {} {}", self.label, op.symbol(), other.label))?;
        let value = a
            .value
            .iter()
            .zip(b.value.iter())
            .map(|(&x, &y)| op.apply(x, y))
            .collect();
        Ok(a.with_values(
            format!("{} {} {}", self.label, op.symbol(), other.label),
            value,
        ))
    }

    /// Elementwise binary operation against a scalar (no reconciliation).
    ///
    /// `scalar_left` selects `scalar op curve` instead of `curve op scalar`.
    pub fn binary_scalar(&self, scalar: Complex64, op: CurveOp, scalar_left: bool) -> Curve {
        let scalar_text = if scalar.im == 0.0 {
            format!("{}", scalar.re)
        } else {
            format!("{}", scalar)
        };
        let label = if scalar_left {
            format!("{} {} {}", scalar_text, op.symbol(), self.label)
        } else {
            format!("{} {} {}", self.label, op.symbol(), scalar_text)
        };
        let value = self
            .value
            .iter()
            .map(|&v| {
                if scalar_left {
                    op.apply(scalar, v)
                } else {
                    op.apply(v, scalar)
                }
            })
            .collect();
        self.with_values(label, value)
    }

    /// Elementwise reciprocal `1/x`.
    pub fn reciprocal(&self) -> Curve {
        let value = self
            .value
            .iter()
            .map(|&v| Complex64::new(1.0, 0.0) / v)
            .collect();
        self.with_values(format!("1/{}", self.label), value)
    }

    /// User-supplied elementwise mapping over `(frequency, value)` pairs.
    pub fn map<F>(&self, f: F) -> Curve
    where
        F: Fn(f64, Complex64) -> Complex64,
    {
        let value = self
            .frequency
            .f()
            .iter()
            .zip(self.value.iter())
            .map(|(&x, &v)| f(x, v))
            .collect();
        self.with_values(self.label.clone(), value)
    }

    // ----------------------------------------------------------------
    // Derived transforms
    // ----------------------------------------------------------------

    /// Magnitude (linear).
    pub fn mag(&self) -> Curve {
        let value = self
            .value
            .iter()
            .map(|v| Complex64::new(v.norm(), 0.0))
            .collect();
        self.with_values(format!("|{}|", self.label), value)
    }

    /// Magnitude in dB, floored at -300 dB.
    pub fn db(&self) -> Curve {
        let value = self
            .value
            .iter()
            .map(|&v| Complex64::new(db20(v), 0.0))
            .collect();
        self.with_values(format!("{} [dB]", self.label), value)
    }

    /// Phase in radians, optionally unwrapped and linear-trend-removed.
    pub fn phase(&self, opts: PhaseOptions) -> Curve {
        let mut phase: Vec<f64> = self.value.iter().map(|v| v.arg()).collect();
        if opts.unwrap || opts.detrend {
            unwrap_radians(&mut phase);
        }
        if opts.detrend {
            let f = self.frequency.f();
            let (slope, intercept) = linear_fit(f, &phase);
            for (p, &x) in phase.iter_mut().zip(f.iter()) {
                *p -= slope * x + intercept;
            }
        }
        let value = phase.into_iter().map(|p| Complex64::new(p, 0.0)).collect();
        self.with_values(format!("arg({})", self.label), value)
    }

    /// Voltage standing wave ratio `(1+|Γ|)/(1-|Γ|)`.
    ///
    /// Infinite where the magnitude reaches 1.
    pub fn vswr(&self) -> Curve {
        let value = self
            .value
            .iter()
            .map(|v| {
                let mag = v.norm();
                let vswr = if mag >= 1.0 {
                    f64::INFINITY
                } else {
                    (1.0 + mag) / (1.0 - mag)
                };
                Complex64::new(vswr, 0.0)
            })
            .collect();
        self.with_values(format!("VSWR({})", self.label), value)
    }

    /// Mismatch loss as the linear power fraction `1 - |Γ|²`.
    pub fn mismatch_loss(&self) -> Curve {
        let value = self
            .value
            .iter()
            .map(|v| Complex64::new(1.0 - v.norm_sqr(), 0.0))
            .collect();
        self.with_values(format!("ML({})", self.label), value)
    }

    /// Crop to the inclusive frequency range `[lo, hi]` in Hz.
    ///
    /// An empty result is fatal.
    pub fn crop(&self, lo: f64, hi: f64) -> Result<Curve> {
        let keep: Vec<usize> = self
            .frequency
            .f()
            .iter()
            .enumerate()
            .filter(|(_, &x)| x >= lo && x <= hi)
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            bail!(
                "curve '{}': no samples inside [{:.6e}, {:.6e}] Hz",
                self.label,
                lo,
                hi
            );
        }
        let f_new: Vec<f64> = keep.iter().map(|&i| self.frequency.f()[i]).collect();
        let value: Vec<Complex64> = keep.iter().map(|&i| self.value[i]).collect();
        let mut out = Curve::new(
            self.label.clone(),
            Frequency::from_hz(f_new)?,
            value,
            self.z0,
        )?;
        out.provenance = self.provenance.clone();
        Ok(out)
    }

    /// Resample onto an explicit grid in Hz.
    ///
    /// Interpolation decomposes into linearly interpolated magnitude and
    /// unwrapped (and left unwrapped) phase, then recomposes. The grid
    /// must be non-empty and strictly increasing.
    pub fn resampled_onto(&self, grid: &[f64]) -> Result<Curve> {
        let frequency = Frequency::from_hz(grid.to_vec())
            .with_context(|| format!("resampling curve '{}'", self.label))?;

        let f = self.frequency.f();
        let mags: Vec<f64> = self.value.iter().map(|v| v.norm()).collect();
        let mut phases: Vec<f64> = self.value.iter().map(|v| v.arg()).collect();
        unwrap_radians(&mut phases);

        let value = grid
            .iter()
            .map(|&x| {
                let m = crate::math::interp_linear(f, &mags, x);
                let p = crate::math::interp_linear(f, &phases, x);
                Complex64::from_polar(m, p)
            })
            .collect();

        let mut out = Curve::new(self.label.clone(), frequency, value, self.z0)?;
        out.provenance = self.provenance.clone();
        Ok(out)
    }

    /// Resample onto a generated linear or logarithmic grid.
    pub fn resampled(&self, start: f64, stop: f64, npoints: usize, sweep: SweepType) -> Result<Curve> {
        if npoints == 0 {
            bail!("curve '{}': resampling to zero points", self.label);
        }
        if stop < start {
            bail!(
                "curve '{}': resampling range is reversed ({} > {})",
                self.label,
                start,
                stop
            );
        }
        let grid = match sweep {
            SweepType::Linear => linspace(start, stop, npoints),
            SweepType::Log => {
                if start <= 0.0 {
                    bail!(
                        "curve '{}': logarithmic grid requires a positive start",
                        self.label
                    );
                }
                linspace(start.ln(), stop.ln(), npoints)
                    .into_iter()
                    .map(f64::exp)
                    .collect()
            }
        };
        self.resampled_onto(&grid)
    }

    // ----------------------------------------------------------------
    // Renaming
    // ----------------------------------------------------------------

    /// Replace the label.
    pub fn renamed(&self, label: impl Into<String>) -> Curve {
        let mut out = self.clone();
        out.label = label.into();
        out
    }

    /// Prepend to the label.
    pub fn with_prefix(&self, prefix: &str) -> Curve {
        self.renamed(format!("{}{}", prefix, self.label))
    }

    /// Append to the label.
    pub fn with_suffix(&self, suffix: &str) -> Curve {
        self.renamed(format!("{}{}", self.label, suffix))
    }

    /// Regex substitution on the label.
    pub fn pattern_renamed(&self, pattern: &str, replacement: &str) -> Result<Curve> {
        let re = Regex::new(pattern)
            .with_context(|| format!("curve '{}': bad rename pattern", self.label))?;
        Ok(self.renamed(re.replace_all(&self.label, replacement).into_owned()))
    }

    // ----------------------------------------------------------------
    // Plotting
    // ----------------------------------------------------------------

    /// Forward this curve to a rendering sink.
    ///
    /// The algebra layer holds no rendering knowledge; this hands the
    /// finished data to the injected callback.
    pub fn plot(&self, sink: &mut dyn FnMut(PlotData), style: PlotStyle) {
        sink(PlotData {
            x: self.frequency.f().to_vec(),
            y: self.value.clone(),
            z0: self.z0,
            label: self.label.clone(),
            style,
            provenance: self.provenance.clone(),
        });
    }
}

/// Least-squares line `y = slope*x + intercept`.
fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    if x.len() < 2 {
        return (0.0, y.first().copied().unwrap_or(0.0));
    }
    let sx: f64 = x.iter().sum();
    let sy: f64 = y.iter().sum();
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let denom = n * sxx - sx * sx;
    if denom.abs() < NEAR_ZERO {
        return (0.0, sy / n);
    }
    let slope = (n * sxy - sx * sy) / denom;
    (slope, (sy - slope * sx) / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyUnit;
    use approx::assert_relative_eq;

    fn curve(label: &str, f: &[f64], v: &[Complex64]) -> Curve {
        Curve::new(
            label,
            Frequency::from_hz(f.to_vec()).unwrap(),
            v.to_vec(),
            Complex64::new(50.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_len_mismatch_rejected() {
        let f = Frequency::new(1.0, 2.0, 2, FrequencyUnit::GHz, SweepType::Linear);
        assert!(Curve::new("x", f, vec![Complex64::new(1.0, 0.0)], Complex64::new(50.0, 0.0)).is_err());
    }

    #[test]
    fn test_add_same_grid() {
        let f = [1e9, 2e9, 3e9];
        let a = curve("a", &f, &[Complex64::new(1.0, 0.0); 3]);
        let b = curve("b", &f, &[Complex64::new(2.0, 1.0); 3]);
        let c = a.binary(&b, CurveOp::Add).unwrap();
        assert_eq!(c.label(), "a + b");
        assert_eq!(c.len(), 3);
        assert_relative_eq!(c.values()[0].re, 3.0);
        assert_relative_eq!(c.values()[0].im, 1.0);
    }

    #[test]
    fn test_scalar_broadcast() {
        let f = [1e9, 2e9];
        let a = curve("a", &f, &[Complex64::new(2.0, 0.0); 2]);
        let c = a.binary_scalar(Complex64::new(3.0, 0.0), CurveOp::Mul, false);
        assert_relative_eq!(c.values()[1].re, 6.0);
        let d = a.binary_scalar(Complex64::new(1.0, 0.0), CurveOp::Div, true);
        assert_relative_eq!(d.values()[0].re, 0.5);
    }

    #[test]
    fn test_db_floor() {
        let f = [1e9];
        let a = curve("a", &f, &[Complex64::new(0.0, 0.0)]);
        assert_relative_eq!(a.db().values()[0].re, -300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_phase_detrend_removes_delay() {
        // Pure delay has a linear phase; detrending should null it
        let f: Vec<f64> = (1..=50).map(|i| i as f64 * 1e8).collect();
        let tau = 0.5e-9;
        let v: Vec<Complex64> = f
            .iter()
            .map(|&x| Complex64::from_polar(1.0, -2.0 * std::f64::consts::PI * x * tau))
            .collect();
        let c = curve("delay", &f, &v);
        let detrended = c.phase(PhaseOptions {
            unwrap: true,
            detrend: true,
        });
        for v in detrended.values() {
            assert!(v.re.abs() < 1e-6, "residual phase {}", v.re);
        }
    }

    #[test]
    fn test_crop_inclusive_and_empty() {
        let f = [1e9, 2e9, 3e9, 4e9];
        let a = curve("a", &f, &[Complex64::new(1.0, 0.0); 4]);
        let c = a.crop(2e9, 3e9).unwrap();
        assert_eq!(c.len(), 2);
        assert!(a.crop(5e9, 6e9).is_err());
    }

    #[test]
    fn test_vswr_of_half() {
        let f = [1e9];
        let a = curve("a", &f, &[Complex64::new(0.5, 0.0)]);
        assert_relative_eq!(a.vswr().values()[0].re, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pattern_rename() {
        let f = [1e9];
        let a = curve("dut.S21", &f, &[Complex64::new(1.0, 0.0)]);
        let r = a.pattern_renamed(r"^dut\.", "fixture ").unwrap();
        assert_eq!(r.label(), "fixture S21");
    }
}
