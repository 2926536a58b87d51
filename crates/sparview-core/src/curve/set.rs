//! `CurveSet`: a broadcasting collection of curves
//!
//! Batch operations apply per element with two distinct error
//! policies: shape errors (mismatched broadcast sizes) are fatal, while
//! a single element's failure is caught, logged and dropped so the
//! batch as a whole still succeeds.

use anyhow::{bail, Result};
use num_complex::Complex64;
use tracing::warn;

use super::core::{Curve, CurveOp, PhaseOptions};
use crate::frequency::SweepType;
use crate::plot::{PlotData, PlotStyle};

/// An ordered list of curves acting as one vectorized value.
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    items: Vec<Curve>,
}

impl CurveSet {
    pub fn new(items: Vec<Curve>) -> Self {
        Self { items }
    }

    pub fn from_curve(curve: Curve) -> Self {
        Self { items: vec![curve] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn items(&self) -> &[Curve] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Curve> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Curve> {
        self.items.iter()
    }

    /// Apply a fallible transform per element.
    ///
    /// Failing elements are logged at `warn` with their label and
    /// dropped; the result may be shorter than the input, or empty.
    pub fn map_tolerant<F>(&self, op_name: &str, f: F) -> CurveSet
    where
        F: Fn(&Curve) -> Result<Curve>,
    {
        let items = self
            .items
            .iter()
            .filter_map(|c| match f(c) {
                Ok(out) => Some(out),
                Err(err) => {
                    warn!(curve = c.label(), operation = op_name, %err, "dropping curve from batch");
                    None
                }
            })
            .collect();
        CurveSet { items }
    }

    /// Apply a fallible binary transform across two sets.
    ///
    /// Sets must be the same size, or either side of size 1
    /// (broadcast). Any other size combination is fatal; per-pair
    /// failures are tolerated as in [`CurveSet::map_tolerant`].
    pub fn zip_tolerant<F>(&self, other: &CurveSet, op_name: &str, f: F) -> Result<CurveSet>
    where
        F: Fn(&Curve, &Curve) -> Result<Curve>,
    {
        let (la, lb) = (self.len(), other.len());
        if la != lb && la != 1 && lb != 1 {
            bail!(
                "cannot broadcast curve sets of size {} and {} in '{}'",
                la,
                lb,
                op_name
            );
        }
        let n = la.max(lb);
        let items = (0..n)
            .filter_map(|i| {
                let a = &self.items[if la == 1 { 0 } else { i }];
                let b = &other.items[if lb == 1 { 0 } else { i }];
                match f(a, b) {
                    Ok(out) => Some(out),
                    Err(err) => {
                        warn!(curve = a.label(), operation = op_name, %err, "dropping curve from batch");
                        None
                    }
                }
            })
            .collect();
        Ok(CurveSet { items })
    }

    // ----------------------------------------------------------------
    // Vectorized algebra
    // ----------------------------------------------------------------

    /// Elementwise binary operation between two sets (broadcasting).
    pub fn binary(&self, other: &CurveSet, op: CurveOp) -> Result<CurveSet> {
        self.zip_tolerant(other, op_symbol_name(op), |a, b| a.binary(b, op))
    }

    /// Elementwise binary operation against a scalar.
    pub fn binary_scalar(&self, scalar: Complex64, op: CurveOp, scalar_left: bool) -> CurveSet {
        CurveSet {
            items: self
                .items
                .iter()
                .map(|c| c.binary_scalar(scalar, op, scalar_left))
                .collect(),
        }
    }

    pub fn reciprocal(&self) -> CurveSet {
        CurveSet {
            items: self.items.iter().map(Curve::reciprocal).collect(),
        }
    }

    pub fn mag(&self) -> CurveSet {
        self.map_tolerant("mag", |c| Ok(c.mag()))
    }

    pub fn db(&self) -> CurveSet {
        self.map_tolerant("db", |c| Ok(c.db()))
    }

    pub fn phase(&self, opts: PhaseOptions) -> CurveSet {
        self.map_tolerant("phase", |c| Ok(c.phase(opts)))
    }

    pub fn vswr(&self) -> CurveSet {
        self.map_tolerant("vswr", |c| Ok(c.vswr()))
    }

    pub fn mismatch_loss(&self) -> CurveSet {
        self.map_tolerant("mismatch_loss", |c| Ok(c.mismatch_loss()))
    }

    pub fn crop(&self, lo: f64, hi: f64) -> CurveSet {
        self.map_tolerant("crop", |c| c.crop(lo, hi))
    }

    pub fn resampled(&self, start: f64, stop: f64, npoints: usize, sweep: SweepType) -> CurveSet {
        self.map_tolerant("resample", |c| c.resampled(start, stop, npoints, sweep))
    }

    pub fn renamed(&self, label: &str) -> CurveSet {
        self.map_tolerant("rename", |c| Ok(c.renamed(label)))
    }

    pub fn with_prefix(&self, prefix: &str) -> CurveSet {
        self.map_tolerant("prefix", |c| Ok(c.with_prefix(prefix)))
    }

    pub fn with_suffix(&self, suffix: &str) -> CurveSet {
        self.map_tolerant("suffix", |c| Ok(c.with_suffix(suffix)))
    }

    pub fn pattern_renamed(&self, pattern: &str, replacement: &str) -> CurveSet {
        self.map_tolerant("replace", |c| c.pattern_renamed(pattern, replacement))
    }

    /// User-supplied elementwise mapping applied to every member.
    pub fn map_values<F>(&self, f: F) -> CurveSet
    where
        F: Fn(f64, Complex64) -> Complex64,
    {
        CurveSet {
            items: self.items.iter().map(|c| c.map(&f)).collect(),
        }
    }

    /// Forward every curve to the rendering sink.
    pub fn plot(&self, sink: &mut dyn FnMut(PlotData), style: &PlotStyle) {
        for c in &self.items {
            c.plot(sink, style.clone());
        }
    }
}

impl From<Vec<Curve>> for CurveSet {
    fn from(items: Vec<Curve>) -> Self {
        Self { items }
    }
}

fn op_symbol_name(op: CurveOp) -> &'static str {
    match op {
        CurveOp::Add => "add",
        CurveOp::Sub => "subtract",
        CurveOp::Mul => "multiply",
        CurveOp::Div => "divide",
        CurveOp::Pow => "power",
    }
}
