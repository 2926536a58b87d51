//! Cross-curve statistics
//!
//! Mean, median and sample standard deviation across the members of a
//! set. Members are first resampled onto one common linear grid
//! spanning the joint overlap, whose length is the rounded average of
//! the member lengths.

use anyhow::{bail, Result};
use num_complex::Complex64;

use super::core::Curve;
use super::set::CurveSet;
use crate::frequency::linspace;

impl CurveSet {
    /// Per-point arithmetic mean of all member curves.
    pub fn mean(&self) -> Result<Curve> {
        let members = self.on_common_grid()?;
        let n = members.len() as f64;
        let npoints = members[0].len();

        let value: Vec<Complex64> = (0..npoints)
            .map(|i| members.iter().map(|c| c.values()[i]).sum::<Complex64>() / n)
            .collect();

        Curve::new(
            format!("mean of {} curves", members.len()),
            members[0].frequency().clone(),
            value,
            members[0].z0(),
        )
    }

    /// Per-point median, taken on real and imaginary parts independently.
    pub fn median(&self) -> Result<Curve> {
        let members = self.on_common_grid()?;
        let npoints = members[0].len();

        let value: Vec<Complex64> = (0..npoints)
            .map(|i| {
                let re = median_of(members.iter().map(|c| c.values()[i].re).collect());
                let im = median_of(members.iter().map(|c| c.values()[i].im).collect());
                Complex64::new(re, im)
            })
            .collect();

        Curve::new(
            format!("median of {} curves", members.len()),
            members[0].frequency().clone(),
            value,
            members[0].z0(),
        )
    }

    /// Per-point sample standard deviation (n-1) of the complex values.
    ///
    /// The result is real-valued. Requires at least two members.
    pub fn std_dev(&self) -> Result<Curve> {
        let members = self.on_common_grid()?;
        if members.len() < 2 {
            bail!("standard deviation requires at least 2 curves");
        }
        let n = members.len() as f64;
        let npoints = members[0].len();

        let value: Vec<Complex64> = (0..npoints)
            .map(|i| {
                let mean = members.iter().map(|c| c.values()[i]).sum::<Complex64>() / n;
                let var = members
                    .iter()
                    .map(|c| (c.values()[i] - mean).norm_sqr())
                    .sum::<f64>()
                    / (n - 1.0);
                Complex64::new(var.sqrt(), 0.0)
            })
            .collect();

        Curve::new(
            format!("std dev of {} curves", members.len()),
            members[0].frequency().clone(),
            value,
            members[0].z0(),
        )
    }

    /// Resample all members onto one shared linear grid.
    ///
    /// The grid spans the joint overlap interval and its length is the
    /// rounded average of the member lengths.
    fn on_common_grid(&self) -> Result<Vec<Curve>> {
        if self.is_empty() {
            bail!("statistics over an empty curve set");
        }

        let lo = self
            .iter()
            .map(|c| c.frequency().start())
            .fold(f64::NEG_INFINITY, f64::max);
        let hi = self
            .iter()
            .map(|c| c.frequency().stop())
            .fold(f64::INFINITY, f64::min);
        if lo > hi {
            bail!("curves share no frequency overlap for statistics");
        }

        let avg_len =
            (self.iter().map(Curve::len).sum::<usize>() as f64 / self.len() as f64).round();
        let npoints = (avg_len as usize).max(1);

        let grid = if lo == hi {
            vec![lo]
        } else {
            linspace(lo, hi, npoints.max(2))
        };

        self.iter().map(|c| c.resampled_onto(&grid)).collect()
    }
}

fn median_of(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
