//! Numerical analysis algorithms
//!
//! Frequency-to-time transform, the Bode-Fano gain-bandwidth bound and
//! Smith-chart circle geometry.

mod bode_fano;
mod circles;
mod time_domain;

pub use bode_fano::{bode_fano, Band, BodeFanoResult};
pub use circles::{
    circle_curve, circle_points, GainCircle, GainKind, NoiseCircle, StabilityCircle, StabilitySide,
};
pub use time_domain::{ResponseKind, TimeDomainOptions, Window, WindowKind};
