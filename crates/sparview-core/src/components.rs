//! Parametric circuit elements
//!
//! Each component stores physical parameters only. Its S-matrix is
//! computed by `realize`, which is deferred until the component first
//! participates in reconciliation or cascading — the frequency grid and
//! system reference impedance come from that context. Parameter
//! validation also happens at realization, not at construction.

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use thiserror::Error;
use tracing::debug;

use crate::frequency::Frequency;
use crate::network::Network;

/// Speed of light in vacuum, m/s
const C0: f64 = 299_792_458.0;

/// dB per neper
const DB_PER_NEPER: f64 = 8.685889638065035;

/// Realization errors, fatal at the first `realize` attempt.
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("transmission line: no parameter set given (need rlgc, physical, phase or delay)")]
    LineUnderspecified,

    #[error("transmission line: {0} parameter sets given, exactly one allowed")]
    LineOverspecified(usize),

    #[error("{component}: {parameter} must be positive (got {value})")]
    NonPositive {
        component: &'static str,
        parameter: &'static str,
        value: f64,
    },

    #[error("element network construction failed: {0}")]
    Construction(String),
}

/// Whether a lumped element sits in the signal path or to ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    Series,
    Shunt,
}

/// Per-unit-length line constants (Ω/m, H/m, S/m, F/m) plus length.
#[derive(Debug, Clone, Copy)]
pub struct RlgcLine {
    pub r: f64,
    pub l: f64,
    pub g: f64,
    pub c: f64,
    pub len_m: f64,
}

/// Physical line: length, effective dielectric constant, optional loss.
#[derive(Debug, Clone, Copy)]
pub struct PhysicalLine {
    pub len_m: f64,
    pub eps_r: f64,
    /// Attenuation in dB/m at `f_ref_hz`, scaled with sqrt(f/f_ref)
    pub db_per_m: f64,
    pub f_ref_hz: f64,
}

/// Line defined by its phase shift at a reference frequency.
#[derive(Debug, Clone, Copy)]
pub struct PhaseLine {
    pub degrees: f64,
    pub f_ref_hz: f64,
}

/// Transmission line parameters.
///
/// Exactly one of the four parameter sets must be supplied; anything
/// else fails at realization.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSpec {
    pub rlgc: Option<RlgcLine>,
    pub physical: Option<PhysicalLine>,
    pub phase: Option<PhaseLine>,
    /// Group delay in seconds
    pub delay: Option<f64>,
}

/// A parametric building block, inert until realized.
#[derive(Debug, Clone)]
pub enum ComponentSpec {
    /// Series resistance in Ω
    Resistor { ohms: f64 },
    /// Series inductance in H
    Inductor { henries: f64 },
    /// Series capacitance in F
    Capacitor { farads: f64 },
    /// Transmission line
    Line(LineSpec),
    /// Frequency-independent phase shift in degrees
    PhaseShifter { degrees: f64 },
    /// Ideal pass-through
    Thru,
    /// Ideal isolator (forward transmission only)
    Isolator,
    /// 1-port termination of arbitrary impedance
    Termination { z: Complex64 },
}

impl ComponentSpec {
    /// Display name for labels and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ComponentSpec::Resistor { .. } => "resistor",
            ComponentSpec::Inductor { .. } => "inductor",
            ComponentSpec::Capacitor { .. } => "capacitor",
            ComponentSpec::Line(_) => "line",
            ComponentSpec::PhaseShifter { .. } => "shifter",
            ComponentSpec::Thru => "thru",
            ComponentSpec::Isolator => "isolator",
            ComponentSpec::Termination { .. } => "termination",
        }
    }

    /// Series-path impedance of a lumped element at frequency `f` Hz.
    ///
    /// Only defined for the lumped kinds (resistor, inductor,
    /// capacitor, termination).
    pub fn impedance(&self, f: f64) -> Option<Complex64> {
        let two_pi_f = 2.0 * std::f64::consts::PI * f;
        match *self {
            ComponentSpec::Resistor { ohms } => Some(Complex64::new(ohms, 0.0)),
            ComponentSpec::Inductor { henries } => Some(Complex64::new(0.0, two_pi_f * henries)),
            ComponentSpec::Capacitor { farads } => {
                if two_pi_f * farads == 0.0 {
                    // DC: an ideal capacitor is open
                    Some(Complex64::new(f64::INFINITY, 0.0))
                } else {
                    Some(Complex64::new(0.0, -1.0 / (two_pi_f * farads)))
                }
            }
            ComponentSpec::Termination { z } => Some(z),
            _ => None,
        }
    }

    /// Compute the component's S-matrix on the supplied grid.
    ///
    /// `z0` is the system reference impedance provided by the
    /// realization context.
    pub fn realize(&self, freq: &Frequency, z0: Complex64) -> Result<Network, ComponentError> {
        debug!(kind = self.kind_name(), npoints = freq.npoints(), "realizing component");
        self.validate()?;

        match self {
            ComponentSpec::Termination { z } => one_port(self.kind_name(), freq, z0, |_| {
                (*z - z0) / (*z + z0)
            }),
            ComponentSpec::Resistor { .. }
            | ComponentSpec::Inductor { .. }
            | ComponentSpec::Capacitor { .. } => {
                lumped_2port(self.kind_name(), freq, z0, Topology::Series, |f| {
                    self.impedance(f).expect("lumped element has an impedance")
                })
            }
            ComponentSpec::PhaseShifter { degrees } => {
                let theta = degrees.to_radians();
                transmission_2port(self.kind_name(), freq, z0, |_| {
                    Complex64::from_polar(1.0, -theta)
                })
            }
            ComponentSpec::Thru => {
                transmission_2port(self.kind_name(), freq, z0, |_| Complex64::new(1.0, 0.0))
            }
            ComponentSpec::Isolator => {
                let mut ntwk =
                    transmission_2port(self.kind_name(), freq, z0, |_| Complex64::new(1.0, 0.0))?;
                for f in 0..ntwk.nfreq() {
                    ntwk.s[[f, 0, 1]] = Complex64::new(0.0, 0.0);
                }
                Ok(ntwk)
            }
            ComponentSpec::Line(spec) => realize_line(spec, freq, z0),
        }
    }

    /// Parameter validation, run at realization time.
    fn validate(&self) -> Result<(), ComponentError> {
        let check = |component, parameter, value: f64| {
            if value <= 0.0 {
                Err(ComponentError::NonPositive {
                    component,
                    parameter,
                    value,
                })
            } else {
                Ok(())
            }
        };
        match self {
            ComponentSpec::Resistor { ohms } => check("resistor", "resistance", *ohms),
            ComponentSpec::Inductor { henries } => check("inductor", "inductance", *henries),
            ComponentSpec::Capacitor { farads } => check("capacitor", "capacitance", *farads),
            ComponentSpec::Line(spec) => {
                let given = [
                    spec.rlgc.is_some(),
                    spec.physical.is_some(),
                    spec.phase.is_some(),
                    spec.delay.is_some(),
                ]
                .iter()
                .filter(|x| **x)
                .count();
                match given {
                    0 => Err(ComponentError::LineUnderspecified),
                    1 => Ok(()),
                    n => Err(ComponentError::LineOverspecified(n)),
                }
            }
            _ => Ok(()),
        }
    }
}

/// A parametric component in its explicit two-state lifecycle.
///
/// `Unrealized` holds parameters only; `Realized` behaves as an
/// ordinary network. Calling [`Component::realize`] on an already
/// realized component re-interpolates it when the grid changed.
#[derive(Debug, Clone)]
pub enum Component {
    Unrealized { spec: ComponentSpec },
    Realized { network: Network },
}

impl Component {
    pub fn new(spec: ComponentSpec) -> Self {
        Component::Unrealized { spec }
    }

    /// Transition to (or refresh) the realized state for a context.
    pub fn realize(&self, freq: &Frequency, z0: Complex64) -> anyhow::Result<Network> {
        match self {
            Component::Unrealized { spec } => Ok(spec.realize(freq, z0)?),
            Component::Realized { network } => {
                if network.frequency.same_grid(freq) {
                    Ok(network.clone())
                } else {
                    network.resampled_onto(freq.f())
                }
            }
        }
    }
}

/// Closed-form 2-port of a lumped element at system impedance `z0`.
///
/// Series element of impedance z: `S11 = z/(z+2z0)`, `S21 = 2z0/(z+2z0)`.
/// Shunt uses the dual admittance form.
pub fn lumped_2port(
    name: &str,
    freq: &Frequency,
    z0: Complex64,
    topology: Topology,
    zfun: impl Fn(f64) -> Complex64,
) -> Result<Network, ComponentError> {
    let n = freq.npoints();
    let mut s = Array3::<Complex64>::zeros((n, 2, 2));
    let two = Complex64::new(2.0, 0.0);

    for (fi, &f) in freq.f().iter().enumerate() {
        let z = zfun(f);
        let (refl, thru) = match topology {
            Topology::Series => {
                if z.re.is_infinite() {
                    // open series path
                    (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0))
                } else {
                    let den = z + two * z0;
                    (z / den, two * z0 / den)
                }
            }
            Topology::Shunt => {
                if z.re.is_infinite() {
                    // open shunt branch: transparent
                    (Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0))
                } else {
                    let y = Complex64::new(1.0, 0.0) / z;
                    let y0 = Complex64::new(1.0, 0.0) / z0;
                    let den = y + two * y0;
                    (-y / den, two * y0 / den)
                }
            }
        };
        s[[fi, 0, 0]] = refl;
        s[[fi, 1, 1]] = refl;
        s[[fi, 0, 1]] = thru;
        s[[fi, 1, 0]] = thru;
    }

    finish_2port(name, freq, z0, s)
}

/// Matched 2-port with a given transmission coefficient.
fn transmission_2port(
    name: &str,
    freq: &Frequency,
    z0: Complex64,
    s21: impl Fn(f64) -> Complex64,
) -> Result<Network, ComponentError> {
    let n = freq.npoints();
    let mut s = Array3::<Complex64>::zeros((n, 2, 2));
    for (fi, &f) in freq.f().iter().enumerate() {
        let t = s21(f);
        s[[fi, 0, 1]] = t;
        s[[fi, 1, 0]] = t;
    }
    finish_2port(name, freq, z0, s)
}

fn one_port(
    name: &str,
    freq: &Frequency,
    z0: Complex64,
    gamma: impl Fn(f64) -> Complex64,
) -> Result<Network, ComponentError> {
    let n = freq.npoints();
    let mut s = Array3::<Complex64>::zeros((n, 1, 1));
    for (fi, &f) in freq.f().iter().enumerate() {
        s[[fi, 0, 0]] = gamma(f);
    }
    Network::new(name, freq.clone(), s, Array1::from_elem(1, z0))
        .map_err(|e| ComponentError::Construction(e.to_string()))
}

fn finish_2port(
    name: &str,
    freq: &Frequency,
    z0: Complex64,
    s: Array3<Complex64>,
) -> Result<Network, ComponentError> {
    Network::new(name, freq.clone(), s, Array1::from_elem(2, z0))
        .map_err(|e| ComponentError::Construction(e.to_string()))
}

fn realize_line(
    spec: &LineSpec,
    freq: &Frequency,
    z0: Complex64,
) -> Result<Network, ComponentError> {
    if let Some(rlgc) = spec.rlgc {
        return realize_rlgc_line(&rlgc, freq, z0);
    }

    if let Some(phys) = spec.physical {
        // β from the effective dielectric constant, α from the dB/m
        // figure with sqrt(f) scaling
        return transmission_2port("line", freq, z0, |f| {
            let beta_l = 2.0 * std::f64::consts::PI * f * phys.eps_r.sqrt() / C0 * phys.len_m;
            let alpha_l = if phys.db_per_m > 0.0 && phys.f_ref_hz > 0.0 {
                phys.db_per_m * phys.len_m / DB_PER_NEPER * (f / phys.f_ref_hz).max(0.0).sqrt()
            } else {
                0.0
            };
            Complex64::from_polar((-alpha_l).exp(), -beta_l)
        });
    }

    if let Some(phase) = spec.phase {
        let theta_ref = phase.degrees.to_radians();
        let f_ref = phase.f_ref_hz;
        return transmission_2port("line", freq, z0, move |f| {
            Complex64::from_polar(1.0, -theta_ref * f / f_ref)
        });
    }

    let tau = spec.delay.expect("validated: exactly one parameter set");
    transmission_2port("line", freq, z0, move |f| {
        Complex64::from_polar(1.0, -2.0 * std::f64::consts::PI * f * tau)
    })
}

/// Lossy line from RLGC constants via the hyperbolic line equations.
///
/// `γ = sqrt((R+jωL)(G+jωC))`, `Zc = sqrt((R+jωL)/(G+jωC))`, then
/// `S11 = (Zc²−z0²)sinh(γl)/D`, `S21 = 2·Zc·z0/D` with
/// `D = 2·Zc·z0·cosh(γl) + (Zc²+z0²)sinh(γl)`.
fn realize_rlgc_line(
    line: &RlgcLine,
    freq: &Frequency,
    z0: Complex64,
) -> Result<Network, ComponentError> {
    let n = freq.npoints();
    let mut s = Array3::<Complex64>::zeros((n, 2, 2));
    let two = Complex64::new(2.0, 0.0);

    for (fi, &f) in freq.f().iter().enumerate() {
        let jw = Complex64::new(0.0, 2.0 * std::f64::consts::PI * f);
        let zs = Complex64::new(line.r, 0.0) + jw * line.l;
        let yp = Complex64::new(line.g, 0.0) + jw * line.c;

        let gamma_l = (zs * yp).sqrt() * line.len_m;
        let zc = if yp.norm() < crate::constants::NEAR_ZERO {
            z0
        } else {
            (zs / yp).sqrt()
        };

        let ch = gamma_l.cosh();
        let sh = gamma_l.sinh();
        let d = two * zc * z0 * ch + (zc * zc + z0 * z0) * sh;

        s[[fi, 0, 0]] = (zc * zc - z0 * z0) * sh / d;
        s[[fi, 1, 1]] = s[[fi, 0, 0]];
        s[[fi, 0, 1]] = two * zc * z0 / d;
        s[[fi, 1, 0]] = s[[fi, 0, 1]];
    }

    finish_2port("line", freq, z0, s)
}
