//! Parametric Component Tests
//!
//! Deferred realization through reconciliation/cascading contexts,
//! the four mutually exclusive line parameter sets and the element
//! closed forms.

use approx::assert_relative_eq;
use ndarray::{Array1, Array3};
use num_complex::Complex64;
use sparview_core::components::{Component, ComponentSpec, LineSpec, PhaseLine, PhysicalLine};
use sparview_core::frequency::{Frequency, FrequencyUnit, SweepType};
use sparview_core::{Network, NetworkSet};

const Z0: Complex64 = Complex64::new(50.0, 0.0);

fn thru(name: &str, npoints: usize) -> Network {
    let freq = Frequency::new(1.0, 10.0, npoints, FrequencyUnit::GHz, SweepType::Linear);
    let mut s = Array3::<Complex64>::zeros((npoints, 2, 2));
    for f in 0..npoints {
        s[[f, 0, 1]] = Complex64::new(1.0, 0.0);
        s[[f, 1, 0]] = Complex64::new(1.0, 0.0);
    }
    let z0 = Array1::from_elem(2, Z0);
    Network::new(name, freq, s, z0).unwrap()
}

#[test]
fn component_realizes_on_the_partner_grid() {
    // the same unrealized component cascades against members with
    // different grids, realizing freshly for each
    let set = NetworkSet::new(vec![thru("short", 5), thru("long", 23)]);
    let delay = Component::new(ComponentSpec::Line(LineSpec {
        delay: Some(0.05e-9),
        ..Default::default()
    }));

    let out = set.cascade_component(&delay, false);
    assert_eq!(out.len(), 2);
    assert_eq!(out.items()[0].nfreq(), 5);
    assert_eq!(out.items()[1].nfreq(), 23);

    // cascading a matched delay line keeps |S21| = 1
    for n in out.iter() {
        for f in 0..n.nfreq() {
            assert_relative_eq!(n.s[[f, 1, 0]].norm(), 1.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn group_delay_line_realization() {
    let tau = 0.5e-9;
    let spec = ComponentSpec::Line(LineSpec {
        delay: Some(tau),
        ..Default::default()
    });
    let freq = Frequency::from_hz(vec![1e9, 2e9, 3e9]).unwrap();
    let n = spec.realize(&freq, Z0).unwrap();

    for (fi, &f) in freq.f().iter().enumerate() {
        let expected = Complex64::from_polar(1.0, -2.0 * std::f64::consts::PI * f * tau);
        assert!((n.s[[fi, 1, 0]] - expected).norm() < 1e-12);
    }
}

#[test]
fn phase_line_scales_linearly_with_frequency() {
    let spec = ComponentSpec::Line(LineSpec {
        phase: Some(PhaseLine {
            degrees: 45.0,
            f_ref_hz: 2e9,
        }),
        ..Default::default()
    });
    let freq = Frequency::from_hz(vec![1e9, 2e9, 4e9]).unwrap();
    let n = spec.realize(&freq, Z0).unwrap();

    // 22.5° at 1 GHz, 45° at 2 GHz, 90° at 4 GHz
    assert_relative_eq!(n.s[[0, 1, 0]].arg().to_degrees(), -22.5, epsilon = 1e-9);
    assert_relative_eq!(n.s[[1, 1, 0]].arg().to_degrees(), -45.0, epsilon = 1e-9);
    assert_relative_eq!(n.s[[2, 1, 0]].arg().to_degrees(), -90.0, epsilon = 1e-9);
}

#[test]
fn lossy_physical_line_attenuates_with_sqrt_frequency() {
    let spec = ComponentSpec::Line(LineSpec {
        physical: Some(PhysicalLine {
            len_m: 0.2,
            eps_r: 4.0,
            db_per_m: 10.0,
            f_ref_hz: 1e9,
        }),
        ..Default::default()
    });
    let freq = Frequency::from_hz(vec![1e9, 4e9]).unwrap();
    let n = spec.realize(&freq, Z0).unwrap();

    // 2 dB at the reference, 4 dB at four times the frequency
    let db_1 = 20.0 * n.s[[0, 1, 0]].norm().log10();
    let db_4 = 20.0 * n.s[[1, 1, 0]].norm().log10();
    assert_relative_eq!(db_1, -2.0, epsilon = 1e-6);
    assert_relative_eq!(db_4, -4.0, epsilon = 1e-6);
}

#[test]
fn line_parameter_sets_are_mutually_exclusive() {
    let over = ComponentSpec::Line(LineSpec {
        delay: Some(1e-9),
        phase: Some(PhaseLine {
            degrees: 90.0,
            f_ref_hz: 1e9,
        }),
        ..Default::default()
    });
    let freq = Frequency::from_hz(vec![1e9]).unwrap();
    let err = over.realize(&freq, Z0).unwrap_err().to_string();
    assert!(err.contains("exactly one"), "got: {}", err);

    let under = ComponentSpec::Line(LineSpec::default());
    let err = under.realize(&freq, Z0).unwrap_err().to_string();
    assert!(err.contains("no parameter set"), "got: {}", err);
}

#[test]
fn realization_errors_are_deferred_to_first_use() {
    // construction is inert even for nonsense parameters
    let bad = Component::new(ComponentSpec::Capacitor { farads: -1e-12 });
    let freq = Frequency::from_hz(vec![1e9]).unwrap();
    assert!(bad.realize(&freq, Z0).is_err());

    // and a bad component inside a batch drops only its own result
    let set = NetworkSet::new(vec![thru("a", 4), thru("b", 4)]);
    let out = set.cascade_component(&bad, false);
    assert_eq!(out.len(), 0);
}

#[test]
fn isolator_blocks_reverse() {
    let spec = ComponentSpec::Isolator;
    let freq = Frequency::from_hz(vec![1e9, 2e9]).unwrap();
    let n = spec.realize(&freq, Z0).unwrap();
    assert_relative_eq!(n.s[[0, 1, 0]].re, 1.0);
    assert_relative_eq!(n.s[[0, 0, 1]].norm(), 0.0);
}

#[test]
fn phase_shifter_is_frequency_flat() {
    let spec = ComponentSpec::PhaseShifter { degrees: 30.0 };
    let freq = Frequency::from_hz(vec![1e9, 9e9]).unwrap();
    let n = spec.realize(&freq, Z0).unwrap();
    assert_relative_eq!(n.s[[0, 1, 0]].arg().to_degrees(), -30.0, epsilon = 1e-9);
    assert_relative_eq!(n.s[[1, 1, 0]].arg().to_degrees(), -30.0, epsilon = 1e-9);
}
