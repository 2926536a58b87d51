//! Network Algebra Tests
//!
//! Cascade/invert round trips, passivity of unitary networks,
//! component insertion, half-circuit extraction, renormalization and
//! mixed-mode transforms, plus the NetworkSet broadcast discipline.

use approx::assert_relative_eq;
use ndarray::{Array1, Array3};
use num_complex::Complex64;
use sparview_core::components::{ComponentSpec, Topology};
use sparview_core::frequency::{Frequency, FrequencyUnit, SweepType};
use sparview_core::network::{HalfMethod, LosslessKind};
use sparview_core::{Network, NetworkSet};

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// A mildly mismatched, lossy, reciprocal 2-port over 1-10 GHz.
fn sample_2port(name: &str) -> Network {
    let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    let mut s = Array3::<Complex64>::zeros((10, 2, 2));
    for f in 0..10 {
        let x = f as f64;
        s[[f, 0, 0]] = Complex64::from_polar(0.1, 0.2 * x);
        s[[f, 1, 1]] = Complex64::from_polar(0.15, -0.1 * x);
        let t = Complex64::from_polar(0.85, -0.5 * x);
        s[[f, 0, 1]] = t;
        s[[f, 1, 0]] = t;
    }
    let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
    Network::new(name, freq, s, z0).unwrap()
}

/// Lossless matched line: unitary S at every frequency.
fn unitary_2port(name: &str) -> Network {
    let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    let mut s = Array3::<Complex64>::zeros((10, 2, 2));
    for f in 0..10 {
        let t = Complex64::from_polar(1.0, -0.4 * f as f64);
        s[[f, 0, 1]] = t;
        s[[f, 1, 0]] = t;
    }
    let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
    Network::new(name, freq, s, z0).unwrap()
}

#[test]
fn cascade_invert_roundtrip_is_a_thru() {
    let n = sample_2port("dut");
    let thru = n.cascade(&n.inverted().unwrap()).unwrap();

    for f in 0..thru.nfreq() {
        assert_relative_eq!(thru.s[[f, 1, 0]].re, 1.0, epsilon = 1e-8);
        assert_relative_eq!(thru.s[[f, 1, 0]].im, 0.0, epsilon = 1e-8);
        assert_relative_eq!(thru.s[[f, 0, 1]].re, 1.0, epsilon = 1e-8);
        assert!(thru.s[[f, 0, 0]].norm() < 1e-8);
        assert!(thru.s[[f, 1, 1]].norm() < 1e-8);
    }
}

#[test]
fn cascade_reconciles_grids_first() {
    let a = sample_2port("a");

    // same network sampled on a finer, offset grid
    let grid: Vec<f64> = (4..=16).map(|i| i as f64 * 0.5e9).collect();
    let b = a.resampled_onto(&grid).unwrap().renamed("b");

    let joined = a.cascade(&b).unwrap();
    // overlap of [1,10] and [2,8] restricted to a's samples
    assert_relative_eq!(joined.frequency.start(), 2e9, epsilon = 1.0);
    assert_relative_eq!(joined.frequency.stop(), 8e9, epsilon = 1.0);
}

#[test]
fn passivity_of_unitary_network_is_one_everywhere() {
    let n = unitary_2port("line");
    let p = n.passivity().unwrap();
    assert_eq!(p.len(), 10);
    for v in p.values() {
        assert_relative_eq!(v.re, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn lossless_metrics_agree_with_unitarity() {
    let n = unitary_2port("line");
    for kind in [LosslessKind::Diagonal, LosslessKind::OffDiagonal] {
        let err = n.losslessness_error(kind).unwrap();
        for v in err.values() {
            assert!(v.re < 1e-12);
        }
    }
    let r = n.reciprocity_error().unwrap();
    for v in r.values() {
        assert!(v.re < 1e-12);
    }
}

/// Symmetric reciprocal 2-port (S11 = S22), as a fixture half.
fn symmetric_2port(name: &str) -> Network {
    let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    let mut s = Array3::<Complex64>::zeros((10, 2, 2));
    for f in 0..10 {
        let x = f as f64;
        let refl = Complex64::from_polar(0.08, 0.25 * x);
        let t = Complex64::from_polar(0.9, -0.45 * x);
        s[[f, 0, 0]] = refl;
        s[[f, 1, 1]] = refl;
        s[[f, 0, 1]] = t;
        s[[f, 1, 0]] = t;
    }
    let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
    Network::new(name, freq, s, z0).unwrap()
}

#[test]
fn half_extraction_reproduces_doubled_structure() {
    // build a doubled structure from a known symmetric half, then
    // split it; the midpoint method relies on that symmetry
    let half = symmetric_2port("half");
    let doubled = half.cascade(&half).unwrap();

    for method in [HalfMethod::Deembed, HalfMethod::Midpoint] {
        let extracted = doubled.halved(method).unwrap();
        let rebuilt = extracted.cascade(&extracted).unwrap();
        for f in 0..doubled.nfreq() {
            for i in 0..2 {
                for j in 0..2 {
                    let d = (rebuilt.s[[f, i, j]] - doubled.s[[f, i, j]]).norm();
                    assert!(d < 1e-7, "{:?}: S{}{} off by {}", method, i + 1, j + 1, d);
                }
            }
        }
    }
}

#[test]
fn series_and_shunt_insertion_closed_forms() {
    let thru = unitary_2port("thru");

    // series 50 Ω on a 50 Ω thru at port 1: S21 scales by 2z0/(z+2z0) = 2/3
    let with_r = thru
        .with_element(0, Topology::Series, &ComponentSpec::Resistor { ohms: 50.0 })
        .unwrap();
    assert_relative_eq!(with_r.s[[0, 1, 0]].norm(), 2.0 / 3.0, epsilon = 1e-9);

    // shunt 50 Ω: |S21| = 2y0/(y+2y0) = 2/3 as well (dual form)
    let with_g = thru
        .with_element(1, Topology::Shunt, &ComponentSpec::Resistor { ohms: 50.0 })
        .unwrap();
    assert_relative_eq!(with_g.s[[0, 1, 0]].norm(), 2.0 / 3.0, epsilon = 1e-9);
}

#[test]
fn renormalization_round_trip() {
    let n = sample_2port("dut");
    let back = n
        .renormalized(c(75.0, 0.0))
        .unwrap()
        .renormalized(c(50.0, 0.0))
        .unwrap();
    for f in 0..n.nfreq() {
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(back.s[[f, i, j]].re, n.s[[f, i, j]].re, epsilon = 1e-9);
                assert_relative_eq!(back.s[[f, i, j]].im, n.s[[f, i, j]].im, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn renormalization_changes_reflection() {
    let n = sample_2port("dut");
    let renorm = n.renormalized(c(75.0, 0.0)).unwrap();
    assert!((renorm.s[[0, 0, 0]] - n.s[[0, 0, 0]]).norm() > 1e-3);
}

#[test]
fn network_set_broadcast_and_isolation() {
    let set = NetworkSet::new(vec![
        sample_2port("a"),
        sample_2port("b"),
        sample_2port("c"),
    ]);
    let one = NetworkSet::from_network(unitary_2port("line"));

    let out = set.cascade(&one).unwrap();
    assert_eq!(out.len(), 3);

    let two = NetworkSet::new(vec![sample_2port("p"), sample_2port("q")]);
    assert!(set.cascade(&two).is_err());

    // a 1-port in the batch cannot be flipped; the rest survive
    let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    let one_port = Network::new(
        "load",
        freq,
        Array3::<Complex64>::zeros((10, 1, 1)),
        Array1::from_elem(1, c(50.0, 0.0)),
    )
    .unwrap();
    let mixed = NetworkSet::new(vec![sample_2port("a"), one_port, sample_2port("c")]);
    assert_eq!(mixed.flipped().len(), 2);
}

#[test]
fn mixed_mode_roundtrip_on_4port() {
    let freq = Frequency::new(1.0, 3.0, 3, FrequencyUnit::GHz, SweepType::Linear);
    let mut s = Array3::<Complex64>::zeros((3, 4, 4));
    for f in 0..3 {
        for i in 0..4 {
            for j in 0..4 {
                s[[f, i, j]] = Complex64::from_polar(
                    0.1 + 0.05 * ((i + 2 * j) as f64),
                    0.3 * (f as f64) - 0.2 * (i as f64) + 0.1 * (j as f64),
                );
            }
        }
    }
    let z0 = Array1::from_elem(4, c(50.0, 0.0));
    let n = Network::new("quad", freq, s, z0).unwrap();

    let back = n.to_mixed_mode().unwrap().from_mixed_mode().unwrap();
    for f in 0..3 {
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(back.s[[f, i, j]].re, n.s[[f, i, j]].re, epsilon = 1e-12);
                assert_relative_eq!(back.s[[f, i, j]].im, n.s[[f, i, j]].im, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn termination_reduces_to_1port() {
    let thru = unitary_2port("thru");
    let terminated = thru.terminated(1, c(50.0, 0.0)).unwrap();
    assert_eq!(terminated.nports(), 1);
    // matched termination behind a lossless matched line reflects nothing
    assert!(terminated.s[[0, 0, 0]].norm() < 1e-12);
}
