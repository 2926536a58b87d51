//! `NetworkSet`: a broadcasting collection of networks
//!
//! Mirrors the `CurveSet` discipline: shape errors (broadcast size
//! mismatch) are fatal, per-element failures are logged and dropped.

use anyhow::{bail, Result};
use num_complex::Complex64;
use tracing::warn;

use super::core::Network;
use super::half::HalfMethod;
use super::metrics::LosslessKind;
use crate::components::{Component, ComponentSpec, Topology};
use crate::curve::{Curve, CurveSet};

/// An ordered list of networks acting as one vectorized value.
#[derive(Debug, Clone, Default)]
pub struct NetworkSet {
    items: Vec<Network>,
}

impl NetworkSet {
    pub fn new(items: Vec<Network>) -> Self {
        Self { items }
    }

    pub fn from_network(network: Network) -> Self {
        Self {
            items: vec![network],
        }
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
    pub fn items(&self) -> &[Network] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Network> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Network> {
        self.items.iter()
    }

    /// Apply a fallible transform per element, dropping failures.
    pub fn map_tolerant<F>(&self, op_name: &str, f: F) -> NetworkSet
    where
        F: Fn(&Network) -> Result<Network>,
    {
        let items = self
            .items
            .iter()
            .filter_map(|n| match f(n) {
                Ok(out) => Some(out),
                Err(err) => {
                    warn!(network = %n.name, operation = op_name, %err, "dropping network from batch");
                    None
                }
            })
            .collect();
        NetworkSet { items }
    }

    /// Per-element extraction into a curve set, same drop policy.
    pub fn map_tolerant_curves<F>(&self, op_name: &str, f: F) -> CurveSet
    where
        F: Fn(&Network) -> Result<Curve>,
    {
        let items = self
            .items
            .iter()
            .filter_map(|n| match f(n) {
                Ok(out) => Some(out),
                Err(err) => {
                    warn!(network = %n.name, operation = op_name, %err, "dropping network from batch");
                    None
                }
            })
            .collect();
        CurveSet::new(items)
    }

    /// Cascade two sets element by element (broadcasting size law).
    pub fn cascade(&self, other: &NetworkSet) -> Result<NetworkSet> {
        let (la, lb) = (self.len(), other.len());
        if la != lb && la != 1 && lb != 1 {
            bail!("cannot broadcast network sets of size {} and {} in cascade", la, lb);
        }
        let n = la.max(lb);
        let items = (0..n)
            .filter_map(|i| {
                let a = &self.items[if la == 1 { 0 } else { i }];
                let b = &other.items[if lb == 1 { 0 } else { i }];
                match a.cascade(b) {
                    Ok(out) => Some(out),
                    Err(err) => {
                        warn!(network = %a.name, operation = "cascade", %err, "dropping network from batch");
                        None
                    }
                }
            })
            .collect();
        Ok(NetworkSet { items })
    }

    /// Cascade every member with a parametric component, realizing the
    /// component on each member's grid and system impedance.
    ///
    /// `component_first` selects `component ** network` instead of
    /// `network ** component`.
    pub fn cascade_component(&self, component: &Component, component_first: bool) -> NetworkSet {
        self.map_tolerant("cascade component", |n| {
            let realized = component.realize(&n.frequency, n.z0_system())?;
            if component_first {
                realized.cascade(n)
            } else {
                n.cascade(&realized)
            }
        })
    }

    // Vectorized wrappers over the per-network operations.

    pub fn s_curves(&self, to: usize, from: usize) -> CurveSet {
        self.map_tolerant_curves("s-parameter", |n| n.s_curve(to, from))
    }

    pub fn inverted(&self) -> NetworkSet {
        self.map_tolerant("invert", Network::inverted)
    }

    pub fn flipped(&self) -> NetworkSet {
        self.map_tolerant("flip", Network::flipped)
    }

    pub fn halved(&self, method: HalfMethod) -> NetworkSet {
        self.map_tolerant("half", |n| n.halved(method))
    }

    pub fn renormalized(&self, z_new: Complex64) -> NetworkSet {
        self.map_tolerant("renormalize", |n| n.renormalized(z_new))
    }

    pub fn to_mixed_mode(&self) -> NetworkSet {
        self.map_tolerant("mixed-mode", Network::to_mixed_mode)
    }

    pub fn from_mixed_mode(&self) -> NetworkSet {
        self.map_tolerant("single-ended", Network::from_mixed_mode)
    }

    pub fn with_element(&self, port: usize, topology: Topology, spec: &ComponentSpec) -> NetworkSet {
        self.map_tolerant("insert element", |n| n.with_element(port, topology, spec))
    }

    pub fn terminated(&self, port: usize, z: Complex64) -> NetworkSet {
        self.map_tolerant("terminate", |n| n.terminated(port, z))
    }

    pub fn stability_k(&self) -> CurveSet {
        self.map_tolerant_curves("stability factor", Network::stability_k)
    }

    pub fn stability_mu(&self, port: usize) -> CurveSet {
        self.map_tolerant_curves("mu factor", |n| n.stability_mu(port))
    }

    pub fn passivity(&self) -> CurveSet {
        self.map_tolerant_curves("passivity", Network::passivity)
    }

    pub fn reciprocity_error(&self) -> CurveSet {
        self.map_tolerant_curves("reciprocity", Network::reciprocity_error)
    }

    pub fn losslessness_error(&self, kind: LosslessKind) -> CurveSet {
        self.map_tolerant_curves("losslessness", |n| n.losslessness_error(kind))
    }
}

impl From<Vec<Network>> for NetworkSet {
    fn from(items: Vec<Network>) -> Self {
        Self { items }
    }
}
