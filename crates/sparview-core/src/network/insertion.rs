//! Component insertion
//!
//! Adds a lumped element, line or termination at one port of a
//! network. The added element is synthesized as a 2-port from closed
//! form on the target's own grid, then embedded: by direct algebra for
//! a 1-port target, by cascading for a 2-port target.

use anyhow::{bail, Context, Result};
use ndarray::Array3;
use num_complex::Complex64;

use super::core::Network;
use crate::components::{lumped_2port, ComponentSpec, Topology};

impl Network {
    /// Insert a component at port `port` (0-based).
    ///
    /// Lumped kinds (resistor, inductor, capacitor, termination
    /// impedance) honor the series/shunt topology; a transmission line
    /// is inserted in the signal path only.
    pub fn with_element(
        &self,
        port: usize,
        topology: Topology,
        spec: &ComponentSpec,
    ) -> Result<Network> {
        if port >= self.nports() {
            bail!(
                "network '{}': insertion port {} out of range ({} ports)",
                self.name,
                port + 1,
                self.nports()
            );
        }

        let z0 = self.z0_system();
        let element = match spec {
            ComponentSpec::Line(_) => {
                if topology == Topology::Shunt {
                    bail!(
                        "network '{}': shunt line insertion is not supported",
                        self.name
                    );
                }
                spec.realize(&self.frequency, z0)
                    .with_context(|| format!("inserting line into '{}'", self.name))?
            }
            _ => {
                let zfun = |f: f64| {
                    spec.impedance(f)
                        .expect("insertion element has an impedance")
                };
                if spec.impedance(self.f()[0]).is_none() {
                    bail!(
                        "network '{}': cannot insert a {} element",
                        self.name,
                        spec.kind_name()
                    );
                }
                lumped_2port(spec.kind_name(), &self.frequency, z0, topology, zfun)
                    .with_context(|| format!("inserting element into '{}'", self.name))?
            }
        };

        let mut out = match self.nports() {
            1 => self.embed_1port(&element)?,
            2 => {
                if port == 0 {
                    element.cascade(self)?
                } else {
                    self.cascade(&element)?
                }
            }
            n => bail!(
                "network '{}': insertion into a {}-port network is not supported",
                self.name,
                n
            ),
        };
        out.name = format!("{}+{}", self.name, spec.kind_name());
        Ok(out)
    }

    /// Terminate port `port` with an arbitrary impedance, reducing a
    /// 2-port to a 1-port seen from the other side.
    pub fn terminated(&self, port: usize, z: Complex64) -> Result<Network> {
        if self.nports() != 2 {
            bail!(
                "network '{}': termination requires a 2-port ({} ports)",
                self.name,
                self.nports()
            );
        }
        if port >= 2 {
            bail!(
                "network '{}': termination port {} out of range",
                self.name,
                port + 1
            );
        }

        // Terminate port 2; flip first when port 1 was requested
        let target = if port == 0 { self.flipped()? } else { self.clone() };
        let z0 = target.z0[1];
        let gamma = (z - z0) / (z + z0);

        let nfreq = target.nfreq();
        let one = Complex64::new(1.0, 0.0);
        let mut s_new = Array3::<Complex64>::zeros((nfreq, 1, 1));
        for f in 0..nfreq {
            let s11 = target.s[[f, 0, 0]];
            let s12 = target.s[[f, 0, 1]];
            let s21 = target.s[[f, 1, 0]];
            let s22 = target.s[[f, 1, 1]];
            s_new[[f, 0, 0]] = s11 + s12 * s21 * gamma / (one - s22 * gamma);
        }

        Network::new(
            format!("{}+termination", self.name),
            self.frequency.clone(),
            s_new,
            ndarray::Array1::from_elem(1, target.z0[0]),
        )
    }

    /// Direct 1-port embedding: the element's port 2 looks into the
    /// existing reflection coefficient.
    fn embed_1port(&self, element: &Network) -> Result<Network> {
        let nfreq = self.nfreq();
        let one = Complex64::new(1.0, 0.0);
        let mut s_new = Array3::<Complex64>::zeros((nfreq, 1, 1));

        for f in 0..nfreq {
            let gamma = self.s[[f, 0, 0]];
            let e11 = element.s[[f, 0, 0]];
            let e12 = element.s[[f, 0, 1]];
            let e21 = element.s[[f, 1, 0]];
            let e22 = element.s[[f, 1, 1]];
            s_new[[f, 0, 0]] = e11 + e12 * e21 * gamma / (one - e22 * gamma);
        }

        Network::new(
            self.name.clone(),
            self.frequency.clone(),
            s_new,
            self.z0.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{Frequency, FrequencyUnit, SweepType};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn matched_load() -> Network {
        let freq = Frequency::new(1.0, 5.0, 5, FrequencyUnit::GHz, SweepType::Linear);
        let s = Array3::<Complex64>::zeros((5, 1, 1));
        let z0 = Array1::from_elem(1, Complex64::new(50.0, 0.0));
        Network::new("load", freq, s, z0).unwrap()
    }

    fn thru_2port() -> Network {
        let freq = Frequency::new(1.0, 5.0, 5, FrequencyUnit::GHz, SweepType::Linear);
        let mut s = Array3::<Complex64>::zeros((5, 2, 2));
        for f in 0..5 {
            s[[f, 0, 1]] = Complex64::new(1.0, 0.0);
            s[[f, 1, 0]] = Complex64::new(1.0, 0.0);
        }
        let z0 = Array1::from_elem(2, Complex64::new(50.0, 0.0));
        Network::new("thru", freq, s, z0).unwrap()
    }

    #[test]
    fn test_series_resistor_into_matched_1port() {
        // 50 Ω load behind a series 50 Ω: Γ = (100-50)/(100+50) = 1/3
        let load = matched_load();
        let out = load
            .with_element(0, Topology::Series, &ComponentSpec::Resistor { ohms: 50.0 })
            .unwrap();
        assert_eq!(out.nports(), 1);
        assert_relative_eq!(out.s[[0, 0, 0]].re, 1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_shunt_resistor_into_matched_1port() {
        // 50 Ω load with 50 Ω to ground: 25 Ω total, Γ = -1/3
        let load = matched_load();
        let out = load
            .with_element(0, Topology::Shunt, &ComponentSpec::Resistor { ohms: 50.0 })
            .unwrap();
        assert_relative_eq!(out.s[[0, 0, 0]].re, -1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_series_resistor_into_thru() {
        // Series 100 Ω in a matched thru: S21 = 100/(100+100) = 0.5
        let thru = thru_2port();
        let out = thru
            .with_element(0, Topology::Series, &ComponentSpec::Resistor { ohms: 100.0 })
            .unwrap();
        assert_eq!(out.nports(), 2);
        assert_relative_eq!(out.s[[0, 1, 0]].re, 0.5, epsilon = 1e-10);
        assert_relative_eq!(out.s[[0, 0, 0]].re, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_terminated_thru_shows_load() {
        let thru = thru_2port();
        let out = thru.terminated(1, Complex64::new(100.0, 0.0)).unwrap();
        assert_eq!(out.nports(), 1);
        assert_relative_eq!(out.s[[0, 0, 0]].re, 1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_insertion_port_range_checked() {
        let thru = thru_2port();
        assert!(thru
            .with_element(2, Topology::Series, &ComponentSpec::Resistor { ohms: 1.0 })
            .is_err());
    }
}
