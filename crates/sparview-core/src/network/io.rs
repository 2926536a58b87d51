//! Network file I/O
//!
//! Load and save dispatch keyed by file extension: touchstone
//! (`.sNp`), CITI (`.cti`/`.citi`) and CSV export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array1, Array3};
use num_complex::Complex64;

use super::core::Network;
use crate::citi::CitiFile;
use crate::math::transforms::{s2y, s2z, y2s, z2s};
use crate::touchstone::{nports_from_extension, ParameterType, SParamFormat, Touchstone};

impl Network {
    /// Load a network from a file, dispatching on the extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        match extension_of(path).as_str() {
            "cti" | "citi" => {
                let citi =
                    CitiFile::from_file(path).with_context(|| format!("loading {:?}", path))?;
                Network::from_citi(&citi, &stem)
            }
            _ => {
                let ts = Touchstone::from_file(path)
                    .with_context(|| format!("loading {:?}", path))?;
                Network::from_touchstone(&ts, &stem)
            }
        }
    }

    /// Save the network, dispatching on the extension.
    ///
    /// `.sNp` (matching the port count) writes touchstone RI,
    /// `.cti`/`.citi` writes a CITI package and `.csv` a spreadsheet
    /// export.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match extension_of(path).as_str() {
            "cti" | "citi" => {
                self.to_citi().write(path)?;
                Ok(())
            }
            "csv" => self.write_csv(path),
            _ => {
                let nports = nports_from_extension(path)?;
                if nports != self.nports() {
                    bail!(
                        "network '{}' has {} ports, file extension implies {}",
                        self.name,
                        self.nports(),
                        nports
                    );
                }
                self.to_touchstone(SParamFormat::RI).write(path)?;
                Ok(())
            }
        }
    }

    /// Build a network from parsed touchstone data.
    pub fn from_touchstone(ts: &Touchstone, name: &str) -> Result<Network> {
        let nports = ts.nports;
        let nfreq = ts.nfreq();
        let z0 = Array1::from_elem(nports, Complex64::new(ts.z0, 0.0));

        let raw = Array3::from_shape_fn((nfreq, nports, nports), |(f, i, j)| ts.data[f][i][j]);
        let s = match ts.param_type {
            ParameterType::S => raw,
            // v1 stores Z/Y normalized to the reference impedance
            ParameterType::Z => {
                let denorm = raw.mapv(|v| v * ts.z0);
                z2s(&denorm, &z0).ok_or_else(|| anyhow!("singular Z-to-S conversion"))?
            }
            ParameterType::Y => {
                let denorm = raw.mapv(|v| v / ts.z0);
                y2s(&denorm, &z0).ok_or_else(|| anyhow!("singular Y-to-S conversion"))?
            }
        };

        let mut ntwk = Network::new(name, ts.frequency.clone(), s, z0)?;
        ntwk.comments = ts.comments.clone();
        Ok(ntwk)
    }

    /// Convert to touchstone data for writing.
    pub fn to_touchstone(&self, format: SParamFormat) -> Touchstone {
        let nports = self.nports();
        let data = (0..self.nfreq())
            .map(|f| {
                (0..nports)
                    .map(|i| (0..nports).map(|j| self.s[[f, i, j]]).collect())
                    .collect()
            })
            .collect();

        Touchstone {
            nports,
            frequency: self.frequency.clone(),
            data,
            z0: self.z0_system().re,
            format,
            param_type: ParameterType::S,
            comments: self.comments.clone(),
        }
    }

    /// Touchstone export of the Z or Y representation.
    pub fn to_touchstone_params(
        &self,
        format: SParamFormat,
        param_type: ParameterType,
    ) -> Result<Touchstone> {
        let mut ts = self.to_touchstone(format);
        if param_type == ParameterType::S {
            return Ok(ts);
        }

        let converted = match param_type {
            ParameterType::Z => s2z(&self.s, &self.z0)
                .ok_or_else(|| anyhow!("singular S-to-Z conversion"))?
                .mapv(|v| v / self.z0_system().re),
            ParameterType::Y => s2y(&self.s, &self.z0)
                .ok_or_else(|| anyhow!("singular S-to-Y conversion"))?
                .mapv(|v| v * self.z0_system().re),
            ParameterType::S => unreachable!(),
        };
        let nports = self.nports();
        ts.param_type = param_type;
        ts.data = (0..self.nfreq())
            .map(|f| {
                (0..nports)
                    .map(|i| (0..nports).map(|j| converted[[f, i, j]]).collect())
                    .collect()
            })
            .collect();
        Ok(ts)
    }

    fn from_citi(citi: &CitiFile, name: &str) -> Result<Network> {
        let nports = citi.nports().ok_or_else(|| {
            anyhow!(
                "CITI file '{}' does not declare a complete square S-matrix",
                citi.name
            )
        })?;

        let nfreq = citi.frequency.npoints();
        let mut s = Array3::<Complex64>::zeros((nfreq, nports, nports));
        for ((i, j), block) in &citi.arrays {
            for (f, &v) in block.iter().enumerate() {
                s[[f, *i, *j]] = v;
            }
        }

        let z0 = Array1::from_elem(nports, Complex64::new(50.0, 0.0));
        Network::new(name, citi.frequency.clone(), s, z0)
    }

    fn to_citi(&self) -> CitiFile {
        let nports = self.nports();
        let mut arrays = Vec::with_capacity(nports * nports);
        for i in 0..nports {
            for j in 0..nports {
                let block = (0..self.nfreq()).map(|f| self.s[[f, i, j]]).collect();
                arrays.push(((i, j), block));
            }
        }
        CitiFile {
            name: self.name.clone(),
            frequency: self.frequency.clone(),
            arrays,
        }
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
        let mut w = BufWriter::new(file);

        let nports = self.nports();
        write!(w, "freq_hz")?;
        for i in 0..nports {
            for j in 0..nports {
                write!(w, ",S{}{}_re,S{}{}_im", i + 1, j + 1, i + 1, j + 1)?;
            }
        }
        writeln!(w)?;

        for (fi, &f) in self.f().iter().enumerate() {
            write!(w, "{}", f)?;
            for i in 0..nports {
                for j in 0..nports {
                    let v = self.s[[fi, i, j]];
                    write!(w, ",{},{}", v.re, v.im)?;
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
