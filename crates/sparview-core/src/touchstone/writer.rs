//! Touchstone v1 writer

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use num_complex::Complex64;

use super::parser::{ParameterType, SParamFormat, Touchstone, TouchstoneError};
use crate::frequency::FrequencyUnit;
use crate::math::db20;

impl fmt::Display for Touchstone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buf))
    }
}

impl Touchstone {
    /// Write to a file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), TouchstoneError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
    }

    /// Write to any writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), TouchstoneError> {
        for comment in &self.comments {
            writeln!(writer, "! {}", comment)?;
        }

        writeln!(
            writer,
            "# {} {} {} R {}",
            match self.frequency.unit() {
                FrequencyUnit::Hz => "HZ",
                FrequencyUnit::KHz => "KHZ",
                FrequencyUnit::MHz => "MHZ",
                FrequencyUnit::GHz => "GHZ",
                FrequencyUnit::THz => "THZ",
            },
            match self.param_type {
                ParameterType::S => "S",
                ParameterType::Z => "Z",
                ParameterType::Y => "Y",
            },
            match self.format {
                SParamFormat::RI => "RI",
                SParamFormat::MA => "MA",
                SParamFormat::DB => "DB",
            },
            self.z0
        )?;

        let f_scaled = self.frequency.f_scaled();
        for (fi, freq) in f_scaled.iter().enumerate() {
            write!(writer, "{:>15.9}", freq)?;

            let matrix = &self.data[fi];
            if self.nports == 2 {
                // historical column order: S11 S21 S12 S22
                for (i, j) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    self.write_value(writer, matrix[i][j])?;
                }
            } else {
                for row in matrix {
                    for &v in row {
                        self.write_value(writer, v)?;
                    }
                }
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_value<W: Write>(&self, writer: &mut W, v: Complex64) -> Result<(), TouchstoneError> {
        let (a, b) = match self.format {
            SParamFormat::RI => (v.re, v.im),
            SParamFormat::MA => (v.norm(), v.arg().to_degrees()),
            SParamFormat::DB => (db20(v), v.arg().to_degrees()),
        };
        write!(writer, " {:>15.9} {:>15.9}", a, b)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;
    use approx::assert_relative_eq;

    #[test]
    fn test_write_parse_roundtrip() {
        let ts = Touchstone {
            nports: 2,
            frequency: Frequency::from_scaled(vec![1.0, 2.0], FrequencyUnit::GHz).unwrap(),
            data: vec![
                vec![
                    vec![Complex64::new(0.1, -0.2), Complex64::new(0.7, 0.1)],
                    vec![Complex64::new(0.72, 0.08), Complex64::new(-0.05, 0.0)],
                ],
                vec![
                    vec![Complex64::new(0.12, -0.25), Complex64::new(0.65, 0.2)],
                    vec![Complex64::new(0.66, 0.18), Complex64::new(-0.06, 0.01)],
                ],
            ],
            z0: 50.0,
            format: SParamFormat::RI,
            param_type: ParameterType::S,
            comments: vec!["roundtrip".into()],
        };

        let text = ts.to_string();
        let back = Touchstone::from_str(&text, 2).unwrap();

        assert_eq!(back.nfreq(), 2);
        for fi in 0..2 {
            for i in 0..2 {
                for j in 0..2 {
                    assert_relative_eq!(
                        back.data[fi][i][j].re,
                        ts.data[fi][i][j].re,
                        epsilon = 1e-8
                    );
                    assert_relative_eq!(
                        back.data[fi][i][j].im,
                        ts.data[fi][i][j].im,
                        epsilon = 1e-8
                    );
                }
            }
        }
    }
}
