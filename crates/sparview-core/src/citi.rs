//! CITI file I/O
//!
//! Reads and writes CITIFILE A.01.00 packages with a `FREQ` variable
//! and one `S[i,j] RI` data array per matrix entry.

use std::fs;
use std::path::Path;

use num_complex::Complex64;
use thiserror::Error;

use crate::frequency::Frequency;

#[derive(Error, Debug)]
pub enum CitiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Parsed CITI package
#[derive(Debug, Clone)]
pub struct CitiFile {
    pub name: String,
    /// Frequency axis in Hz
    pub frequency: Frequency,
    /// One `[nfreq]` array per declared `S[i,j]`, in declaration order
    pub arrays: Vec<((usize, usize), Vec<Complex64>)>,
}

impl CitiFile {
    /// Square port count implied by the declared arrays, if any.
    pub fn nports(&self) -> Option<usize> {
        let max = self
            .arrays
            .iter()
            .map(|((i, j), _)| (*i).max(*j))
            .max()?;
        let n = max + 1;
        (self.arrays.len() == n * n).then_some(n)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CitiError> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, CitiError> {
        let mut name = String::from("citi");
        let mut freqs: Vec<f64> = Vec::new();
        let mut declared: Vec<(usize, usize)> = Vec::new();
        let mut blocks: Vec<Vec<Complex64>> = Vec::new();

        enum Section {
            Header,
            VarList,
            Data,
        }
        let mut section = Section::Header;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match section {
                Section::Header => {
                    if let Some(rest) = line.strip_prefix("CITIFILE") {
                        let version = rest.trim();
                        if !version.starts_with("A.") {
                            return Err(CitiError::Unsupported(format!(
                                "CITIFILE version {}",
                                version
                            )));
                        }
                    } else if let Some(rest) = line.strip_prefix("NAME") {
                        name = rest.trim().to_string();
                    } else if let Some(rest) = line.strip_prefix("VAR ") {
                        let mut it = rest.split_whitespace();
                        let var_name = it.next().unwrap_or_default();
                        if !var_name.eq_ignore_ascii_case("FREQ") {
                            return Err(CitiError::Unsupported(format!(
                                "independent variable {}",
                                var_name
                            )));
                        }
                    } else if let Some(rest) = line.strip_prefix("DATA ") {
                        declared.push(parse_data_decl(rest, line_no)?);
                    } else if line == "VAR_LIST_BEGIN" {
                        section = Section::VarList;
                    } else if line == "BEGIN" {
                        blocks.push(Vec::new());
                        section = Section::Data;
                    }
                    // other keywords (CONSTANT, COMMENT, ...) are skipped
                }
                Section::VarList => {
                    if line == "VAR_LIST_END" {
                        section = Section::Header;
                    } else {
                        freqs.push(line.parse().map_err(|_| CitiError::Parse {
                            line: line_no,
                            message: format!("not a frequency: '{}'", line),
                        })?);
                    }
                }
                Section::Data => {
                    if line == "END" {
                        section = Section::Header;
                    } else {
                        let mut parts = line.split(',');
                        let re: f64 = parts
                            .next()
                            .and_then(|p| p.trim().parse().ok())
                            .ok_or_else(|| CitiError::Parse {
                                line: line_no,
                                message: format!("bad data pair: '{}'", line),
                            })?;
                        let im: f64 = parts
                            .next()
                            .and_then(|p| p.trim().parse().ok())
                            .ok_or_else(|| CitiError::Parse {
                                line: line_no,
                                message: format!("bad data pair: '{}'", line),
                            })?;
                        blocks
                            .last_mut()
                            .expect("inside a data block")
                            .push(Complex64::new(re, im));
                    }
                }
            }
        }

        if declared.len() != blocks.len() {
            return Err(CitiError::Parse {
                line: 0,
                message: format!(
                    "{} DATA declarations but {} data blocks",
                    declared.len(),
                    blocks.len()
                ),
            });
        }
        for (decl, block) in declared.iter().zip(blocks.iter()) {
            if block.len() != freqs.len() {
                return Err(CitiError::Parse {
                    line: 0,
                    message: format!(
                        "S[{},{}] has {} values for {} frequencies",
                        decl.0 + 1,
                        decl.1 + 1,
                        block.len(),
                        freqs.len()
                    ),
                });
            }
        }

        let frequency = Frequency::from_hz(freqs).map_err(|e| CitiError::Parse {
            line: 0,
            message: e.to_string(),
        })?;

        Ok(Self {
            name,
            frequency,
            arrays: declared.into_iter().zip(blocks).collect(),
        })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), CitiError> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl std::fmt::Display for CitiFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CITIFILE A.01.00")?;
        writeln!(f, "NAME {}", self.name)?;
        writeln!(f, "VAR FREQ MAG {}", self.frequency.npoints())?;
        for ((i, j), _) in &self.arrays {
            writeln!(f, "DATA S[{},{}] RI", i + 1, j + 1)?;
        }
        writeln!(f, "VAR_LIST_BEGIN")?;
        for &x in self.frequency.f() {
            writeln!(f, "{}", x)?;
        }
        writeln!(f, "VAR_LIST_END")?;
        for (_, block) in &self.arrays {
            writeln!(f, "BEGIN")?;
            for v in block {
                writeln!(f, "{:.9e},{:.9e}", v.re, v.im)?;
            }
            writeln!(f, "END")?;
        }
        Ok(())
    }
}

/// Parse `S[i,j] RI` (1-based indices in the file).
fn parse_data_decl(rest: &str, line_no: usize) -> Result<(usize, usize), CitiError> {
    let bad = || CitiError::Parse {
        line: line_no,
        message: format!("bad DATA declaration: '{}'", rest.trim()),
    };

    let mut it = rest.split_whitespace();
    let array = it.next().ok_or_else(bad)?;
    let format = it.next().unwrap_or("RI");
    if !format.eq_ignore_ascii_case("RI") {
        return Err(CitiError::Unsupported(format!("CITI data format {}", format)));
    }

    let inner = array
        .strip_prefix("S[")
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(bad)?;
    let mut nums = inner.split(',');
    let i: usize = nums.next().and_then(|n| n.trim().parse().ok()).ok_or_else(bad)?;
    let j: usize = nums.next().and_then(|n| n.trim().parse().ok()).ok_or_else(bad)?;
    if i == 0 || j == 0 {
        return Err(bad());
    }
    Ok((i - 1, j - 1))
}
