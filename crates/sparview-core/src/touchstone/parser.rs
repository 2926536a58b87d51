//! Touchstone v1 parser
//!
//! Reads `.sNp` files: an option line (`# GHZ S RI R 50`), comment
//! lines (`!`), and whitespace-separated data values. Data is consumed
//! as one token stream, so multi-line wrapping of n-port records needs
//! no special casing.

use std::fs;
use std::path::Path;

use num_complex::Complex64;
use thiserror::Error;

use crate::frequency::{Frequency, FrequencyUnit};

/// Touchstone parsing errors
#[derive(Error, Debug)]
pub enum TouchstoneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid option line: {0}")]
    InvalidOption(String),

    #[error("invalid file extension '{0}': expected .sNp")]
    InvalidExtension(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Value encoding of the data columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SParamFormat {
    /// Real and imaginary part
    RI,
    /// Magnitude and angle in degrees
    #[default]
    MA,
    /// dB magnitude and angle in degrees
    DB,
}

impl SParamFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RI" => Some(SParamFormat::RI),
            "MA" => Some(SParamFormat::MA),
            "DB" => Some(SParamFormat::DB),
            _ => None,
        }
    }

    fn decode(self, a: f64, b: f64) -> Complex64 {
        match self {
            SParamFormat::RI => Complex64::new(a, b),
            SParamFormat::MA => Complex64::from_polar(a, b.to_radians()),
            SParamFormat::DB => Complex64::from_polar(10.0_f64.powf(a / 20.0), b.to_radians()),
        }
    }
}

/// Network parameter type of the file contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterType {
    #[default]
    S,
    Z,
    Y,
}

impl ParameterType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Some(ParameterType::S),
            "Z" => Some(ParameterType::Z),
            "Y" => Some(ParameterType::Y),
            _ => None,
        }
    }
}

/// Parsed Touchstone data
#[derive(Debug, Clone)]
pub struct Touchstone {
    /// Number of ports
    pub nports: usize,
    /// Frequency axis in Hz
    pub frequency: Frequency,
    /// Raw parameter matrices `[nfreq][nports][nports]`
    pub data: Vec<Vec<Vec<Complex64>>>,
    /// Reference impedance from the option line
    pub z0: f64,
    /// Data column encoding
    pub format: SParamFormat,
    /// Parameter type (S, Z or Y)
    pub param_type: ParameterType,
    /// Leading comment lines, `!` stripped
    pub comments: Vec<String>,
}

impl Touchstone {
    /// Parse a file, inferring the port count from the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TouchstoneError> {
        let path = path.as_ref();
        let nports = nports_from_extension(path)?;
        let content = fs::read_to_string(path)?;
        Self::from_str(&content, nports)
    }

    /// Parse from string content with a known port count.
    pub fn from_str(content: &str, nports: usize) -> Result<Self, TouchstoneError> {
        let mut comments = Vec::new();
        let mut option: Option<(FrequencyUnit, ParameterType, SParamFormat, f64)> = None;
        let mut numbers: Vec<f64> = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = match raw.find('!') {
                Some(pos) => {
                    if pos == 0 {
                        comments.push(raw[1..].trim().to_string());
                    }
                    &raw[..pos]
                }
                None => raw,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                // Touchstone v2 keyword sections are out of scope
                return Err(TouchstoneError::Unsupported(format!(
                    "Touchstone v2 keyword [{}",
                    rest
                )));
            }

            if let Some(rest) = line.strip_prefix('#') {
                if option.is_some() {
                    return Err(TouchstoneError::Parse {
                        line: line_no,
                        message: "duplicate option line".into(),
                    });
                }
                option = Some(parse_option_line(rest)?);
                continue;
            }

            for token in line.split_whitespace() {
                let v: f64 = token.parse().map_err(|_| TouchstoneError::Parse {
                    line: line_no,
                    message: format!("not a number: '{}'", token),
                })?;
                numbers.push(v);
            }
        }

        let (unit, param_type, format, z0) =
            option.unwrap_or((FrequencyUnit::GHz, ParameterType::S, SParamFormat::MA, 50.0));

        let record = 1 + 2 * nports * nports;
        if numbers.is_empty() || numbers.len() % record != 0 {
            return Err(TouchstoneError::Parse {
                line: 0,
                message: format!(
                    "{} data values do not form complete {}-port records",
                    numbers.len(),
                    nports
                ),
            });
        }

        let nfreq = numbers.len() / record;
        let mut f_scaled = Vec::with_capacity(nfreq);
        let mut data = Vec::with_capacity(nfreq);

        for chunk in numbers.chunks(record) {
            f_scaled.push(chunk[0]);
            let mut matrix = vec![vec![Complex64::new(0.0, 0.0); nports]; nports];
            for (pair_idx, pair) in chunk[1..].chunks(2).enumerate() {
                let (i, j) = entry_order(nports, pair_idx);
                matrix[i][j] = format.decode(pair[0], pair[1]);
            }
            data.push(matrix);
        }

        let frequency =
            Frequency::from_scaled(f_scaled, unit).map_err(|e| TouchstoneError::Parse {
                line: 0,
                message: e.to_string(),
            })?;

        Ok(Self {
            nports,
            frequency,
            data,
            z0,
            format,
            param_type,
            comments,
        })
    }

    /// Number of frequency records
    pub fn nfreq(&self) -> usize {
        self.data.len()
    }
}

/// Index order of the flattened matrix entries in a data record.
///
/// 2-port files historically use `S11 S21 S12 S22`; every other port
/// count is row-major.
fn entry_order(nports: usize, pair_idx: usize) -> (usize, usize) {
    if nports == 2 {
        [(0, 0), (1, 0), (0, 1), (1, 1)][pair_idx]
    } else {
        (pair_idx / nports, pair_idx % nports)
    }
}

fn parse_option_line(
    rest: &str,
) -> Result<(FrequencyUnit, ParameterType, SParamFormat, f64), TouchstoneError> {
    let mut unit = FrequencyUnit::GHz;
    let mut param = ParameterType::S;
    let mut format = SParamFormat::MA;
    let mut z0 = 50.0;

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i];
        if tok.eq_ignore_ascii_case("R") {
            let Some(val) = tokens.get(i + 1) else {
                return Err(TouchstoneError::InvalidOption(rest.trim().into()));
            };
            z0 = val
                .parse()
                .map_err(|_| TouchstoneError::InvalidOption(rest.trim().into()))?;
            i += 2;
            continue;
        }
        if let Some(u) = FrequencyUnit::parse(tok) {
            unit = u;
        } else if let Some(f) = SParamFormat::parse(tok) {
            format = f;
        } else if let Some(p) = ParameterType::parse(tok) {
            param = p;
        } else if tok.eq_ignore_ascii_case("G") || tok.eq_ignore_ascii_case("H") {
            return Err(TouchstoneError::Unsupported(format!(
                "{}-parameter files",
                tok.to_ascii_uppercase()
            )));
        } else {
            return Err(TouchstoneError::InvalidOption(rest.trim().into()));
        }
        i += 1;
    }

    Ok((unit, param, format, z0))
}

/// Port count from a `.sNp` extension.
pub fn nports_from_extension(path: &Path) -> Result<usize, TouchstoneError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let digits: String = ext
        .strip_prefix('s')
        .and_then(|rest| rest.strip_suffix('p'))
        .map(|d| d.to_string())
        .unwrap_or_default();
    digits
        .parse()
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| TouchstoneError::InvalidExtension(ext))
}
