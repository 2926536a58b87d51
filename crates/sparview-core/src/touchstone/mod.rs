//! Touchstone v1 file I/O

mod parser;
mod writer;

pub use parser::{
    nports_from_extension, ParameterType, SParamFormat, Touchstone, TouchstoneError,
};
