//! Expression evaluator
//!
//! A restricted scripting surface over the algebra: user text is
//! parsed into a fixed method-chain grammar and interpreted directly
//! against the typed API, so the reachable vocabulary is a
//! compile-time fact. Statements run in textual order; the first error
//! aborts the whole run (already-emitted plot callbacks stay).

mod eval;
mod lexer;
mod parser;

pub use eval::{evaluate, DefaultAction, EvalContext, EvalOutcome, Value};

use thiserror::Error;

/// Errors surfaced by the evaluator.
#[derive(Error, Debug)]
pub enum ExprError {
    #[error("syntax error at line {line}, column {col}: {message}")]
    Syntax {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("statement {statement} (line {line}): {source}")]
    Eval {
        statement: usize,
        line: usize,
        #[source]
        source: anyhow::Error,
    },
}
