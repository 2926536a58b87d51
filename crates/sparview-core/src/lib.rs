//! sparview-core: S-parameter algebra and analysis engine
//!
//! The computational core of an interactive S-parameter viewer:
//! labeled complex curves and multi-port networks with broadcasting
//! collection semantics, frequency-grid reconciliation, lazily
//! realized parametric circuit elements, frequency-to-time transforms,
//! the Bode-Fano bound, Smith-chart circle geometry and a restricted
//! expression language exposing all of it to end-user text.
//!
//! ## Modules
//!
//! - `frequency` - Frequency axis representation
//! - `curve` - Scalar curve algebra (`Curve`, `CurveSet`)
//! - `network` - N-port networks, composition, metrics, I/O
//! - `components` - Parametric circuit elements
//! - `reconcile` - Frequency-grid reconciliation
//! - `analysis` - Time-domain transform, Bode-Fano, circle geometry
//! - `expr` - Expression evaluator
//! - `touchstone` / `citi` - File formats

pub mod analysis;
pub mod citi;
pub mod components;
pub mod constants;
pub mod curve;
pub mod expr;
pub mod frequency;
pub mod logging;
pub mod math;
pub mod network;
pub mod plot;
pub mod reconcile;
pub mod touchstone;

pub use curve::{Curve, CurveSet};
pub use frequency::Frequency;
pub use network::{Network, NetworkSet};
