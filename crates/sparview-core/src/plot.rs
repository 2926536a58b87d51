//! Rendering callback types
//!
//! The engine never draws anything itself. Finished curves are handed
//! to a caller-injected sink, rebound before each evaluation run.

use num_complex::Complex64;

/// Display hints forwarded alongside the data.
///
/// Interpretation is entirely up to the renderer.
#[derive(Debug, Clone, Default)]
pub struct PlotStyle {
    /// Dash/marker pattern hint, e.g. `"-"`, `"--"`, `"o"`
    pub pattern: Option<String>,
    /// Color hint, e.g. `"red"` or `"#336699"`
    pub color: Option<String>,
}

/// One finished curve as delivered to the rendering callback.
#[derive(Debug, Clone)]
pub struct PlotData {
    /// X axis samples (Hz for spectral curves, seconds for time-domain
    /// responses, degrees for circle sweeps)
    pub x: Vec<f64>,
    /// Complex sample values
    pub y: Vec<Complex64>,
    /// Reference impedance the values are normalized to
    pub z0: Complex64,
    /// Trace label
    pub label: String,
    /// Display hints
    pub style: PlotStyle,
    /// Opaque origin tag (source network name), if known
    pub provenance: Option<String>,
}
