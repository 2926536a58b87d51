//! Numerical constants shared across the engine
//!
//! Centralizes tolerance values used for singularity checks, grid
//! comparisons and display clamping.

/// Tolerance for detecting near-zero values in divisions and
/// singularity checks.
pub const NEAR_ZERO: f64 = 1e-15;

/// Magnitude floor applied before taking logarithms for dB output.
/// Corresponds to a -300 dB floor.
pub const DB_FLOOR_MAG: f64 = 1e-15;

/// Relative tolerance for treating two frequency grids as identical.
pub const GRID_MATCH_RTOL: f64 = 1e-12;

/// Relative spacing deviation above which a grid is considered
/// non-equidistant and is resampled before the FFT.
pub const EQUIDISTANT_RTOL: f64 = 1e-6;

/// Tolerance for detecting DC (zero frequency).
pub const DC_FREQ_TOL: f64 = 1e-10;
