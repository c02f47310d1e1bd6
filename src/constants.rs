//! # Constants and type definitions for orbit ensembles
//!
//! This module centralizes the **unit conversion factors**, **numerical tolerances**
//! and **common type aliases** shared by the covariance assembler, the Gaussian
//! sampler, the Monte Carlo generator and the hypercube generator.
//!
//! ## Overview
//!
//! - Unit conversions (AU ↔ km) used to keep Keplerian covariances well conditioned
//! - Dimension of an orbital state and size of its packed covariance
//! - Tolerances driving anomaly disambiguation and eigenvalue clamping
//! - Fixed-size `nalgebra` aliases for six-dimensional states and covariances

use nalgebra::{SMatrix, SVector};

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

// -------------------------------------------------------------------------------------------------
// Dimensions
// -------------------------------------------------------------------------------------------------

/// Dimension of an orbital state (three positions + three velocities, or six elements)
pub const STATE_DIM: usize = 6;

/// Number of independent entries of a symmetric 6×6 matrix (lower triangle, diagonal included)
pub const LOWER_TRIANGLE_LEN: usize = STATE_DIM * (STATE_DIM + 1) / 2;

/// Number of lower-triangular entries shared by both Keplerian covariance layouts
/// (rows 0..5, everything except the anomaly row)
pub const KEPLERIAN_COMMON_LEN: usize = LOWER_TRIANGLE_LEN - STATE_DIM;

/// Number of hypercube corners for a six-dimensional state (2⁶)
pub const HYPERCUBE_CORNERS: usize = 1 << STATE_DIM;

/// Number of hypercube faces for a six-dimensional state (2 × 6)
pub const HYPERCUBE_FACES: usize = 2 * STATE_DIM;

// -------------------------------------------------------------------------------------------------
// Tolerances
// -------------------------------------------------------------------------------------------------

/// Threshold above which an anomaly (or its covariance term) is considered "set".
pub const ANOMALY_EPS: f64 = 1e-20;

/// Default singular-matrix tolerance used by the Monte Carlo generator.
pub const DEFAULT_MONTE_CARLO_TOLERANCE: f64 = 1e-15;

/// Default singular-matrix tolerance of a standalone Gaussian sampler.
pub const DEFAULT_SAMPLER_TOLERANCE: f64 = 1e-12;

// -------------------------------------------------------------------------------------------------
// Side-channel keys
// -------------------------------------------------------------------------------------------------

/// User-defined key selecting the hypercube perturbation type (`FACES` or `CORNERS`)
pub const HYPERCUBE_TYPE_KEY: &str = "HYPERCUBE_TYPE";

/// User-defined key carrying the hypercube sigma multiplier
pub const HYPERCUBE_SIGMA_KEY: &str = "HYPERCUBE_SIGMA";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Six-dimensional orbital state vector
pub type Vector6 = SVector<f64, STATE_DIM>;

/// 6×6 covariance matrix
pub type Matrix6 = SMatrix<f64, STATE_DIM, STATE_DIM>;

/// Distance in kilometers
pub type Kilometer = f64;

/// Velocity in kilometers per second
pub type KmPerSec = f64;

/// Angle in degrees
pub type Degree = f64;
