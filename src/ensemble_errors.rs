use thiserror::Error;

use crate::orbit_state::{keplerian_state::AnomalyKind, StateKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnsembleError {
    #[error("Draw count must be strictly positive, got {0}")]
    InvalidDrawCount(usize),

    #[error("No state vector present: exactly one of Cartesian or Keplerian state is required")]
    MissingStateVector,

    #[error("Both Cartesian and Keplerian states present: exactly one is allowed")]
    AmbiguousStateVector,

    #[error("No sigma or covariance provided for the {0} state")]
    MissingUncertainty(StateKind),

    #[error(
        "Mismatched anomaly type between covariance and state: uncertainty uses {uncertainty}, state uses {state}"
    )]
    AnomalyMismatch {
        uncertainty: AnomalyKind,
        state: AnomalyKind,
    },

    #[error("Dimension mismatch: mean has length {mean}, covariance is {rows}x{cols}")]
    DimensionMismatch {
        mean: usize,
        rows: usize,
        cols: usize,
    },

    #[error(
        "Covariance matrix is not positive semi-definite: eigenvalue #{index} = {eigenvalue:e} (tolerance {tolerance:e})"
    )]
    NonPositiveSemiDefinite {
        index: usize,
        eigenvalue: f64,
        tolerance: f64,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Hypercube perturbations require a Cartesian state, got a Keplerian state")]
    HypercubeRequiresCartesian,

    #[error("Hypercube perturbations require a Cartesian covariance, none present")]
    MissingCovariance,

    #[error("Missing hypercube perturbation type and sigma fields")]
    MissingHypercubeFields,

    #[error("Missing hypercube perturbation type field")]
    MissingHypercubeType,

    #[error("Missing hypercube sigma field")]
    MissingHypercubeSigma,

    #[error("Unable to parse hypercube perturbation type: {0}")]
    InvalidHypercubeType(String),

    #[error("Unable to parse hypercube sigma: {0}")]
    InvalidHypercubeSigma(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
