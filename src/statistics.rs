//! Empirical moments of a generated ensemble.
//!
//! These helpers summarize a set of draws (mean vector and unbiased covariance),
//! which is how a Monte Carlo ensemble is checked against the covariance it was
//! drawn from.

use nalgebra::{DMatrix, DVector};

use crate::{
    constants::{Matrix6, Vector6},
    ensemble_errors::EnsembleError,
    orbit_state::PerturbedState,
};

/// Component-wise mean of a non-empty set of equally sized vectors.
pub fn empirical_mean(samples: &[DVector<f64>]) -> Result<DVector<f64>, EnsembleError> {
    let first = samples.first().ok_or_else(|| {
        EnsembleError::InvalidParameter("cannot compute the mean of an empty ensemble".into())
    })?;
    check_dimensions(samples, first.len())?;

    let sum = samples
        .iter()
        .fold(DVector::zeros(first.len()), |acc, s| acc + s);
    Ok(sum / samples.len() as f64)
}

/// Unbiased (`n − 1`) sample covariance of at least two equally sized vectors.
pub fn empirical_covariance(samples: &[DVector<f64>]) -> Result<DMatrix<f64>, EnsembleError> {
    if samples.len() < 2 {
        return Err(EnsembleError::InvalidParameter(
            "at least two samples are needed for a covariance".into(),
        ));
    }
    let mean = empirical_mean(samples)?;
    let n = mean.len();

    let scatter = samples.iter().fold(DMatrix::zeros(n, n), |acc, s| {
        let d = s - &mean;
        acc + &d * d.transpose()
    });
    Ok(scatter / (samples.len() - 1) as f64)
}

/// Mean orbital state of an ensemble of perturbed states.
pub fn ensemble_mean(states: &[PerturbedState]) -> Result<Vector6, EnsembleError> {
    let vectors = state_vectors(states)?;
    let mean = empirical_mean(&vectors)?;
    Ok(Vector6::from_column_slice(mean.as_slice()))
}

/// Covariance of the orbital states of an ensemble of perturbed states.
pub fn ensemble_covariance(states: &[PerturbedState]) -> Result<Matrix6, EnsembleError> {
    let vectors = state_vectors(states)?;
    let cov = empirical_covariance(&vectors)?;
    Ok(Matrix6::from_column_slice(cov.as_slice()))
}

fn state_vectors(states: &[PerturbedState]) -> Result<Vec<DVector<f64>>, EnsembleError> {
    states
        .iter()
        .map(|p| {
            p.state
                .state_vector()
                .map(|v| DVector::from_column_slice(v.as_slice()))
        })
        .collect()
}

fn check_dimensions(samples: &[DVector<f64>], dim: usize) -> Result<(), EnsembleError> {
    match samples.iter().find(|s| s.len() != dim) {
        Some(s) => Err(EnsembleError::InvalidParameter(format!(
            "ensemble mixes vectors of length {dim} and {}",
            s.len()
        ))),
        None => Ok(()),
    }
}
