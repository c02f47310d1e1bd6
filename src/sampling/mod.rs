//! # Eigen-factorization of covariance matrices
//!
//! Both ensemble generators work along the principal axes of the covariance:
//!
//! - the [`multivariate_normal::MultivariateNormal`] sampler maps standard-normal
//!   noise through `T = V · diag(√λ)`,
//! - the [`crate::hypercube`] generator steps `±σ·√λᵢ` along each eigenvector `vᵢ`.
//!
//! This module computes the shared [`EigenFactorization`] and validates its
//! eigenvalues. Real covariances are only *numerically* positive semi-definite, so
//! two policies are offered:
//!
//! - [`EigenFactorization::clamp_negative`] – eigenvalues in `[-tolerance, 0)` are
//!   noise and are clamped to `0`; anything more negative is rejected,
//! - [`EigenFactorization::require_non_negative`] – any negative eigenvalue is rejected.
//!
//! The eigensolver itself sits behind the [`SymmetricEigenSolver`] trait;
//! [`NalgebraEigenSolver`] is the default implementation.

use std::cmp::Ordering::{Equal, Greater};

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::{constants::Matrix6, ensemble_errors::EnsembleError};

/// Multivariate normal sampling through the eigendecomposition of the covariance.
pub mod multivariate_normal;

/// A symmetric eigensolver for dense real matrices.
pub trait SymmetricEigenSolver {
    /// Return `(eigenvalues, eigenvectors)`, eigenvector `i` being column `i`.
    ///
    /// Only the lower triangle of `matrix` needs to be read.
    fn decompose(&self, matrix: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>);
}

/// Symmetric eigensolver backed by [`nalgebra::SymmetricEigen`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraEigenSolver;

impl SymmetricEigenSolver for NalgebraEigenSolver {
    fn decompose(&self, matrix: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let eigen = SymmetricEigen::new(matrix.clone());
        (eigen.eigenvalues, eigen.eigenvectors)
    }
}

/// Eigenvalues and orthonormal eigenvectors of a symmetric matrix, sorted by
/// decreasing eigenvalue.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenFactorization {
    pub eigenvalues: DVector<f64>,
    /// Column `i` is the eigenvector of `eigenvalues[i]`.
    pub eigenvectors: DMatrix<f64>,
}

impl EigenFactorization {
    /// Factorize `matrix` with the default nalgebra solver.
    pub fn new(matrix: &DMatrix<f64>) -> Result<Self, EnsembleError> {
        Self::with_solver(matrix, &NalgebraEigenSolver)
    }

    /// Factorize `matrix` with an injected solver.
    ///
    /// Errors
    /// ------
    /// * [`EnsembleError::InvalidParameter`] if `matrix` has a NaN or infinite entry.
    pub fn with_solver<S: SymmetricEigenSolver + ?Sized>(
        matrix: &DMatrix<f64>,
        solver: &S,
    ) -> Result<Self, EnsembleError> {
        check_finite(matrix)?;
        let (values, vectors) = solver.decompose(matrix);

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

        let eigenvalues = DVector::from_iterator(values.len(), order.iter().map(|&i| values[i]));
        let eigenvectors =
            DMatrix::from_fn(vectors.nrows(), order.len(), |row, col| vectors[(row, order[col])]);

        Ok(EigenFactorization {
            eigenvalues,
            eigenvectors,
        })
    }

    /// Factorize a 6×6 covariance with the default nalgebra solver.
    pub fn from_matrix6(matrix: &Matrix6) -> Result<Self, EnsembleError> {
        Self::new(&to_dynamic(matrix))
    }

    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Clamp eigenvalues within `tolerance` below zero to exactly zero.
    ///
    /// Errors
    /// ------
    /// * [`EnsembleError::InvalidParameter`] if `tolerance` is negative or not finite.
    /// * [`EnsembleError::NonPositiveSemiDefinite`] for the first eigenvalue below
    ///   `-tolerance`, or a NaN eigenvalue.
    pub fn clamp_negative(&mut self, tolerance: f64) -> Result<(), EnsembleError> {
        check_tolerance(tolerance)?;
        for (index, value) in self.eigenvalues.iter_mut().enumerate() {
            if !ge0(*value) {
                if value.is_nan() || -*value > tolerance {
                    return Err(EnsembleError::NonPositiveSemiDefinite {
                        index,
                        eigenvalue: *value,
                        tolerance,
                    });
                }
                tracing::debug!(index, eigenvalue = *value, "clamping eigenvalue to zero");
                *value = 0.0;
            }
        }
        Ok(())
    }

    /// Reject any negative (or NaN) eigenvalue, without tolerance.
    pub fn require_non_negative(&self) -> Result<(), EnsembleError> {
        match self.eigenvalues.iter().position(|&value| !ge0(value)) {
            Some(index) => Err(EnsembleError::NonPositiveSemiDefinite {
                index,
                eigenvalue: self.eigenvalues[index],
                tolerance: 0.0,
            }),
            None => Ok(()),
        }
    }

    /// `V · diag(√λ)`: each eigenvector scaled by the square root of its eigenvalue.
    ///
    /// Eigenvalues must already be non-negative (see [`Self::clamp_negative`]).
    pub fn scaled_axes(&self) -> DMatrix<f64> {
        let mut axes = self.eigenvectors.clone();
        for (mut column, value) in axes.column_iter_mut().zip(self.eigenvalues.iter()) {
            column *= value.sqrt();
        }
        axes
    }
}

/// Return true iff x >= 0.0 and comparable (i.e., not NaN).
#[inline]
fn ge0(x: f64) -> bool {
    matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
}

/// Check a singular-matrix tolerance: finite and `>= 0`.
pub fn check_tolerance(tolerance: f64) -> Result<(), EnsembleError> {
    if !ge0(tolerance) || !tolerance.is_finite() {
        return Err(EnsembleError::InvalidParameter(format!(
            "singular_matrix_tolerance must be a finite value >= 0, got {tolerance}"
        )));
    }
    Ok(())
}

/// Reject matrices with NaN or infinite entries.
pub fn check_finite(matrix: &DMatrix<f64>) -> Result<(), EnsembleError> {
    match matrix.iter().position(|v| !v.is_finite()) {
        Some(k) => Err(EnsembleError::InvalidParameter(format!(
            "covariance contains a non-finite entry at ({}, {})",
            k % matrix.nrows(),
            k / matrix.nrows()
        ))),
        None => Ok(()),
    }
}

/// Copy a 6×6 matrix into a dynamically sized one.
pub fn to_dynamic(matrix: &Matrix6) -> DMatrix<f64> {
    DMatrix::from_column_slice(matrix.nrows(), matrix.ncols(), matrix.as_slice())
}
