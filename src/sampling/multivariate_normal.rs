//! # Multivariate normal sampler
//!
//! [`MultivariateNormal`] draws vectors from `N(μ, Σ)` using the
//! eigendecomposition `Σ = V Λ Vᵀ`:
//!
//! ```text
//! T = V · diag(√λ)          (so that T·Tᵀ = Σ)
//! x = μ + T·z,   z ~ N(0, I)
//! ```
//!
//! The eigendecomposition tolerates the small negative eigenvalues that
//! accumulate in real covariance matrices: eigenvalues in `[-tolerance, 0)` are
//! clamped to zero, while anything more negative is rejected at construction.
//! Once constructed, sampling cannot fail.
//!
//! The sampler holds no random generator: it implements
//! [`rand_distr::Distribution`], so callers pass their own (seedable) generator
//! to every draw and a single sampler can be shared read-only across threads.
//!
//! ## Example
//!
//! ```rust
//! use nalgebra::{DMatrix, DVector};
//! use rand::{rngs::StdRng, SeedableRng};
//! use rand_distr::Distribution;
//! use orbit_ensemble::sampling::multivariate_normal::MultivariateNormal;
//!
//! let mean = DVector::from_vec(vec![-1.5, 2.0]);
//! let cov = DMatrix::from_row_slice(2, 2, &[2.0, -1.1, -1.1, 2.0]);
//! let normal = MultivariateNormal::new(mean, cov, 1e-12).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let x = normal.sample(&mut rng);
//! assert_eq!(x.len(), 2);
//! ```

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::{
    constants::{Matrix6, Vector6, DEFAULT_SAMPLER_TOLERANCE},
    ensemble_errors::EnsembleError,
    sampling::{
        check_tolerance, to_dynamic, EigenFactorization, NalgebraEigenSolver,
        SymmetricEigenSolver,
    },
};

/// Multivariate normal distribution `N(mean, covariance)`, sampling only.
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    factorization: EigenFactorization,
    transform: DMatrix<f64>,
}

impl MultivariateNormal {
    /// Build a sampler with the default nalgebra eigensolver.
    ///
    /// Arguments
    /// ---------
    /// * `mean` – mean vector of length `n`.
    /// * `covariance` – symmetric `n×n` covariance (only its lower triangle is read).
    /// * `singular_matrix_tolerance` – eigenvalues in `[-tolerance, 0)` are clamped to zero.
    ///
    /// Errors
    /// ------
    /// * [`EnsembleError::DimensionMismatch`] if `mean` and `covariance` disagree or
    ///   `covariance` is not square.
    /// * [`EnsembleError::InvalidParameter`] if the covariance has non-finite entries, or
    ///   the tolerance is negative or not finite.
    /// * [`EnsembleError::NonPositiveSemiDefinite`] if an eigenvalue lies below `-tolerance`.
    pub fn new(
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
        singular_matrix_tolerance: f64,
    ) -> Result<Self, EnsembleError> {
        Self::with_solver(
            mean,
            covariance,
            singular_matrix_tolerance,
            &NalgebraEigenSolver,
        )
    }

    /// Build a sampler with [`DEFAULT_SAMPLER_TOLERANCE`].
    pub fn with_default_tolerance(
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
    ) -> Result<Self, EnsembleError> {
        Self::new(mean, covariance, DEFAULT_SAMPLER_TOLERANCE)
    }

    /// Build a sampler for a six-dimensional orbital state.
    pub fn from_state(
        mean: &Vector6,
        covariance: &Matrix6,
        singular_matrix_tolerance: f64,
    ) -> Result<Self, EnsembleError> {
        Self::new(
            DVector::from_column_slice(mean.as_slice()),
            to_dynamic(covariance),
            singular_matrix_tolerance,
        )
    }

    /// Build a sampler with an injected eigensolver.
    pub fn with_solver<S: SymmetricEigenSolver + ?Sized>(
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
        singular_matrix_tolerance: f64,
        solver: &S,
    ) -> Result<Self, EnsembleError> {
        if mean.len() != covariance.nrows() || covariance.nrows() != covariance.ncols() {
            return Err(EnsembleError::DimensionMismatch {
                mean: mean.len(),
                rows: covariance.nrows(),
                cols: covariance.ncols(),
            });
        }
        check_tolerance(singular_matrix_tolerance)?;

        let mut factorization = EigenFactorization::with_solver(&covariance, solver)?;
        if let Err(err) = factorization.clamp_negative(singular_matrix_tolerance) {
            tracing::error!("{err}; rejected covariance:{covariance}");
            return Err(err);
        }
        let transform = factorization.scaled_axes();

        Ok(MultivariateNormal {
            mean,
            covariance,
            factorization,
            transform,
        })
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Eigenvalues after clamping, in decreasing order.
    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.factorization.eigenvalues
    }

    /// The sampling transform `T = V · diag(√λ)`.
    pub fn transform(&self) -> &DMatrix<f64> {
        &self.transform
    }

    /// Draw `n` independent vectors.
    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<DVector<f64>> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Density evaluation is not supported: this distribution only samples.
    pub fn density(&self, _x: &DVector<f64>) -> Result<f64, EnsembleError> {
        Err(EnsembleError::UnsupportedOperation(
            "density evaluation of a multivariate normal sampler",
        ))
    }
}

impl Distribution<DVector<f64>> for MultivariateNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVector<f64> {
        let z: DVector<f64> =
            DVector::from_fn(self.dimension(), |_, _| rng.sample(StandardNormal));
        &self.mean + &self.transform * z
    }
}
