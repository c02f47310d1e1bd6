mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{DMatrix, DVector};
use orbit_ensemble::constants::{Matrix6, Vector6};
use orbit_ensemble::ensemble_errors::EnsembleError;
use orbit_ensemble::sampling::multivariate_normal::MultivariateNormal;
use orbit_ensemble::sampling::{EigenFactorization, SymmetricEigenSolver};
use orbit_ensemble::statistics::{empirical_covariance, empirical_mean};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;

use crate::common::{correlated_covariance, init_tracing};

#[test]
fn equal_sigma_mean_converges() {
    let s = 0.5;
    let mean = DVector::from_vec(vec![3.0, -1.0, 0.25, 10.0, 0.0, -7.5]);
    let cov = DMatrix::from_diagonal_element(6, 6, s * s);
    let normal = MultivariateNormal::with_default_tolerance(mean.clone(), cov).unwrap();

    let n = 100_000;
    let mut rng = StdRng::seed_from_u64(42);
    let samples = normal.sample_n(&mut rng, n);
    let empirical = empirical_mean(&samples).unwrap();

    let tolerance = 5.0 * s / (n as f64).sqrt();
    for i in 0..6 {
        assert_abs_diff_eq!(empirical[i], mean[i], epsilon = tolerance);
    }
}

#[test]
fn state_sampler_reproduces_correlations() {
    let mean = Vector6::new(6778.137, 12.5, -3.2, 0.0021, 7.6686, 0.0183);
    let cov = correlated_covariance();
    let normal = MultivariateNormal::from_state(&mean, &cov, 1e-15).unwrap();

    let mut rng = StdRng::seed_from_u64(1234);
    let samples: Vec<DVector<f64>> = normal.sample_iter(&mut rng).take(200_000).collect();
    let empirical = empirical_covariance(&samples).unwrap();

    for i in 0..6 {
        for j in 0..6 {
            let scale = (cov[(i, i)] * cov[(j, j)]).sqrt();
            assert_abs_diff_eq!(empirical[(i, j)] / scale, cov[(i, j)] / scale, epsilon = 2e-2);
        }
    }
}

#[test]
fn negative_diagonal_is_rejected() {
    init_tracing();
    let mut cov = Matrix6::identity();
    cov[(2, 2)] = -9.0;
    let err = MultivariateNormal::from_state(&Vector6::zeros(), &cov, 1e-12).unwrap_err();
    assert!(matches!(err, EnsembleError::NonPositiveSemiDefinite { .. }));
    assert!(err.to_string().contains("not positive semi-definite"));
}

#[test]
fn transform_is_a_square_root() {
    let normal = MultivariateNormal::from_state(&Vector6::zeros(), &correlated_covariance(), 0.0)
        .unwrap();
    let t = normal.transform();
    let rebuilt = t * t.transpose();
    for i in 0..6 {
        for j in 0..6 {
            let scale = (normal.covariance()[(i, i)] * normal.covariance()[(j, j)]).sqrt();
            assert_abs_diff_eq!(
                rebuilt[(i, j)] / scale,
                normal.covariance()[(i, j)] / scale,
                epsilon = 1e-10
            );
        }
    }
}

/// Solver returning a fixed, slightly negative spectrum.
struct NoisySolver;

impl SymmetricEigenSolver for NoisySolver {
    fn decompose(&self, matrix: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let n = matrix.nrows();
        let mut values = DVector::from_element(n, 1.0);
        values[n - 1] = -1e-16;
        (values, DMatrix::identity(n, n))
    }
}

#[test]
fn injected_solver_is_used() {
    let mean = DVector::zeros(3);
    let cov = DMatrix::identity(3, 3);

    let normal = MultivariateNormal::with_solver(mean.clone(), cov.clone(), 1e-15, &NoisySolver)
        .unwrap();
    assert_eq!(normal.eigenvalues().as_slice(), &[1.0, 1.0, 0.0]);

    // The clamped axis never moves.
    let mut rng = StdRng::seed_from_u64(5);
    assert!(normal.sample_n(&mut rng, 100).iter().all(|x| x[2] == 0.0));

    assert!(MultivariateNormal::with_solver(mean, cov, 1e-17, &NoisySolver).is_err());
}

#[test]
fn factorization_is_shared_by_both_policies() {
    let eigen = EigenFactorization::from_matrix6(&correlated_covariance()).unwrap();
    assert_eq!(eigen.dimension(), 6);
    assert!(eigen.require_non_negative().is_ok());
    assert!(eigen
        .eigenvalues
        .as_slice()
        .windows(2)
        .all(|w| w[0] >= w[1]));

    let trace: f64 = eigen.eigenvalues.iter().sum();
    assert_relative_eq!(trace, correlated_covariance().trace(), max_relative = 1e-12);
}

#[test]
fn non_finite_covariance_is_rejected() {
    init_tracing();
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut cov = correlated_covariance();
        cov[(4, 1)] = bad;
        cov[(1, 4)] = bad;
        let err = MultivariateNormal::from_state(&Vector6::zeros(), &cov, 1e-12).unwrap_err();
        assert!(matches!(err, EnsembleError::InvalidParameter(_)));
        assert!(EigenFactorization::from_matrix6(&cov).is_err());
    }
}

#[test]
fn invalid_tolerance_does_not_hide_negative_eigenvalue() {
    let mut cov = Matrix6::identity();
    cov[(2, 2)] = -9.0;
    for tolerance in [f64::NAN, -1e-12] {
        let err = MultivariateNormal::from_state(&Vector6::zeros(), &cov, tolerance).unwrap_err();
        assert!(matches!(err, EnsembleError::InvalidParameter(_)));
    }
}
