//! # Covariance assembly
//!
//! Build dense, symmetric 6×6 covariance matrices from their packed
//! lower-triangular form, and the reverse direction for per-axis sigmas.
//!
//! ## Packed layout
//!
//! Entries are stored row-major over the lower triangle, diagonal included:
//!
//! ```text
//! k :  0      1     2     3     4     5    …   20
//!     (0,0) (1,0) (1,1) (2,0) (2,1) (2,2)  …  (5,5)
//! ```
//!
//! so that `(row, col)` with `col ≤ row` lives at `row·(row+1)/2 + col`. The
//! upper triangle is never stored: it is always filled by symmetry.
//!
//! ## Keplerian covariances
//!
//! A Keplerian covariance carries two candidate anomaly rows (mean and true).
//! [`assemble_keplerian_covariance`] picks the active one and refuses to pair a
//! mean-anomaly covariance with a true-anomaly state (or vice versa).
//!
//! ## Unit normalization
//!
//! Keplerian covariances mix a semi-major axis in km (~10⁴–10⁸) with angles in
//! degrees. [`scale_axis`] rescales one axis of a mean/covariance pair so that
//! the eigendecomposition works on comparable magnitudes.

use crate::{
    constants::{Matrix6, Vector6, KEPLERIAN_COMMON_LEN, LOWER_TRIANGLE_LEN, STATE_DIM},
    ensemble_errors::EnsembleError,
    orbit_state::{
        keplerian_state::{AnomalyKind, KeplerianCovariance},
        OrbitMessage, StateKind,
    },
};

/// Index of `(row, col)`, `col ≤ row`, in a packed lower triangle.
#[inline]
pub fn lower_triangle_index(row: usize, col: usize) -> usize {
    debug_assert!(col <= row);
    row * (row + 1) / 2 + col
}

/// Fill a symmetric 6×6 matrix from its 21 packed lower-triangular entries.
pub fn symmetric_from_lower_triangle(entries: &[f64; LOWER_TRIANGLE_LEN]) -> Matrix6 {
    Matrix6::from_fn(|row, col| {
        if col <= row {
            entries[lower_triangle_index(row, col)]
        } else {
            entries[lower_triangle_index(col, row)]
        }
    })
}

/// Pack the lower triangle of `matrix`, row-major. The upper triangle is ignored.
pub fn pack_lower_triangle(matrix: &Matrix6) -> [f64; LOWER_TRIANGLE_LEN] {
    let mut entries = [0.0; LOWER_TRIANGLE_LEN];
    for row in 0..STATE_DIM {
        for col in 0..=row {
            entries[lower_triangle_index(row, col)] = matrix[(row, col)];
        }
    }
    entries
}

/// Assemble a Cartesian covariance from its packed lower triangle.
pub fn assemble_cartesian_covariance(entries: &[f64; LOWER_TRIANGLE_LEN]) -> Matrix6 {
    symmetric_from_lower_triangle(entries)
}

/// Assemble a Keplerian covariance, selecting the anomaly row.
///
/// Arguments
/// ---------
/// * `covariance` – packed covariance with its mean and true anomaly rows.
/// * `expect_mean_anomaly` – whether the paired state uses a mean anomaly.
///
/// Errors
/// ------
/// * [`EnsembleError::AnomalyMismatch`] if the covariance's own anomaly
///   (derived from its mean-anomaly variance) disagrees with `expect_mean_anomaly`.
pub fn assemble_keplerian_covariance(
    covariance: &KeplerianCovariance,
    expect_mean_anomaly: bool,
) -> Result<Matrix6, EnsembleError> {
    let expected = if expect_mean_anomaly {
        AnomalyKind::Mean
    } else {
        AnomalyKind::True
    };
    let anomaly_row = covariance.anomaly_row(expected)?;

    let mut entries = [0.0; LOWER_TRIANGLE_LEN];
    entries[..KEPLERIAN_COMMON_LEN].copy_from_slice(&covariance.common);
    entries[KEPLERIAN_COMMON_LEN..].copy_from_slice(anomaly_row);

    Ok(symmetric_from_lower_triangle(&entries))
}

/// Diagonal covariance with `covariance[i][i] = sigma[i]²`.
pub fn diagonal_from_sigma(sigma: &Vector6) -> Matrix6 {
    Matrix6::from_diagonal(&sigma.component_mul(sigma))
}

/// Extract the six orbital fields of the message's active representation.
pub fn extract_state_vector(message: &OrbitMessage) -> Result<Vector6, EnsembleError> {
    match (message.state_kind()?, &message.cartesian, &message.keplerian) {
        (StateKind::Cartesian, Some(cart), _) => Ok(cart.to_vector()),
        (StateKind::Keplerian(_), _, Some(kep)) => Ok(kep.to_vector()),
        _ => Err(EnsembleError::MissingStateVector),
    }
}

/// Whether `matrix[i][j] == matrix[j][i]` holds exactly for all entries.
pub fn is_symmetric(matrix: &Matrix6) -> bool {
    (0..STATE_DIM).all(|i| (0..i).all(|j| matrix[(i, j)] == matrix[(j, i)]))
}

/// Divide axis `axis` of a mean/covariance pair by `factor`.
///
/// The mean component is divided by `factor`, the covariance row and column by
/// `factor` (so the variance is divided by `factor²`).
pub fn scale_axis(mean: &mut Vector6, covariance: &mut Matrix6, axis: usize, factor: f64) {
    mean[axis] /= factor;
    for k in 0..STATE_DIM {
        covariance[(axis, k)] /= factor;
        covariance[(k, axis)] /= factor;
    }
}
