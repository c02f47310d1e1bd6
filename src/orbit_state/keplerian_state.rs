//! # Keplerian states and their uncertainty
//!
//! A Keplerian state is described by `(a, e, i, Ω, ω, ν|M)`: five shared elements
//! plus **one** anomaly, either mean or true. The two anomalies are mutually
//! exclusive, in the state as well as in its sigma and covariance.
//!
//! The anomaly kind is carried by [`Anomaly`]. When building from raw fields
//! (where both anomalies exist as plain numbers and the unused one is zero),
//! [`Anomaly::from_raw`] decides which one is set using [`ANOMALY_EPS`].
//!
//! ## Units
//!
//! - Semi-major axis: **km**
//! - Angles: **degrees**
//!
//! ## Covariance layout
//!
//! [`KeplerianCovariance`] stores the 15 lower-triangular entries of rows `0..5`
//! (`a, e, i, Ω, ω`), then two candidate last rows: one for the mean anomaly and
//! one for the true anomaly. Only one of them is expected to be populated; the
//! active one is derived from the `[5][5]` entry of the mean-anomaly row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{Degree, Kilometer, Vector6, ANOMALY_EPS, KEPLERIAN_COMMON_LEN, STATE_DIM},
    ensemble_errors::EnsembleError,
};

/// Which anomaly parameterizes the position along the orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    Mean,
    True,
}

impl AnomalyKind {
    /// Derive the anomaly kind from a mean-anomaly value: set iff `|mean| > ANOMALY_EPS`.
    pub fn from_mean_value(mean: f64) -> Self {
        if mean.abs() > ANOMALY_EPS {
            AnomalyKind::Mean
        } else {
            AnomalyKind::True
        }
    }

    pub fn is_mean(&self) -> bool {
        matches!(self, AnomalyKind::Mean)
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::Mean => write!(f, "mean anomaly"),
            AnomalyKind::True => write!(f, "true anomaly"),
        }
    }
}

/// An anomaly value tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anomaly {
    Mean(f64),
    True(f64),
}

impl Anomaly {
    /// Build an anomaly from the two raw, mutually exclusive fields.
    ///
    /// The mean anomaly wins when its magnitude exceeds [`ANOMALY_EPS`];
    /// otherwise the value is read as a true anomaly.
    pub fn from_raw(mean_anomaly: f64, true_anomaly: f64) -> Self {
        match AnomalyKind::from_mean_value(mean_anomaly) {
            AnomalyKind::Mean => Anomaly::Mean(mean_anomaly),
            AnomalyKind::True => Anomaly::True(true_anomaly),
        }
    }

    pub fn new(kind: AnomalyKind, value: f64) -> Self {
        match kind {
            AnomalyKind::Mean => Anomaly::Mean(value),
            AnomalyKind::True => Anomaly::True(value),
        }
    }

    pub fn kind(&self) -> AnomalyKind {
        match self {
            Anomaly::Mean(_) => AnomalyKind::Mean,
            Anomaly::True(_) => AnomalyKind::True,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Anomaly::Mean(v) | Anomaly::True(v) => *v,
        }
    }
}

/// Osculating Keplerian elements of the nominal state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerianState {
    pub semi_major_axis: Kilometer,
    pub eccentricity: f64,
    pub inclination: Degree,
    pub ra_of_asc_node: Degree,
    pub arg_of_pericenter: Degree,
    pub anomaly: Anomaly,
}

impl KeplerianState {
    /// Pack the elements as `[a, e, i, Ω, ω, anomaly]`.
    pub fn to_vector(&self) -> Vector6 {
        Vector6::new(
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ra_of_asc_node,
            self.arg_of_pericenter,
            self.anomaly.value(),
        )
    }

    /// Unpack `[a, e, i, Ω, ω, anomaly]`, keeping the given anomaly kind.
    pub fn from_vector(v: &Vector6, kind: AnomalyKind) -> Self {
        KeplerianState {
            semi_major_axis: v[0],
            eccentricity: v[1],
            inclination: v[2],
            ra_of_asc_node: v[3],
            arg_of_pericenter: v[4],
            anomaly: Anomaly::new(kind, v[5]),
        }
    }

    pub fn anomaly_kind(&self) -> AnomalyKind {
        self.anomaly.kind()
    }
}

/// Per-element 1-σ uncertainties of a Keplerian state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerianSigma {
    pub semi_major_axis: Kilometer,
    pub eccentricity: f64,
    pub inclination: Degree,
    pub ra_of_asc_node: Degree,
    pub arg_of_pericenter: Degree,
    pub anomaly: Anomaly,
}

impl KeplerianSigma {
    pub fn to_vector(&self) -> Vector6 {
        Vector6::new(
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ra_of_asc_node,
            self.arg_of_pericenter,
            self.anomaly.value(),
        )
    }
}

/// Packed Keplerian covariance with its two mutually exclusive anomaly rows.
///
/// * `common` – lower triangle of rows `0..5`, row-major (`(0,0), (1,0), (1,1), (2,0), …`).
/// * `mean_anomaly_row` – row 5 when the anomaly is a mean anomaly (`(5,0) … (5,5)`).
/// * `true_anomaly_row` – row 5 when the anomaly is a true anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerianCovariance {
    pub common: [f64; KEPLERIAN_COMMON_LEN],
    pub mean_anomaly_row: [f64; STATE_DIM],
    pub true_anomaly_row: [f64; STATE_DIM],
}

impl KeplerianCovariance {
    /// Whether the mean-anomaly variance is set beyond [`ANOMALY_EPS`].
    pub fn has_mean_anomaly(&self) -> bool {
        AnomalyKind::from_mean_value(self.mean_anomaly_row[STATE_DIM - 1]).is_mean()
    }

    pub fn anomaly_kind(&self) -> AnomalyKind {
        if self.has_mean_anomaly() {
            AnomalyKind::Mean
        } else {
            AnomalyKind::True
        }
    }

    /// The active anomaly row, after checking it against the expected anomaly kind.
    ///
    /// Errors
    /// ------
    /// * [`EnsembleError::AnomalyMismatch`] when the covariance anomaly disagrees with `expected`.
    pub fn anomaly_row(&self, expected: AnomalyKind) -> Result<&[f64; STATE_DIM], EnsembleError> {
        let actual = self.anomaly_kind();
        if actual != expected {
            return Err(EnsembleError::AnomalyMismatch {
                uncertainty: actual,
                state: expected,
            });
        }
        Ok(match actual {
            AnomalyKind::Mean => &self.mean_anomaly_row,
            AnomalyKind::True => &self.true_anomaly_row,
        })
    }
}
