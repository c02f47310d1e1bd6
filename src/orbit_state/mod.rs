//! # Orbital states with uncertainty
//!
//! This module defines the value objects exchanged with the surrounding
//! message-parsing and propagation layers:
//!
//! - [`OrbitMessage`] – a nominal orbital state plus its uncertainty, metadata and
//!   user-defined side-channel fields,
//! - [`PerturbedState`] – one member of a generated ensemble, with a provenance string.
//!
//! An [`OrbitMessage`] carries its state as either Cartesian
//! ([`cartesian_state::CartesianState`]) or Keplerian
//! ([`keplerian_state::KeplerianState`]) elements. Exactly one must be present;
//! [`OrbitMessage::state_kind`] is the single place where this is checked, and
//! every generator goes through it.
//!
//! ## Uncertainty sources
//!
//! Each representation may carry a per-axis sigma, a full covariance, or both.
//! [`OrbitMessage::uncertainty`] selects the source matching the state
//! representation, preferring the covariance when both are present.
//!
//! ## Ownership
//!
//! The nominal message is never modified. Generators clone it and overwrite only
//! the orbital fields through [`OrbitMessage::set_state_vector`].

use std::{collections::BTreeMap, fmt};

use hifitime::Epoch;

use crate::{
    constants::{Matrix6, Vector6},
    covariance::{
        assemble_cartesian_covariance, assemble_keplerian_covariance, diagonal_from_sigma,
    },
    ensemble_errors::EnsembleError,
    orbit_state::{
        cartesian_state::{CartesianCovariance, CartesianSigma, CartesianState},
        keplerian_state::{AnomalyKind, KeplerianCovariance, KeplerianSigma, KeplerianState},
    },
};

/// Cartesian position/velocity states and their uncertainty.
pub mod cartesian_state;

/// Keplerian element states, the mean/true anomaly duality and their uncertainty.
pub mod keplerian_state;

/// Which representation carries the nominal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Cartesian,
    Keplerian(AnomalyKind),
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Cartesian => write!(f, "Cartesian"),
            StateKind::Keplerian(kind) => write!(f, "Keplerian ({kind})"),
        }
    }
}

/// Physical properties of the spacecraft, copied unchanged into every perturbed state.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpacecraftParameters {
    pub mass: f64,
    pub solar_rad_area: f64,
    pub solar_rad_coeff: f64,
    pub drag_area: f64,
    pub drag_coeff: f64,
}

/// A nominal orbital state plus its uncertainty and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitMessage {
    pub object_name: String,
    pub object_id: String,
    pub center_name: String,
    pub ref_frame: String,
    pub epoch: Epoch,
    pub comments: Vec<String>,
    pub spacecraft: Option<SpacecraftParameters>,
    pub gm: Option<f64>,

    pub cartesian: Option<CartesianState>,
    pub keplerian: Option<KeplerianState>,

    pub cartesian_sigma: Option<CartesianSigma>,
    pub cartesian_covariance: Option<CartesianCovariance>,
    pub keplerian_sigma: Option<KeplerianSigma>,
    pub keplerian_covariance: Option<KeplerianCovariance>,

    /// Free-form `KEY = value` parameters (the hypercube request travels here).
    pub user_defined: BTreeMap<String, String>,
}

impl OrbitMessage {
    /// Create an empty message for the given object and epoch.
    ///
    /// The centre defaults to `EARTH` and the frame to `EME2000`; no state and no
    /// uncertainty are set.
    pub fn new(object_name: impl Into<String>, object_id: impl Into<String>, epoch: Epoch) -> Self {
        OrbitMessage {
            object_name: object_name.into(),
            object_id: object_id.into(),
            center_name: "EARTH".into(),
            ref_frame: "EME2000".into(),
            epoch,
            comments: Vec::new(),
            spacecraft: None,
            gm: None,
            cartesian: None,
            keplerian: None,
            cartesian_sigma: None,
            cartesian_covariance: None,
            keplerian_sigma: None,
            keplerian_covariance: None,
            user_defined: BTreeMap::new(),
        }
    }

    /// Validate that exactly one state representation is present and report which.
    ///
    /// Errors
    /// ------
    /// * [`EnsembleError::MissingStateVector`] if neither representation is set.
    /// * [`EnsembleError::AmbiguousStateVector`] if both are set.
    pub fn state_kind(&self) -> Result<StateKind, EnsembleError> {
        match (&self.cartesian, &self.keplerian) {
            (Some(_), None) => Ok(StateKind::Cartesian),
            (None, Some(kep)) => Ok(StateKind::Keplerian(kep.anomaly_kind())),
            (None, None) => Err(EnsembleError::MissingStateVector),
            (Some(_), Some(_)) => Err(EnsembleError::AmbiguousStateVector),
        }
    }

    /// Select the uncertainty source matching `kind`.
    ///
    /// A covariance takes precedence over a sigma. For Keplerian states, a sigma's
    /// anomaly must match the state's anomaly; a covariance is checked when it is
    /// assembled.
    pub fn uncertainty(&self, kind: StateKind) -> Result<Uncertainty<'_>, EnsembleError> {
        match kind {
            StateKind::Cartesian => match (&self.cartesian_covariance, &self.cartesian_sigma) {
                (Some(cov), _) => Ok(Uncertainty::CartesianCovariance(cov)),
                (None, Some(sigma)) => Ok(Uncertainty::CartesianSigma(sigma)),
                (None, None) => Err(EnsembleError::MissingUncertainty(kind)),
            },
            StateKind::Keplerian(anomaly) => {
                match (&self.keplerian_covariance, &self.keplerian_sigma) {
                    (Some(cov), _) => Ok(Uncertainty::KeplerianCovariance(cov)),
                    (None, Some(sigma)) => {
                        if sigma.anomaly.kind() != anomaly {
                            return Err(EnsembleError::AnomalyMismatch {
                                uncertainty: sigma.anomaly.kind(),
                                state: anomaly,
                            });
                        }
                        Ok(Uncertainty::KeplerianSigma(sigma))
                    }
                    (None, None) => Err(EnsembleError::MissingUncertainty(kind)),
                }
            }
        }
    }

    /// The orbital fields of the active representation as a six-vector.
    pub fn state_vector(&self) -> Result<Vector6, EnsembleError> {
        crate::covariance::extract_state_vector(self)
    }

    /// Overwrite the orbital fields of representation `kind`; every other field is left untouched.
    pub fn set_state_vector(&mut self, kind: StateKind, v: &Vector6) {
        match kind {
            StateKind::Cartesian => self.cartesian = Some(CartesianState::from_vector(v)),
            StateKind::Keplerian(anomaly) => {
                self.keplerian = Some(KeplerianState::from_vector(v, anomaly))
            }
        }
    }

    /// Look up a user-defined parameter.
    pub fn user_defined(&self, key: &str) -> Option<&str> {
        self.user_defined.get(key).map(String::as_str)
    }
}

/// The uncertainty attached to a state, in whichever form it was supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uncertainty<'a> {
    CartesianSigma(&'a CartesianSigma),
    CartesianCovariance(&'a CartesianCovariance),
    KeplerianSigma(&'a KeplerianSigma),
    KeplerianCovariance(&'a KeplerianCovariance),
}

impl Uncertainty<'_> {
    /// Dense symmetric 6×6 covariance, converting sigmas to a diagonal matrix.
    ///
    /// `kind` is the representation of the paired state; a Keplerian covariance
    /// is checked against the state's anomaly kind.
    ///
    /// Errors
    /// ------
    /// * [`EnsembleError::MissingUncertainty`] if the uncertainty does not belong to `kind`.
    /// * [`EnsembleError::AnomalyMismatch`] if a Keplerian sigma or covariance uses the
    ///   other anomaly.
    pub fn covariance_matrix(&self, kind: StateKind) -> Result<Matrix6, EnsembleError> {
        match (self, kind) {
            (Uncertainty::CartesianSigma(sigma), StateKind::Cartesian) => {
                Ok(diagonal_from_sigma(&sigma.to_vector()))
            }
            (Uncertainty::CartesianCovariance(cov), StateKind::Cartesian) => {
                Ok(assemble_cartesian_covariance(&cov.lower_triangle))
            }
            (Uncertainty::KeplerianSigma(sigma), StateKind::Keplerian(anomaly)) => {
                // The sigma's anomaly is tagged, so no row is derived from its value.
                if sigma.anomaly.kind() != anomaly {
                    return Err(EnsembleError::AnomalyMismatch {
                        uncertainty: sigma.anomaly.kind(),
                        state: anomaly,
                    });
                }
                Ok(diagonal_from_sigma(&sigma.to_vector()))
            }
            (Uncertainty::KeplerianCovariance(cov), StateKind::Keplerian(anomaly)) => {
                assemble_keplerian_covariance(cov, anomaly.is_mean())
            }
            _ => Err(EnsembleError::MissingUncertainty(kind)),
        }
    }
}

/// One member of a generated ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedState {
    /// A fresh copy of the nominal message with perturbed orbital fields.
    pub state: OrbitMessage,
    /// Human-readable description of how this member was produced.
    pub provenance: String,
}

impl fmt::Display for PerturbedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.state.object_name, self.provenance)
    }
}

#[cfg(test)]
mod orbit_state_test {
    use super::*;
    use crate::constants::LOWER_TRIANGLE_LEN;
    use crate::orbit_state::keplerian_state::Anomaly;

    fn cartesian_state() -> CartesianState {
        CartesianState {
            x: 7000.0,
            y: 0.0,
            z: 0.0,
            x_dot: 0.0,
            y_dot: 7.5,
            z_dot: 0.0,
        }
    }

    fn keplerian_state(anomaly: Anomaly) -> KeplerianState {
        KeplerianState {
            semi_major_axis: 7000.0,
            eccentricity: 0.001,
            inclination: 98.0,
            ra_of_asc_node: 12.0,
            arg_of_pericenter: 34.0,
            anomaly,
        }
    }

    fn message() -> OrbitMessage {
        OrbitMessage::new(
            "SAT",
            "2020-001A",
            Epoch::from_gregorian_utc_at_midnight(2021, 1, 31),
        )
    }

    #[test]
    fn state_kind_requires_exactly_one_representation() {
        let mut msg = message();
        assert_eq!(msg.state_kind(), Err(EnsembleError::MissingStateVector));

        msg.cartesian = Some(cartesian_state());
        assert_eq!(msg.state_kind(), Ok(StateKind::Cartesian));

        msg.keplerian = Some(keplerian_state(Anomaly::Mean(5.0)));
        assert_eq!(msg.state_kind(), Err(EnsembleError::AmbiguousStateVector));

        msg.cartesian = None;
        assert_eq!(
            msg.state_kind(),
            Ok(StateKind::Keplerian(AnomalyKind::Mean))
        );
    }

    #[test]
    fn covariance_wins_over_sigma() {
        let mut msg = message();
        msg.cartesian = Some(cartesian_state());
        msg.cartesian_sigma = Some(CartesianSigma {
            x: 1.0,
            y: 1.0,
            z: 1.0,
            x_dot: 1.0,
            y_dot: 1.0,
            z_dot: 1.0,
        });
        assert!(matches!(
            msg.uncertainty(StateKind::Cartesian),
            Ok(Uncertainty::CartesianSigma(_))
        ));

        msg.cartesian_covariance = Some(CartesianCovariance::new([0.0; LOWER_TRIANGLE_LEN]));
        assert!(matches!(
            msg.uncertainty(StateKind::Cartesian),
            Ok(Uncertainty::CartesianCovariance(_))
        ));
    }

    #[test]
    fn sigma_becomes_diagonal_covariance() {
        let mut msg = message();
        msg.cartesian = Some(cartesian_state());
        msg.cartesian_sigma = Some(CartesianSigma {
            x: 2.0,
            y: 2.0,
            z: 2.0,
            x_dot: 0.5,
            y_dot: 0.5,
            z_dot: 0.5,
        });
        let kind = msg.state_kind().unwrap();
        let cov = msg.uncertainty(kind).unwrap().covariance_matrix(kind).unwrap();
        assert_eq!(cov[(0, 0)], 4.0);
        assert_eq!(cov[(5, 5)], 0.25);
        assert_eq!(cov[(1, 0)], 0.0);

        let keplerian = StateKind::Keplerian(AnomalyKind::Mean);
        assert_eq!(
            msg.uncertainty(kind).unwrap().covariance_matrix(keplerian),
            Err(EnsembleError::MissingUncertainty(keplerian))
        );
    }

    #[test]
    fn uncertainty_must_match_representation() {
        let mut msg = message();
        msg.keplerian = Some(keplerian_state(Anomaly::True(5.0)));
        msg.cartesian_sigma = Some(CartesianSigma {
            x: 1.0,
            y: 1.0,
            z: 1.0,
            x_dot: 1.0,
            y_dot: 1.0,
            z_dot: 1.0,
        });
        let kind = msg.state_kind().unwrap();
        assert_eq!(
            msg.uncertainty(kind),
            Err(EnsembleError::MissingUncertainty(StateKind::Keplerian(
                AnomalyKind::True
            )))
        );
    }

    #[test]
    fn keplerian_sigma_anomaly_must_match_state() {
        let mut msg = message();
        msg.keplerian = Some(keplerian_state(Anomaly::True(5.0)));
        msg.keplerian_sigma = Some(KeplerianSigma {
            semi_major_axis: 1.0,
            eccentricity: 1e-5,
            inclination: 0.01,
            ra_of_asc_node: 0.01,
            arg_of_pericenter: 0.01,
            anomaly: Anomaly::Mean(0.01),
        });
        let kind = msg.state_kind().unwrap();
        assert_eq!(
            msg.uncertainty(kind),
            Err(EnsembleError::AnomalyMismatch {
                uncertainty: AnomalyKind::Mean,
                state: AnomalyKind::True,
            })
        );
    }

    #[test]
    fn zero_anomaly_sigma_keeps_its_tag() {
        let mut msg = message();
        msg.keplerian = Some(keplerian_state(Anomaly::Mean(5.0)));
        msg.keplerian_sigma = Some(KeplerianSigma {
            semi_major_axis: 1.0,
            eccentricity: 1e-5,
            inclination: 0.01,
            ra_of_asc_node: 0.01,
            arg_of_pericenter: 0.01,
            anomaly: Anomaly::Mean(0.0),
        });
        let kind = msg.state_kind().unwrap();
        let cov = msg.uncertainty(kind).unwrap().covariance_matrix(kind).unwrap();
        assert_eq!(cov[(0, 0)], 1.0);
        assert_eq!(cov[(5, 5)], 0.0);

        let true_kind = StateKind::Keplerian(AnomalyKind::True);
        assert_eq!(
            msg.uncertainty(kind).unwrap().covariance_matrix(true_kind),
            Err(EnsembleError::AnomalyMismatch {
                uncertainty: AnomalyKind::Mean,
                state: AnomalyKind::True,
            })
        );
    }

    #[test]
    fn set_state_vector_only_touches_orbital_fields() {
        let mut msg = message();
        msg.comments.push("nominal".into());
        msg.keplerian = Some(keplerian_state(Anomaly::True(5.0)));
        let original = msg.clone();

        let kind = msg.state_kind().unwrap();
        msg.set_state_vector(kind, &Vector6::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));

        let kep = msg.keplerian.unwrap();
        assert_eq!(kep.semi_major_axis, 1.0);
        assert_eq!(kep.anomaly, Anomaly::True(6.0));
        assert_eq!(msg.comments, original.comments);
        assert_eq!(msg.epoch, original.epoch);
        assert!(msg.cartesian.is_none());
    }
}
