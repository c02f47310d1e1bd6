//! # Hypercube perturbations
//!
//! Deterministic perturbation sets placed along the principal axes of a Cartesian
//! covariance. With `λᵢ, vᵢ` the eigenpairs of the covariance and `σ` the requested
//! multiplier, each axis contributes the offset
//!
//! ```text
//! dᵢ = σ · √λᵢ · vᵢ
//! ```
//!
//! and two layouts are available:
//!
//! - [`HypercubeMode::Faces`] – `nominal ± dᵢ` for each axis (12 states, axis 0 minus
//!   first),
//! - [`HypercubeMode::Corners`] – `nominal + Σᵢ sᵢ·dᵢ` for every sign combination
//!   (64 states). Bit `j` of the combination index selects `+` on axis `j`, so
//!   combination `0` is the all-minus corner.
//!
//! ## Request
//!
//! The mode and `σ` travel in the message's user-defined fields under
//! [`HYPERCUBE_TYPE_KEY`] and [`HYPERCUBE_SIGMA_KEY`]; see
//! [`HypercubeRequest::from_message`].
//!
//! ## Eigenvalue policy
//!
//! Unlike the Monte Carlo sampler, no tolerance is applied: any negative eigenvalue
//! rejects the covariance.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        Vector6, HYPERCUBE_CORNERS, HYPERCUBE_FACES, HYPERCUBE_SIGMA_KEY, HYPERCUBE_TYPE_KEY,
        STATE_DIM,
    },
    covariance::assemble_cartesian_covariance,
    ensemble_errors::EnsembleError,
    orbit_state::{OrbitMessage, PerturbedState, StateKind},
    sampling::EigenFactorization,
};

/// Layout of a hypercube perturbation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HypercubeMode {
    Faces,
    Corners,
}

impl HypercubeMode {
    /// Number of states emitted in this mode.
    pub fn count(&self) -> usize {
        match self {
            HypercubeMode::Faces => HYPERCUBE_FACES,
            HypercubeMode::Corners => HYPERCUBE_CORNERS,
        }
    }
}

impl FromStr for HypercubeMode {
    type Err = EnsembleError;

    /// Parse `FACES` or `CORNERS`, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("FACES") {
            Ok(HypercubeMode::Faces)
        } else if s.eq_ignore_ascii_case("CORNERS") {
            Ok(HypercubeMode::Corners)
        } else {
            Err(EnsembleError::InvalidHypercubeType(s.to_string()))
        }
    }
}

impl fmt::Display for HypercubeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HypercubeMode::Faces => write!(f, "FACES"),
            HypercubeMode::Corners => write!(f, "CORNERS"),
        }
    }
}

/// A parsed hypercube request: layout and sigma multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HypercubeRequest {
    pub mode: HypercubeMode,
    pub sigma: f64,
}

impl HypercubeRequest {
    /// Build a request, checking that `sigma` is finite and strictly positive.
    pub fn new(mode: HypercubeMode, sigma: f64) -> Result<Self, EnsembleError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(EnsembleError::InvalidHypercubeSigma(format!(
                "{sigma} (must be finite and > 0)"
            )));
        }
        Ok(HypercubeRequest { mode, sigma })
    }

    /// Read the request from the user-defined fields of `message`.
    ///
    /// Errors
    /// -----------------
    /// * [`EnsembleError::MissingHypercubeFields`] – neither field is present.
    /// * [`EnsembleError::MissingHypercubeType`] – only the sigma is present.
    /// * [`EnsembleError::MissingHypercubeSigma`] – only the type is present.
    /// * [`EnsembleError::InvalidHypercubeType`] – the type is neither `FACES` nor `CORNERS`.
    /// * [`EnsembleError::InvalidHypercubeSigma`] – the sigma is not a number, or not `> 0`.
    pub fn from_message(message: &OrbitMessage) -> Result<Self, EnsembleError> {
        let (mode, sigma) = match (
            message.user_defined(HYPERCUBE_TYPE_KEY),
            message.user_defined(HYPERCUBE_SIGMA_KEY),
        ) {
            (Some(mode), Some(sigma)) => (mode, sigma),
            (None, None) => return Err(EnsembleError::MissingHypercubeFields),
            (None, Some(_)) => return Err(EnsembleError::MissingHypercubeType),
            (Some(_), None) => return Err(EnsembleError::MissingHypercubeSigma),
        };

        let mode: HypercubeMode = mode.parse()?;
        let sigma: f64 = sigma
            .trim()
            .parse()
            .map_err(|_| EnsembleError::InvalidHypercubeSigma(sigma.to_string()))?;

        Self::new(mode, sigma)
    }
}

impl fmt::Display for HypercubeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}σ", self.mode, self.sigma)
    }
}

/// Whether `message` asks for hypercube perturbations.
///
/// True when the state is Cartesian only, a Cartesian covariance is present, and
/// both side-channel fields are set. The field values are not parsed here.
pub fn is_hypercube_request(message: &OrbitMessage) -> bool {
    message.cartesian.is_some()
        && message.keplerian.is_none()
        && message.cartesian_covariance.is_some()
        && message.user_defined(HYPERCUBE_TYPE_KEY).is_some()
        && message.user_defined(HYPERCUBE_SIGMA_KEY).is_some()
}

/// Hypercube generator for one nominal message.
///
/// All validation happens in [`HypercubeGenerator::new`]; emitting faces or corners
/// afterwards cannot fail.
#[derive(Debug, Clone)]
pub struct HypercubeGenerator {
    nominal: OrbitMessage,
    center: Vector6,
    request: HypercubeRequest,
    factorization: EigenFactorization,
    /// `σ·√λᵢ·vᵢ` for each eigen-axis, in decreasing eigenvalue order.
    offsets: Vec<Vector6>,
}

impl HypercubeGenerator {
    /// Validate `message` and factorize its Cartesian covariance.
    ///
    /// Errors
    /// -----------------
    /// * [`EnsembleError::MissingStateVector`] / [`EnsembleError::AmbiguousStateVector`].
    /// * [`EnsembleError::HypercubeRequiresCartesian`] for a Keplerian state.
    /// * [`EnsembleError::MissingCovariance`] without a Cartesian covariance (a sigma
    ///   is not enough).
    /// * Any error of [`HypercubeRequest::from_message`].
    /// * [`EnsembleError::InvalidParameter`] if the covariance has a NaN or infinite entry.
    /// * [`EnsembleError::NonPositiveSemiDefinite`] if an eigenvalue is negative.
    pub fn new(message: &OrbitMessage) -> Result<Self, EnsembleError> {
        if let StateKind::Keplerian(_) = message.state_kind()? {
            return Err(EnsembleError::HypercubeRequiresCartesian);
        }
        let packed = message
            .cartesian_covariance
            .as_ref()
            .ok_or(EnsembleError::MissingCovariance)?;
        let request = HypercubeRequest::from_message(message)?;

        let covariance = assemble_cartesian_covariance(&packed.lower_triangle);
        let factorization = EigenFactorization::from_matrix6(&covariance)?;
        factorization.require_non_negative().inspect_err(|err| {
            tracing::error!(
                object = %message.object_name,
                "hypercube covariance rejected ({err}):{covariance}"
            )
        })?;

        let axes = factorization.scaled_axes();
        let offsets = axes
            .column_iter()
            .map(|column| Vector6::from_iterator(column.iter().copied()) * request.sigma)
            .collect();

        tracing::debug!(
            object = %message.object_name,
            mode = %request.mode,
            sigma = request.sigma,
            "hypercube generator ready"
        );

        Ok(HypercubeGenerator {
            nominal: message.clone(),
            center: message.state_vector()?,
            request,
            factorization,
            offsets,
        })
    }

    pub fn request(&self) -> &HypercubeRequest {
        &self.request
    }

    /// Eigenpairs of the covariance, in decreasing eigenvalue order.
    pub fn factorization(&self) -> &EigenFactorization {
        &self.factorization
    }

    /// The perturbation set of the requested mode.
    pub fn perturbations(&self) -> Vec<PerturbedState> {
        match self.request.mode {
            HypercubeMode::Faces => self.faces(),
            HypercubeMode::Corners => self.corners(),
        }
    }

    /// `nominal ∓ σ·√λᵢ·vᵢ` for each axis: axis 0 minus, axis 0 plus, axis 1 minus, …
    pub fn faces(&self) -> Vec<PerturbedState> {
        let sigma = self.request.sigma;
        self.offsets
            .iter()
            .enumerate()
            .flat_map(|(axis, offset)| {
                let reach = sigma * self.factorization.eigenvalues[axis].sqrt();
                [(-1.0_f64, '-'), (1.0_f64, '+')].map(|(sign, symbol)| {
                    self.perturbed(
                        &(self.center + offset * sign),
                        format!("eigen-axis {axis}: {symbol}{sigma}σ (offset {symbol}{reach:e})"),
                    )
                })
            })
            .collect()
    }

    /// `nominal + Σᵢ sᵢ·σ·√λᵢ·vᵢ` for all 2⁶ sign combinations.
    ///
    /// The provenance is the sign pattern, character `j` being the sign of axis `j`.
    pub fn corners(&self) -> Vec<PerturbedState> {
        (0..HYPERCUBE_CORNERS)
            .map(|combination| {
                let signs = corner_signs(combination);
                let state = signs
                    .iter()
                    .zip(&self.offsets)
                    .fold(self.center, |acc, (sign, offset)| acc + offset * *sign);
                let pattern = signs
                    .iter()
                    .map(|&s| if s > 0.0 { '+' } else { '-' })
                    .join("");
                self.perturbed(&state, pattern)
            })
            .collect()
    }

    fn perturbed(&self, v: &Vector6, provenance: String) -> PerturbedState {
        let mut state = self.nominal.clone();
        state.set_state_vector(StateKind::Cartesian, v);
        PerturbedState { state, provenance }
    }
}

/// Sign of each axis for a corner index: bit `j` set means `+1` on axis `j`.
fn corner_signs(combination: usize) -> [f64; STATE_DIM] {
    std::array::from_fn(|axis| {
        if (combination >> axis) & 1 == 1 {
            1.0
        } else {
            -1.0
        }
    })
}

/// Generate the hypercube perturbation set requested by `message`.
///
/// Either the full set (12 faces or 64 corners) or an error is returned.
pub fn generate_perturbations(
    message: &OrbitMessage,
) -> Result<Vec<PerturbedState>, EnsembleError> {
    Ok(HypercubeGenerator::new(message)?.perturbations())
}
