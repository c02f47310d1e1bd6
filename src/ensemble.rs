//! Single entry point for ensemble generation.
//!
//! A message carrying a hypercube request (see [`is_hypercube_request`]) yields
//! its deterministic faces or corners; any other message yields Monte Carlo draws.

use rand::Rng;

use crate::{
    ensemble_errors::EnsembleError,
    hypercube::{generate_perturbations, is_hypercube_request},
    monte_carlo::{generate_draws, MonteCarloParams},
    orbit_state::{OrbitMessage, PerturbedState},
};

/// Which generator produced an ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsembleKind {
    Hypercube,
    MonteCarlo,
}

/// Pick the generator for `message`.
pub fn ensemble_kind(message: &OrbitMessage) -> EnsembleKind {
    if is_hypercube_request(message) {
        EnsembleKind::Hypercube
    } else {
        EnsembleKind::MonteCarlo
    }
}

/// Generate the ensemble requested by `message`.
///
/// `params` and `rng` are only used on the Monte Carlo path.
pub fn generate_ensemble<R: Rng + ?Sized>(
    message: &OrbitMessage,
    params: &MonteCarloParams,
    rng: &mut R,
) -> Result<Vec<PerturbedState>, EnsembleError> {
    let kind = ensemble_kind(message);
    tracing::debug!(object = %message.object_name, ?kind, "generating ensemble");
    match kind {
        EnsembleKind::Hypercube => generate_perturbations(message),
        EnsembleKind::MonteCarlo => generate_draws(message, params, rng),
    }
}
