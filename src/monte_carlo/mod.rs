//! # Monte Carlo draws of an orbital state
//!
//! This module turns one nominal [`OrbitMessage`] and its uncertainty into `N`
//! independent perturbed states drawn from `N(state, Σ)`.
//!
//! ## Pipeline
//!
//! 1. **Validation**
//!    The message must carry exactly one state representation and a matching
//!    uncertainty (sigma or covariance; for Keplerian states, with the same anomaly).
//!
//! 2. **Covariance assembly**
//!    Sigmas become a diagonal covariance; packed covariances are filled by symmetry
//!    (see [`crate::covariance`]).
//!
//! 3. **Unit normalization**
//!    For Keplerian states the semi-major axis (km) is expressed in AU before the
//!    factorization, so that all six axes have comparable magnitudes. Samples are
//!    converted back to km before being written into the perturbed state.
//!
//! 4. **Sampling**
//!    One [`MultivariateNormal`] is built and reused for every draw; each draw is
//!    written into a fresh copy of the nominal message.
//!
//! ## Configuration
//!
//! [`MonteCarloParams`] holds the draw count and the singular-matrix tolerance, with
//! a validating [`MonteCarloParamsBuilder`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use rand::{rngs::StdRng, SeedableRng};
//! use orbit_ensemble::monte_carlo::{generate_draws, MonteCarloParams};
//! # use orbit_ensemble::orbit_state::OrbitMessage;
//!
//! let params = MonteCarloParams::builder()
//!     .draw_count(500)
//!     .build()
//!     .unwrap();
//!
//! # let nominal: OrbitMessage = unimplemented!();
//! let mut rng = StdRng::seed_from_u64(42);
//! let draws = generate_draws(&nominal, &params, &mut rng).unwrap();
//! assert_eq!(draws.len(), 500);
//! ```

use std::fmt;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Vector6, AU, DEFAULT_MONTE_CARLO_TOLERANCE},
    covariance::scale_axis,
    ensemble_errors::EnsembleError,
    orbit_state::{OrbitMessage, PerturbedState, StateKind},
    sampling::{check_tolerance, multivariate_normal::MultivariateNormal},
};

/// Index of the semi-major axis in a Keplerian state vector.
const SEMI_MAJOR_AXIS: usize = 0;

/// Parameters of a Monte Carlo run.
///
/// Fields
/// -----------------
/// * `draw_count` – number of perturbed states to produce (must be `> 0`).
/// * `singular_matrix_tolerance` – eigenvalues in `[-tolerance, 0)` are clamped to zero
///   instead of rejecting the covariance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloParams {
    pub draw_count: usize,
    pub singular_matrix_tolerance: f64,
}

impl MonteCarloParams {
    /// Equivalent to [`MonteCarloParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a [`MonteCarloParamsBuilder`] from the default values.
    pub fn builder() -> MonteCarloParamsBuilder {
        MonteCarloParamsBuilder::new()
    }
}

impl Default for MonteCarloParams {
    fn default() -> Self {
        MonteCarloParams {
            draw_count: 1000,
            singular_matrix_tolerance: DEFAULT_MONTE_CARLO_TOLERANCE,
        }
    }
}

/// Builder for [`MonteCarloParams`], with validation.
#[derive(Debug, Clone)]
pub struct MonteCarloParamsBuilder {
    params: MonteCarloParams,
}

impl Default for MonteCarloParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonteCarloParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: MonteCarloParams::default(),
        }
    }

    pub fn draw_count(mut self, v: usize) -> Self {
        self.params.draw_count = v;
        self
    }

    pub fn singular_matrix_tolerance(mut self, v: f64) -> Self {
        self.params.singular_matrix_tolerance = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `draw_count >= 1`
    /// * `singular_matrix_tolerance >= 0.0` and finite
    pub fn build(self) -> Result<MonteCarloParams, EnsembleError> {
        let p = &self.params;

        if p.draw_count == 0 {
            return Err(EnsembleError::InvalidParameter(
                "draw_count must be >= 1".into(),
            ));
        }
        check_tolerance(p.singular_matrix_tolerance)?;

        Ok(self.params)
    }
}

impl fmt::Display for MonteCarloParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 44;
            writeln!(f, "Monte Carlo Parameters")?;
            writeln!(f, "----------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!(
                "draw_count                = {}",
                self.draw_count,
                "Number of perturbed states"
            )?;
            line!(
                "singular_matrix_tolerance = {:.1e}",
                self.singular_matrix_tolerance,
                "Clamp threshold for negative eigenvalues"
            )?;
            Ok(())
        } else {
            write!(
                f,
                "MonteCarloParams(draw_count={}, singular_matrix_tolerance={:.1e})",
                self.draw_count, self.singular_matrix_tolerance
            )
        }
    }
}

/// Reusable Monte Carlo generator for one nominal message.
///
/// The covariance is assembled and factorized once in [`MonteCarloGenerator::new`];
/// drawing afterwards cannot fail (except for a zero draw count).
#[derive(Debug, Clone)]
pub struct MonteCarloGenerator {
    nominal: OrbitMessage,
    kind: StateKind,
    sampler: MultivariateNormal,
    /// Factor applied back to the semi-major axis of each sample (Keplerian only).
    semi_major_axis_scale: Option<f64>,
}

impl MonteCarloGenerator {
    /// Validate `nominal`, assemble its covariance and build the sampler.
    ///
    /// Arguments
    /// -----------------
    /// * `nominal` – the nominal state with its uncertainty. It is cloned, never modified.
    /// * `singular_matrix_tolerance` – clamp threshold for slightly negative eigenvalues.
    ///
    /// Errors
    /// -----------------
    /// * [`EnsembleError::MissingStateVector`] / [`EnsembleError::AmbiguousStateVector`]
    ///   unless exactly one representation is set.
    /// * [`EnsembleError::MissingUncertainty`] if no sigma or covariance matches the state.
    /// * [`EnsembleError::AnomalyMismatch`] for a Keplerian uncertainty on the other anomaly.
    /// * [`EnsembleError::NonPositiveSemiDefinite`] if the covariance is rejected by the sampler.
    pub fn new(
        nominal: &OrbitMessage,
        singular_matrix_tolerance: f64,
    ) -> Result<Self, EnsembleError> {
        let kind = nominal.state_kind()?;
        let mut covariance = nominal.uncertainty(kind)?.covariance_matrix(kind)?;
        let mut mean = nominal.state_vector()?;

        let semi_major_axis_scale = match kind {
            StateKind::Keplerian(_) => {
                scale_axis(&mut mean, &mut covariance, SEMI_MAJOR_AXIS, AU);
                Some(AU)
            }
            StateKind::Cartesian => None,
        };

        let sampler =
            MultivariateNormal::from_state(&mean, &covariance, singular_matrix_tolerance)
                .inspect_err(|err| {
                    tracing::error!(
                        object = %nominal.object_name,
                        "unable to build a sampler for the {kind} covariance ({err}):{covariance}"
                    )
                })?;

        tracing::debug!(
            object = %nominal.object_name,
            representation = %kind,
            "Monte Carlo generator ready"
        );

        Ok(MonteCarloGenerator {
            nominal: nominal.clone(),
            kind,
            sampler,
            semi_major_axis_scale,
        })
    }

    /// Build a generator with the tolerance of `params`.
    pub fn from_params(
        nominal: &OrbitMessage,
        params: &MonteCarloParams,
    ) -> Result<Self, EnsembleError> {
        Self::new(nominal, params.singular_matrix_tolerance)
    }

    pub fn nominal(&self) -> &OrbitMessage {
        &self.nominal
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn sampler(&self) -> &MultivariateNormal {
        &self.sampler
    }

    /// Draw one state vector, in the units of the nominal message.
    pub fn sample_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector6 {
        let draw = self.sampler.sample(rng);
        let mut v = Vector6::from_column_slice(draw.as_slice());
        if let Some(scale) = self.semi_major_axis_scale {
            v[SEMI_MAJOR_AXIS] *= scale;
        }
        v
    }

    /// Lazily produce `n` perturbed states.
    ///
    /// The iterator does not check `n`; see [`MonteCarloGenerator::draws`] for the
    /// validated form.
    pub fn draws_iter<'a, R: Rng + ?Sized + 'a>(
        &'a self,
        rng: &'a mut R,
        n: usize,
    ) -> impl Iterator<Item = PerturbedState> + 'a {
        (0..n).map(move |i| {
            let v = self.sample_state(rng);
            let mut state = self.nominal.clone();
            state.set_state_vector(self.kind, &v);
            PerturbedState {
                state,
                provenance: format!("Monte Carlo draw {} of {n}", i + 1),
            }
        })
    }

    /// Produce `n` perturbed states.
    ///
    /// Errors
    /// -----------------
    /// * [`EnsembleError::InvalidDrawCount`] if `n == 0`.
    pub fn draws<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
    ) -> Result<Vec<PerturbedState>, EnsembleError> {
        if n == 0 {
            return Err(EnsembleError::InvalidDrawCount(n));
        }
        tracing::debug!(
            draw_count = n,
            representation = %self.kind,
            "generating Monte Carlo draws"
        );
        Ok(self.draws_iter(rng, n).collect())
    }

    /// Produce `n` perturbed states from a [`StdRng`] seeded with `seed`.
    pub fn draws_with_seed(
        &self,
        seed: u64,
        n: usize,
    ) -> Result<Vec<PerturbedState>, EnsembleError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.draws(&mut rng, n)
    }
}

impl Distribution<OrbitMessage> for MonteCarloGenerator {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> OrbitMessage {
        let v = self.sample_state(rng);
        let mut state = self.nominal.clone();
        state.set_state_vector(self.kind, &v);
        state
    }
}

/// Generate `params.draw_count` perturbed states from `nominal`.
///
/// The draw count is checked before anything else; see
/// [`MonteCarloGenerator::new`] for the other failure modes. Either the full set
/// of draws is returned or an error, never a partial result.
pub fn generate_draws<R: Rng + ?Sized>(
    nominal: &OrbitMessage,
    params: &MonteCarloParams,
    rng: &mut R,
) -> Result<Vec<PerturbedState>, EnsembleError> {
    if params.draw_count == 0 {
        return Err(EnsembleError::InvalidDrawCount(params.draw_count));
    }
    MonteCarloGenerator::from_params(nominal, params)?.draws(rng, params.draw_count)
}
