pub mod constants;
pub mod covariance;
pub mod ensemble;
pub mod ensemble_errors;
pub mod hypercube;
pub mod monte_carlo;
pub mod orbit_state;
pub mod sampling;
pub mod statistics;
