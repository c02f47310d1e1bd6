//! Cartesian position/velocity states and their uncertainty.

use serde::{Deserialize, Serialize};

use crate::constants::{Kilometer, KmPerSec, Vector6, LOWER_TRIANGLE_LEN};

/// Position (km) and velocity (km/s) of the nominal state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianState {
    pub x: Kilometer,
    pub y: Kilometer,
    pub z: Kilometer,
    pub x_dot: KmPerSec,
    pub y_dot: KmPerSec,
    pub z_dot: KmPerSec,
}

impl CartesianState {
    pub fn to_vector(&self) -> Vector6 {
        Vector6::new(self.x, self.y, self.z, self.x_dot, self.y_dot, self.z_dot)
    }

    pub fn from_vector(v: &Vector6) -> Self {
        CartesianState {
            x: v[0],
            y: v[1],
            z: v[2],
            x_dot: v[3],
            y_dot: v[4],
            z_dot: v[5],
        }
    }
}

/// Per-axis 1-σ uncertainties of a Cartesian state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianSigma {
    pub x: Kilometer,
    pub y: Kilometer,
    pub z: Kilometer,
    pub x_dot: KmPerSec,
    pub y_dot: KmPerSec,
    pub z_dot: KmPerSec,
}

impl CartesianSigma {
    pub fn to_vector(&self) -> Vector6 {
        Vector6::new(self.x, self.y, self.z, self.x_dot, self.y_dot, self.z_dot)
    }
}

/// Packed Cartesian covariance: the 21 lower-triangular entries, row-major
/// (`(0,0), (1,0), (1,1), (2,0), …, (5,5)`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianCovariance {
    pub lower_triangle: [f64; LOWER_TRIANGLE_LEN],
}

impl CartesianCovariance {
    pub fn new(lower_triangle: [f64; LOWER_TRIANGLE_LEN]) -> Self {
        CartesianCovariance { lower_triangle }
    }
}

#[cfg(test)]
mod cartesian_state_test {
    use super::*;

    #[test]
    fn vector_round_trip() {
        let state = CartesianState {
            x: 6678.0,
            y: -12.0,
            z: 4.5,
            x_dot: 0.01,
            y_dot: 7.7,
            z_dot: -0.2,
        };
        assert_eq!(CartesianState::from_vector(&state.to_vector()), state);
    }
}
