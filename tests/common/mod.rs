#![allow(dead_code)]

use hifitime::Epoch;
use orbit_ensemble::{
    constants::{Matrix6, Vector6, HYPERCUBE_SIGMA_KEY, HYPERCUBE_TYPE_KEY, STATE_DIM},
    covariance::pack_lower_triangle,
    orbit_state::{
        cartesian_state::{CartesianCovariance, CartesianState},
        keplerian_state::{Anomaly, KeplerianCovariance, KeplerianSigma, KeplerianState},
        OrbitMessage, SpacecraftParameters,
    },
};

/// Route library logs to the test output; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn epoch() -> Epoch {
    Epoch::from_gregorian_utc(2021, 1, 31, 12, 0, 0, 0)
}

/// Covariance `D·R·D` with standard deviations `D` typical of a LEO state (km, km/s)
/// and correlations `R[i][j] = 0.4^|i-j|`.
pub fn correlated_covariance() -> Matrix6 {
    let std_dev = Vector6::new(0.1, 0.2, 0.095, 1e-4, 2e-4, 1e-4);
    Matrix6::from_fn(|i, j| {
        let rho = 0.4_f64.powi((i as i32 - j as i32).abs());
        rho * std_dev[i] * std_dev[j]
    })
}

pub fn leo_state() -> CartesianState {
    CartesianState {
        x: 6778.137,
        y: 12.5,
        z: -3.2,
        x_dot: 0.0021,
        y_dot: 7.6686,
        z_dot: 0.0183,
    }
}

/// Cartesian nominal state with metadata and the correlated covariance.
pub fn cartesian_nominal() -> OrbitMessage {
    let mut msg = OrbitMessage::new("ENSEMBLE-SAT", "2021-010B", epoch());
    msg.comments = vec![
        "Generated for ensemble tests".into(),
        "Covariance in km and km/s".into(),
    ];
    msg.spacecraft = Some(SpacecraftParameters {
        mass: 1250.0,
        solar_rad_area: 18.0,
        solar_rad_coeff: 1.3,
        drag_area: 12.0,
        drag_coeff: 2.2,
    });
    msg.gm = Some(398_600.4415);
    msg.cartesian = Some(leo_state());
    msg.cartesian_covariance = Some(CartesianCovariance::new(pack_lower_triangle(
        &correlated_covariance(),
    )));
    msg
}

/// Cartesian nominal state carrying a hypercube request.
pub fn hypercube_message(mode: &str, sigma: &str) -> OrbitMessage {
    let mut msg = cartesian_nominal();
    msg.user_defined.insert(HYPERCUBE_TYPE_KEY.to_string(), mode.to_string());
    msg.user_defined.insert(HYPERCUBE_SIGMA_KEY.to_string(), sigma.to_string());
    msg
}

pub fn keplerian_state(anomaly: Anomaly) -> KeplerianState {
    KeplerianState {
        semi_major_axis: 6878.137,
        eccentricity: 0.0012,
        inclination: 97.4,
        ra_of_asc_node: 221.3,
        arg_of_pericenter: 87.6,
        anomaly,
    }
}

/// Keplerian nominal state with per-element sigmas on the same anomaly.
pub fn keplerian_nominal_with_sigma(anomaly: Anomaly) -> OrbitMessage {
    let mut msg = OrbitMessage::new("ENSEMBLE-SAT", "2021-010B", epoch());
    msg.keplerian = Some(keplerian_state(anomaly));
    msg.keplerian_sigma = Some(KeplerianSigma {
        semi_major_axis: 0.5,
        eccentricity: 1e-5,
        inclination: 0.01,
        ra_of_asc_node: 0.01,
        arg_of_pericenter: 0.02,
        anomaly: match anomaly {
            Anomaly::Mean(_) => Anomaly::Mean(0.01),
            Anomaly::True(_) => Anomaly::True(0.01),
        },
    });
    msg
}

/// Keplerian covariance on the true anomaly, with `a` and `ν` correlated at 0.5.
///
/// Standard deviations: `a` 0.5 km, `e` 1e-5, angles 0.01 deg, `ν` 0.01 deg.
pub fn true_anomaly_covariance() -> KeplerianCovariance {
    let mut common = [0.0; 15];
    common[0] = 0.25;
    common[2] = 1e-10;
    common[5] = 1e-4;
    common[9] = 1e-4;
    common[14] = 1e-4;

    let mut true_anomaly_row = [0.0; STATE_DIM];
    true_anomaly_row[0] = 0.5 * 0.5 * 0.01;
    true_anomaly_row[5] = 1e-4;

    KeplerianCovariance {
        common,
        mean_anomaly_row: [0.0; STATE_DIM],
        true_anomaly_row,
    }
}
