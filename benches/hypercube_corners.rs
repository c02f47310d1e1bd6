use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hifitime::Epoch;

use orbit_ensemble::constants::{Matrix6, Vector6, HYPERCUBE_SIGMA_KEY, HYPERCUBE_TYPE_KEY};
use orbit_ensemble::covariance::pack_lower_triangle;
use orbit_ensemble::hypercube::{generate_perturbations, HypercubeGenerator};
use orbit_ensemble::orbit_state::cartesian_state::{CartesianCovariance, CartesianState};
use orbit_ensemble::orbit_state::OrbitMessage;

fn fixture_message(mode: &str) -> OrbitMessage {
    let std_dev = Vector6::new(0.1, 0.2, 0.095, 1e-4, 2e-4, 1e-4);
    let cov = Matrix6::from_fn(|i, j| {
        0.4_f64.powi((i as i32 - j as i32).abs()) * std_dev[i] * std_dev[j]
    });

    let mut msg = OrbitMessage::new(
        "BENCH",
        "2021-010B",
        Epoch::from_gregorian_utc_at_midnight(2021, 1, 31),
    );
    msg.cartesian = Some(CartesianState {
        x: 6778.137,
        y: 12.5,
        z: -3.2,
        x_dot: 0.0021,
        y_dot: 7.6686,
        z_dot: 0.0183,
    });
    msg.cartesian_covariance = Some(CartesianCovariance::new(pack_lower_triangle(&cov)));
    msg.user_defined.insert(HYPERCUBE_TYPE_KEY.into(), mode.into());
    msg.user_defined.insert(HYPERCUBE_SIGMA_KEY.into(), "3".into());
    msg
}

fn bench_corners(c: &mut Criterion) {
    let msg = fixture_message("CORNERS");
    let generator = HypercubeGenerator::new(&msg).unwrap();

    c.bench_function("hypercube/corners_prebuilt", |b| {
        b.iter(|| black_box(generator.corners()))
    });

    c.bench_function("hypercube/corners_end_to_end", |b| {
        b.iter(|| black_box(generate_perturbations(black_box(&msg)).unwrap()))
    });
}

fn bench_faces(c: &mut Criterion) {
    let msg = fixture_message("FACES");

    c.bench_function("hypercube/faces_end_to_end", |b| {
        b.iter(|| black_box(generate_perturbations(black_box(&msg)).unwrap()))
    });
}

criterion_group!(benches, bench_corners, bench_faces);
criterion_main!(benches);
