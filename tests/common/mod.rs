//! Simulation helpers shared by the integration tests.

use nalgebra::DMatrix;
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Draws `n` samples from `Y (I - A)ᵀ = X Bᵀ + E` with genotypes in {0, 1, 2}
/// and standard normal noise. Returns `(X, Y)`.
pub fn simulate(a: &Array2<f64>, b: &Array2<f64>, n: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let p = a.nrows();
    let k = b.ncols();
    let mut rng = SmallRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let x = Array2::from_shape_fn((n, k), |_| rng.gen_range(0..3) as f64);
    let e = Array2::from_shape_fn((n, p), |_| noise.sample(&mut rng));

    let i_minus_a = Array2::<f64>::eye(p) - a;
    let inv = DMatrix::from_fn(p, p, |i, j| i_minus_a[[i, j]])
        .try_inverse()
        .expect("I - A must be invertible");
    let rhs = x.dot(&b.t()) + &e;
    let rhs = DMatrix::from_fn(n, p, |i, j| rhs[[i, j]]);
    let y = rhs * inv.transpose();
    (x, Array2::from_shape_fn((n, p), |(i, j)| y[(i, j)]))
}

