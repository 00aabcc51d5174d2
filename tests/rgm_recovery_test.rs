//! End-to-end checks on simulated networks: recovery, thresholding and convergence.

mod common;

use common::simulate;
use ndarray::{arr2, Array2};
use rgm_mcmc::params::MIN_ITERATIONS;
use rgm_mcmc::ReciprocalGraphicalModel;

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn truth() -> (Array2<f64>, Array2<f64>) {
        let a = arr2(&[[0.0, 0.3, 0.3], [0.3, 0.0, 0.3], [0.3, 0.3, 0.0]]);
        (a, Array2::eye(3))
    }

    /// Started at the truth with one cis-eQTL per gene, the thresholded
    /// estimates stay close to the generating values.
    #[test]
    fn recovers_cyclic_network() {
        let (a0, b0) = truth();
        let (x, y) = simulate(&a0, &b0, 200, 7);

        let fit = ReciprocalGraphicalModel::new(x, y)
            .mask(Array2::eye(3))
            .initial_a(a0.clone())
            .initial_b(b0.clone())
            .set_seed(SEED)
            .run(MIN_ITERATIONS)
            .expect("chain should run");

        assert_eq!(fit.a.dim(), (3, 3));
        assert_eq!(fit.b.dim(), (3, 3));
        for ((idx, &est), &true_val) in fit.a.indexed_iter().zip(a0.iter()) {
            assert!(
                (est - true_val).abs() < 0.25,
                "A{idx:?}: estimated {est}, true {true_val}"
            );
        }
        for j in 0..3 {
            assert!(
                (fit.b[[j, j]] - 1.0).abs() < 0.25,
                "B[{j}, {j}]: estimated {}",
                fit.b[[j, j]]
            );
            assert!(fit.phi_prob[[j, j]] > 0.5);
            for l in (0..3).filter(|&l| l != j) {
                assert_eq!(fit.b[[j, l]], 0.0);
                assert_eq!(fit.phi_prob[[j, l]], 0.0);
            }
        }
        for i in 0..3 {
            assert_eq!(fit.a[[i, i]], 0.0);
            assert_eq!(fit.gamma_prob[[i, i]], 0.0);
        }
        assert!(fit.log_likelihood.iter().all(|v| v.is_finite()));
        assert_eq!(fit.log_likelihood.len(), MIN_ITERATIONS);
    }

    /// Estimates equal the unthresholded means wherever inclusion is at least one half.
    #[test]
    fn thresholded_estimates_agree_with_means() {
        let (a0, b0) = truth();
        let (x, y) = simulate(&a0, &b0, 120, 8);
        let fit = ReciprocalGraphicalModel::new(x, y)
            .mask(Array2::eye(3))
            .initial_a(a0)
            .initial_b(b0)
            .set_seed(SEED)
            .run(MIN_ITERATIONS)
            .unwrap();
        for ((idx, &est), &prob) in fit.a.indexed_iter().zip(fit.gamma_prob.iter()) {
            if prob >= 0.5 {
                assert_eq!(est, fit.a_mean[idx]);
            } else {
                assert_eq!(est, 0.0);
            }
            assert!((0.0..=1.0).contains(&prob));
        }
    }

    /// From a prior draw the log-likelihood climbs and then settles: the last
    /// thousand iterations vary far less than the first thousand.
    #[test]
    fn log_likelihood_settles_from_prior_start() {
        let (a0, b0) = truth();
        let (x, y) = simulate(&a0, &b0, 200, 9);
        let fit = ReciprocalGraphicalModel::new(x, y)
            .mask(Array2::eye(3))
            .set_seed(9)
            .run(MIN_ITERATIONS)
            .unwrap();

        assert!(fit.log_likelihood.iter().all(|v| v.is_finite()));
        let ll = fit.log_likelihood_summary(1000).unwrap();
        assert_eq!(ll.window, 1000);
        assert!(
            ll.last_window_var < ll.first_window_var,
            "last-window variance {} is not below first-window variance {}",
            ll.last_window_var,
            ll.first_window_var
        );
        assert!(ll.last_window_mean > ll.first_window_mean);
    }

    /// Default hyperparameters with no starting matrices on a larger network.
    #[test]
    fn default_configuration_runs_from_prior_start() {
        let p = 8;
        let mut a0 = Array2::zeros((p, p));
        for j in 0..p {
            a0[[j, (j + 1) % p]] = 0.3;
        }
        let b0 = Array2::eye(p);
        let (x, y) = simulate(&a0, &b0, 100, 10);

        let fit = ReciprocalGraphicalModel::new(x, y)
            .mask(Array2::eye(p))
            .set_seed(SEED)
            .run(MIN_ITERATIONS)
            .expect("default configuration should run");

        assert!(fit.log_likelihood.iter().all(|v| v.is_finite()));
        assert!(fit.a.iter().chain(fit.b.iter()).all(|v| v.is_finite()));
        assert!(fit.a_mean.iter().all(|v| v.abs() < 10.0));
        assert_eq!(fit.a.dim(), (p, p));
        assert_eq!(fit.b.dim(), (p, p));
    }
}
