//! Latent parameters of the chain and their initialization.

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::distributions::{draw_inclusion_prob, draw_inv_gamma, draw_normal, draw_precision};
use crate::error::Result;
use crate::params::Hyperparameters;
use crate::validate::{check_initial_a, check_initial_b, ModelData};

/// Full parameter state after some number of sweeps.
///
/// Invariants kept by every update: `A`, `Gamma` and `Tau` have a zero
/// diagonal; `B`, `Phi` and `Eta` are zero wherever `D` is zero; `Gamma` and
/// `Phi` only hold 0.0 or 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    /// Gene-gene interaction magnitudes, `p × p`.
    pub a: Array2<f64>,
    /// Inclusion indicators for `a`.
    pub gamma: Array2<f64>,
    /// Slab variances for `a`.
    pub tau: Array2<f64>,
    /// Gene-covariate interaction magnitudes, `p × k`.
    pub b: Array2<f64>,
    /// Inclusion indicators for `b`.
    pub phi: Array2<f64>,
    /// Slab variances for `b`.
    pub eta: Array2<f64>,
    pub rho: f64,
    pub psi: f64,
    /// Residual precision of each gene equation.
    pub sigma_inv: Array1<f64>,
}

impl ModelState {
    /**
    Builds the starting state.

    `rho`, `psi`, every slab variance and every residual precision are drawn
    from their priors. When `a0` / `b0` are given they become the starting
    magnitudes (with `b0` masked by `D`) and the indicators start at
    `1{value != 0}`; otherwise indicators are drawn from `Bernoulli(rho)` /
    `Bernoulli(psi)` and magnitudes from the matching spike or slab normal.
    Draw order is fixed, so the state is a function of the generator state.
    */
    pub fn initialize<R: Rng + ?Sized>(
        rng: &mut R,
        data: &ModelData,
        hyper: &Hyperparameters,
        a0: Option<&Array2<f64>>,
        b0: Option<&Array2<f64>>,
    ) -> Result<Self> {
        let p = data.n_genes();
        let k = data.n_covariates();
        if let Some(a0) = a0 {
            check_initial_a(a0, p)?;
        }
        if let Some(b0) = b0 {
            check_initial_b(b0, p, k)?;
        }

        let rho = draw_inclusion_prob(rng, "rho", hyper.a_rho, hyper.b_rho)?;
        let psi = draw_inclusion_prob(rng, "psi", hyper.a_psi, hyper.b_psi)?;

        let mut a = Array2::zeros((p, p));
        let mut gamma = Array2::zeros((p, p));
        let mut tau = Array2::zeros((p, p));
        for j in 0..p {
            for l in (0..p).filter(|&l| l != j) {
                let t = draw_inv_gamma(rng, hyper.a_tau, hyper.b_tau)?;
                let (g, v) = match a0 {
                    Some(a0) => {
                        let v = a0[[j, l]];
                        (if v != 0.0 { 1.0 } else { 0.0 }, v)
                    }
                    None => {
                        let g = if rng.gen_bool(rho) { 1.0 } else { 0.0 };
                        let var = if g == 1.0 { t } else { hyper.nu_1 * t };
                        (g, draw_normal(rng, 0.0, var)?)
                    }
                };
                tau[[j, l]] = t;
                gamma[[j, l]] = g;
                a[[j, l]] = v;
            }
        }

        let mut b = Array2::zeros((p, k));
        let mut phi = Array2::zeros((p, k));
        let mut eta = Array2::zeros((p, k));
        for j in 0..p {
            for l in (0..k).filter(|&l| data.d[[j, l]] != 0.0) {
                let e = draw_inv_gamma(rng, hyper.a_eta, hyper.b_eta)?;
                let (f, v) = match b0 {
                    Some(b0) => {
                        let v = b0[[j, l]];
                        (if v != 0.0 { 1.0 } else { 0.0 }, v)
                    }
                    None => {
                        let f = if rng.gen_bool(psi) { 1.0 } else { 0.0 };
                        let var = if f == 1.0 { e } else { hyper.nu_2 * e };
                        (f, draw_normal(rng, 0.0, var)?)
                    }
                };
                eta[[j, l]] = e;
                phi[[j, l]] = f;
                b[[j, l]] = v;
            }
        }

        let sigma_inv = (0..p)
            .map(|_| draw_precision(rng, hyper.a_sigma, hyper.b_sigma))
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self {
            a,
            gamma,
            tau,
            b,
            phi,
            eta,
            rho,
            psi,
            sigma_inv: Array1::from(sigma_inv),
        })
    }

    pub fn n_genes(&self) -> usize {
        self.a.nrows()
    }

    pub fn n_covariates(&self) -> usize {
        self.b.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn data(p: usize, k: usize, d: Option<Array2<f64>>) -> ModelData {
        let x = Array2::from_shape_fn((6, k), |(i, j)| (i + 2 * j) as f64 * 0.1);
        let y = Array2::from_shape_fn((6, p), |(i, j)| (i * j) as f64 * 0.05 - 0.2);
        ModelData::new(x, y, d).unwrap()
    }

    fn hyper() -> Hyperparameters {
        Hyperparameters::default()
    }

    #[test]
    fn prior_draws_respect_structure() {
        let d = arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let data = data(3, 2, Some(d.clone()));
        let mut rng = SmallRng::seed_from_u64(11);
        let s = ModelState::initialize(&mut rng, &data, &hyper(), None, None).unwrap();
        for i in 0..3 {
            assert_eq!(s.a[[i, i]], 0.0);
            assert_eq!(s.gamma[[i, i]], 0.0);
            assert_eq!(s.tau[[i, i]], 0.0);
        }
        for ((idx, &m), &phi) in d.indexed_iter().zip(s.phi.iter()) {
            assert!(phi == 0.0 || phi == 1.0);
            if m == 0.0 {
                assert_eq!(s.b[idx], 0.0);
                assert_eq!(phi, 0.0);
                assert_eq!(s.eta[idx], 0.0);
            } else {
                assert!(s.eta[idx] > 0.0);
            }
        }
        assert!(s.rho > 0.0 && s.rho < 1.0);
        assert!(s.psi > 0.0 && s.psi < 1.0);
        assert!(s.sigma_inv.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn supplied_start_sets_indicators() {
        let a0 = arr2(&[[0.0, 0.4], [0.0, 0.0]]);
        let b0 = arr2(&[[1.0, 2.0], [0.0, 3.0]]);
        let d = arr2(&[[1.0, 0.0], [1.0, 1.0]]);
        let data = data(2, 2, Some(d));
        let mut rng = SmallRng::seed_from_u64(12);
        let s = ModelState::initialize(&mut rng, &data, &hyper(), Some(&a0), Some(&b0)).unwrap();
        assert_eq!(s.a, a0);
        assert_eq!(s.gamma, arr2(&[[0.0, 1.0], [0.0, 0.0]]));
        // B0[0, 1] is masked out by D.
        assert_eq!(s.b, arr2(&[[1.0, 0.0], [0.0, 3.0]]));
        assert_eq!(s.phi, arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    }

    #[test]
    fn bad_start_is_rejected() {
        let data = data(2, 2, None);
        let mut rng = SmallRng::seed_from_u64(13);
        let a0 = arr2(&[[0.1, 0.4], [0.0, 0.0]]);
        assert!(ModelState::initialize(&mut rng, &data, &hyper(), Some(&a0), None).is_err());
        let b0 = Array2::zeros((3, 2));
        assert!(ModelState::initialize(&mut rng, &data, &hyper(), None, Some(&b0)).is_err());
    }

    #[test]
    fn default_priors_give_usable_starting_points() {
        let data = data(30, 5, None);
        let hyper = Hyperparameters::default();
        for seed in 0..100 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let s = ModelState::initialize(&mut rng, &data, &hyper, None, None)
                .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
            let largest = s.a.iter().chain(s.b.iter()).fold(0.0f64, |m, v| m.max(v.abs()));
            assert!(largest < 1e3, "seed {seed}: |value| up to {largest}");
            assert!(s.tau.iter().chain(s.eta.iter()).all(|v| v.is_finite()));
            assert!(s.sigma_inv.iter().all(|&v| v.is_finite() && v > 0.0));
        }
    }

    #[test]
    fn initialization_is_seed_deterministic() {
        let data = data(3, 2, None);
        let s1 = ModelState::initialize(&mut SmallRng::seed_from_u64(5), &data, &hyper(), None, None)
            .unwrap();
        let s2 = ModelState::initialize(&mut SmallRng::seed_from_u64(5), &data, &hyper(), None, None)
            .unwrap();
        assert_eq!(s1, s2);
    }
}
