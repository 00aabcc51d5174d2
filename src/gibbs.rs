/*!
# One Metropolis-within-Gibbs sweep

[`RgmChain`] owns the data, the hyperparameters, the latent state and the
random number generator, and advances the state by one sweep per
[`MarkovChain::step`]. The update order inside a sweep is part of the
contract:

1. `rho` from `Gamma`;
2. `psi` from `Phi` and `D`;
3. for every off-diagonal `(j, l)` in row-major order: `tau[j, l]`, then the
   joint `(A[j, l], Gamma[j, l])` Metropolis step;
4. `(I - A) Yᵀ` from the updated `A`;
5. for every `(j, l)` with `D[j, l] != 0` in row-major order: `eta[j, l]`,
   then the joint `(B[j, l], Phi[j, l])` Metropolis step;
6. residuals `(I - A) Yᵀ - B Xᵀ`;
7. every `sigma_inv[j]` from its residual sum of squares;
8. the log-likelihood of the updated `(A, B, sigma_inv)`.

Entries within a pass are visited sequentially because each step reads the
matrices already modified by earlier steps of the same pass.
*/

use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::core::MarkovChain;
use crate::distributions::{draw_eta, draw_psi, draw_rho, draw_sigma_inv, draw_tau};
use crate::error::{Result, RgmError};
use crate::likelihood::{
    log_abs_det, log_likelihood_from_ssr, residuals, residuals_from, row_ssr, structural_term,
    StructuralInverse,
};
use crate::metropolis_hastings::{update_covariate_effect, update_interaction};
use crate::params::Hyperparameters;
use crate::state::ModelState;
use crate::validate::ModelData;

/// What a single sweep produced besides the new state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStats {
    /// Log-likelihood at the end of the sweep.
    pub log_likelihood: f64,
    pub accepted_a: usize,
    pub proposed_a: usize,
    pub accepted_b: usize,
    pub proposed_b: usize,
}

/// Markov chain over the full parameter state of the reciprocal graphical model.
#[derive(Debug, Clone)]
pub struct RgmChain<R: Rng = SmallRng> {
    pub data: ModelData,
    pub hyper: Hyperparameters,
    pub state: ModelState,
    /// Number of completed sweeps.
    pub iteration: usize,
    pub rng: R,
}

impl<R: Rng> RgmChain<R> {
    pub fn new(data: ModelData, hyper: Hyperparameters, state: ModelState, rng: R) -> Self {
        Self {
            data,
            hyper,
            state,
            iteration: 0,
            rng,
        }
    }

    /// Runs steps 1-8 of the sweep.
    pub fn sweep(&mut self) -> Result<SweepStats> {
        let Self {
            data,
            hyper,
            state,
            rng,
            ..
        } = self;
        let p = data.n_genes();
        let k = data.n_covariates();
        let n = data.n_samples();

        // 1-2
        state.rho = draw_rho(rng, &state.gamma, hyper.a_rho, hyper.b_rho)?;
        state.psi = draw_psi(rng, &state.phi, &data.d, hyper.a_psi, hyper.b_psi)?;

        // 3
        let mut resid = residuals(&state.a, &state.b, data);
        let mut inverse = StructuralInverse::new(&state.a)?;
        let (mut accepted_a, mut proposed_a) = (0, 0);
        for j in 0..p {
            for l in (0..p).filter(|&l| l != j) {
                state.tau[[j, l]] = draw_tau(
                    rng,
                    state.a[[j, l]],
                    state.gamma[[j, l]],
                    hyper.a_tau,
                    hyper.b_tau,
                    hyper.nu_1,
                )?;
                let mv = update_interaction(rng, state, j, l, &resid, &inverse, data, hyper)?;
                proposed_a += 1;
                if mv.accepted {
                    accepted_a += 1;
                    let delta = mv.delta(state.a[[j, l]]);
                    resid.row_mut(j).scaled_add(-delta, &data.yt.row(l));
                    inverse.update(j, l, delta)?;
                }
                state.a[[j, l]] = mv.value;
                state.gamma[[j, l]] = mv.indicator;
            }
        }

        // 4-5
        let structural = structural_term(&state.a, data);
        let mut resid = residuals_from(&structural, &state.b, data);
        let (mut accepted_b, mut proposed_b) = (0, 0);
        for j in 0..p {
            for l in (0..k).filter(|&l| data.d[[j, l]] != 0.0) {
                state.eta[[j, l]] = draw_eta(
                    rng,
                    state.b[[j, l]],
                    state.phi[[j, l]],
                    hyper.a_eta,
                    hyper.b_eta,
                    hyper.nu_2,
                )?;
                let mv = update_covariate_effect(rng, state, j, l, &resid, data, hyper)?;
                proposed_b += 1;
                if mv.accepted {
                    accepted_b += 1;
                    let delta = mv.delta(state.b[[j, l]]);
                    resid.row_mut(j).scaled_add(-delta, &data.xt.row(l));
                }
                state.b[[j, l]] = mv.value;
                state.phi[[j, l]] = mv.indicator;
            }
        }

        // 6-7
        let resid: Array2<f64> = residuals_from(&structural, &state.b, data);
        let ssr = row_ssr(&resid);
        for j in 0..p {
            state.sigma_inv[j] = draw_sigma_inv(rng, ssr[j], n, hyper.a_sigma, hyper.b_sigma)?;
        }

        // 8
        let log_likelihood = log_likelihood_from_ssr(log_abs_det(&state.a), &ssr, &state.sigma_inv, n);
        self.iteration += 1;
        if !log_likelihood.is_finite() {
            return Err(RgmError::NonFiniteLikelihood {
                iteration: self.iteration,
            });
        }

        Ok(SweepStats {
            log_likelihood,
            accepted_a,
            proposed_a,
            accepted_b,
            proposed_b,
        })
    }
}

impl<R: Rng> MarkovChain for RgmChain<R> {
    fn step(&mut self) -> Result<SweepStats> {
        self.sweep()
    }

    fn current_state(&self) -> &ModelState {
        &self.state
    }
}
