/*!
# Joint Metropolis updates for interaction entries

Each entry of `A` (with its indicator in `Gamma`) and each structurally allowed
entry of `B` (with its indicator in `Phi`) is updated by one combined
Metropolis step:

1. propose a new magnitude `x' ~ N(x, prop_var)`;
2. propose an indicator `g'` uniformly from {0, 1};
3. accept `(x', g')` with probability `min(1, r)` where

\[
\log r = \Delta\ell + \log p(x', g') - \log p(x, g)
\]

with `Δℓ` the change of the model log-likelihood when only this entry moves,
and `p` the spike-and-slab prior of the entry. Both proposals are symmetric,
so the proposal densities cancel from `r`.

Moving the indicator together with the magnitude matters: flipping the
indicator alone is almost never accepted once the magnitude sits far from the
spike.

The updaters only read the current state. Applying an accepted move to the
running matrices is the caller's job (see [`crate::gibbs`]).
*/

use ndarray::Array2;
use rand::prelude::*;

use crate::distributions::{draw_normal, spike_slab_log_prior};
use crate::error::Result;
use crate::likelihood::{shifted_ssr, StructuralInverse};
use crate::params::Hyperparameters;
use crate::state::ModelState;
use crate::validate::ModelData;

/// Result of one joint step: the (possibly unchanged) magnitude and indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointMove {
    pub value: f64,
    pub indicator: f64,
    pub accepted: bool,
}

impl JointMove {
    /// Change of the magnitude, zero when rejected.
    pub fn delta(&self, current: f64) -> f64 {
        self.value - current
    }
}

/// Spike-and-slab prior of a single entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeSlab {
    /// Slab variance (`tau` or `eta`).
    pub slab_var: f64,
    /// Spike-to-slab variance ratio (`nu_1` or `nu_2`).
    pub nu: f64,
    /// Inclusion probability (`rho` or `psi`).
    pub incl: f64,
}

impl SpikeSlab {
    pub fn log_prob(&self, value: f64, indicator: f64) -> f64 {
        spike_slab_log_prior(value, indicator, self.slab_var, self.nu, self.incl)
    }
}

/**
Generic joint step.

`log_lik_delta` maps a proposed change of the magnitude to the resulting change
of the log-likelihood. Random draws happen in a fixed order (magnitude,
indicator, uniform), so a seeded generator reproduces the chain exactly.
*/
pub fn joint_step<R, F>(
    rng: &mut R,
    value: f64,
    indicator: f64,
    prop_var: f64,
    prior: &SpikeSlab,
    log_lik_delta: F,
) -> Result<JointMove>
where
    R: Rng + ?Sized,
    F: FnOnce(f64) -> f64,
{
    let proposed = draw_normal(rng, value, prop_var)?;
    let proposed_indicator = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };

    let log_accept_ratio = log_lik_delta(proposed - value)
        + prior.log_prob(proposed, proposed_indicator)
        - prior.log_prob(value, indicator);

    let u: f64 = rng.gen();
    if log_accept_ratio > u.ln() {
        Ok(JointMove {
            value: proposed,
            indicator: proposed_indicator,
            accepted: true,
        })
    } else {
        Ok(JointMove {
            value,
            indicator,
            accepted: false,
        })
    }
}

/**
Joint step for `(A[j, l], Gamma[j, l])`, `j != l`.

`resid` is the current `(I - A) Yᵀ - B Xᵀ` and `inverse` the current
`(I - A)⁻¹`; both must reflect every move accepted earlier in the pass.
Moving `A[j, l]` by `δ` changes only residual row `j` (by `-δ Yᵀ[l, ·]`) and
the Jacobian term (by `n log|1 - δ (I - A)⁻¹[l, j]|`).
*/
#[allow(clippy::too_many_arguments)]
pub fn update_interaction<R: Rng + ?Sized>(
    rng: &mut R,
    state: &ModelState,
    j: usize,
    l: usize,
    resid: &Array2<f64>,
    inverse: &StructuralInverse,
    data: &ModelData,
    hyper: &Hyperparameters,
) -> Result<JointMove> {
    debug_assert_ne!(j, l, "diagonal of A is fixed at zero");
    let n = data.n_samples() as f64;
    let row = resid.row(j);
    let ssr = row.dot(&row);
    let sigma_inv = state.sigma_inv[j];
    let prior = SpikeSlab {
        slab_var: state.tau[[j, l]],
        nu: hyper.nu_1,
        incl: state.rho,
    };
    joint_step(
        rng,
        state.a[[j, l]],
        state.gamma[[j, l]],
        hyper.prop_var_a,
        &prior,
        |delta| {
            n * inverse.log_det_ratio(j, l, delta)
                - 0.5 * sigma_inv * (shifted_ssr(row, data.yt.row(l), delta) - ssr)
        },
    )
}

/**
Joint step for `(B[j, l], Phi[j, l])` where `D[j, l] != 0`.

`resid` is `(I - A) Yᵀ - B Xᵀ` built from the structural term computed after
the `A` pass. Moving `B[j, l]` by `δ` changes residual row `j` by `-δ Xᵀ[l, ·]`;
the Jacobian does not depend on `B`.
*/
pub fn update_covariate_effect<R: Rng + ?Sized>(
    rng: &mut R,
    state: &ModelState,
    j: usize,
    l: usize,
    resid: &Array2<f64>,
    data: &ModelData,
    hyper: &Hyperparameters,
) -> Result<JointMove> {
    let row = resid.row(j);
    let ssr = row.dot(&row);
    let sigma_inv = state.sigma_inv[j];
    let prior = SpikeSlab {
        slab_var: state.eta[[j, l]],
        nu: hyper.nu_2,
        incl: state.psi,
    };
    joint_step(
        rng,
        state.b[[j, l]],
        state.phi[[j, l]],
        hyper.prop_var_b,
        &prior,
        |delta| -0.5 * sigma_inv * (shifted_ssr(row, data.xt.row(l), delta) - ssr),
    )
}
