//! Prior and proposal hyperparameters, plus the fixed run policy.

use crate::error::{Result, RgmError};

/// Number of leading iterations discarded before posterior averaging.
pub const BURN_IN: usize = 2999;

/// Smallest chain length the model entry point accepts.
pub const MIN_ITERATIONS: usize = 10_000;

/// Posterior inclusion probability below which an interaction is set to zero.
pub const INCLUSION_THRESHOLD: f64 = 0.5;

/**
Hyperparameters of the spike-and-slab priors and of the random-walk proposals.

The slab variance of `A[j, l]` is `tau ~ InvGamma(a_tau, b_tau)`; the spike is
the same normal scaled down by `nu_1`. Inclusion indicators are Bernoulli with
probability `rho ~ Beta(a_rho, b_rho)`. The `eta`/`psi`/`nu_2` family plays the
same role for `B`, and `(a_sigma, b_sigma)` is the Gamma prior on each residual
precision.

Chains started without `A0`/`B0` draw every slab variance and precision from
these priors, so the defaults keep them proper and on the unit scale:
`InvGamma(2, 1)` has mean 1, and `Gamma(1, 1)` cannot round to zero. Shapes
far below one put most of their mass near zero precision, which makes the
prior draws overflow.

# Examples

```rust
use rgm_mcmc::params::Hyperparameters;

let hyper = Hyperparameters::default().prop_var_a(0.02).nu_1(1e-3);
assert_eq!(hyper.prop_var_a, 0.02);
assert!(hyper.validate().is_ok());
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub a_tau: f64,
    pub b_tau: f64,
    pub a_rho: f64,
    pub b_rho: f64,
    pub nu_1: f64,
    pub a_eta: f64,
    pub b_eta: f64,
    pub a_psi: f64,
    pub b_psi: f64,
    pub nu_2: f64,
    pub a_sigma: f64,
    pub b_sigma: f64,
    /// Variance of the normal random walk on each `A[j, l]`.
    pub prop_var_a: f64,
    /// Variance of the normal random walk on each `B[j, l]`.
    pub prop_var_b: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            a_tau: 2.0,
            b_tau: 1.0,
            a_rho: 0.5,
            b_rho: 0.5,
            nu_1: 1e-4,
            a_eta: 2.0,
            b_eta: 1.0,
            a_psi: 0.5,
            b_psi: 0.5,
            nu_2: 1e-4,
            a_sigma: 1.0,
            b_sigma: 1.0,
            prop_var_a: 0.01,
            prop_var_b: 0.01,
        }
    }
}

macro_rules! setter {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(mut self, value: f64) -> Self {
                self.$name = value;
                self
            }
        )*
    };
}

impl Hyperparameters {
    setter!(
        a_tau, b_tau, a_rho, b_rho, nu_1, a_eta, b_eta, a_psi, b_psi, nu_2, a_sigma, b_sigma,
        prop_var_a, prop_var_b,
    );

    /// Rejects any value that is not a positive finite real.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("a_tau", self.a_tau),
            ("b_tau", self.b_tau),
            ("a_rho", self.a_rho),
            ("b_rho", self.b_rho),
            ("nu_1", self.nu_1),
            ("a_eta", self.a_eta),
            ("b_eta", self.b_eta),
            ("a_psi", self.a_psi),
            ("b_psi", self.b_psi),
            ("nu_2", self.nu_2),
            ("a_sigma", self.a_sigma),
            ("b_sigma", self.b_sigma),
            ("prop_var_a", self.prop_var_a),
            ("prop_var_b", self.prop_var_b),
        ];
        match named.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            Some(&(name, value)) => Err(RgmError::NonPositiveHyperparameter { name, value }),
            None => Ok(()),
        }
    }
}
