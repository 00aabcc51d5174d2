/*!
# Reciprocal graphical model

Public entry point: configure a [`ReciprocalGraphicalModel`] with the data,
optional starting matrices, structural mask and hyperparameters, then call
[`ReciprocalGraphicalModel::run`]. Inputs are validated before anything is
initialized; the chain then runs sequentially for `niter` sweeps and the
post burn-in draws are summarized into thresholded point estimates.

# Example

```rust
use ndarray::Array2;
use rgm_mcmc::model::ReciprocalGraphicalModel;
use rgm_mcmc::params::Hyperparameters;

let x = Array2::from_shape_fn((20, 2), |(i, j)| ((i + 3 * j) % 5) as f64 - 2.0);
let y = Array2::from_shape_fn((20, 2), |(i, j)| ((2 * i + j) % 7) as f64 / 3.0 - 1.0);
let a0 = Array2::zeros((2, 2));
let b0 = Array2::zeros((2, 2));

let fit = ReciprocalGraphicalModel::new(x, y)
    .initial_a(a0)
    .initial_b(b0)
    .hyperparameters(Hyperparameters::default().prop_var_a(0.02))
    .set_seed(42)
    .run(10_000)
    .expect("chain should run");

assert_eq!(fit.a.dim(), (2, 2));
assert_eq!(fit.log_likelihood.len(), 10_000);
```
*/

use ndarray::{Array1, Array2};
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};

use crate::core::{progress_bar, run_chain, run_chain_with_progress, ChainOutput, Traces};
use crate::error::Result;
use crate::gibbs::RgmChain;
use crate::params::{Hyperparameters, BURN_IN};
use crate::state::ModelState;
use crate::stats::{log_likelihood_summary, summarize, AcceptanceTracker, LogLikSummary};
use crate::validate::{check_iterations, ModelData};

/// Builder for one run of the sampler.
#[derive(Debug, Clone)]
pub struct ReciprocalGraphicalModel {
    x: Array2<f64>,
    y: Array2<f64>,
    d: Option<Array2<f64>>,
    a0: Option<Array2<f64>>,
    b0: Option<Array2<f64>>,
    hyper: Hyperparameters,
    seed: u64,
}

/// Output of a run.
#[derive(Debug, Clone)]
pub struct RgmFit {
    /// Posterior mean of `A` with low-inclusion entries set to zero, `p × p`.
    pub a: Array2<f64>,
    /// Posterior mean of `B` with low-inclusion entries set to zero, `p × k`.
    pub b: Array2<f64>,
    /// Posterior inclusion probabilities of `A`.
    pub gamma_prob: Array2<f64>,
    /// Posterior inclusion probabilities of `B`.
    pub phi_prob: Array2<f64>,
    pub a_mean: Array2<f64>,
    pub b_mean: Array2<f64>,
    /// Log-likelihood of every iteration, burn-in included.
    pub log_likelihood: Array1<f64>,
    /// Every recorded draw.
    pub traces: Traces,
    pub acceptance: AcceptanceTracker,
    /// Seed the chain was started from.
    pub seed: u64,
}

impl ReciprocalGraphicalModel {
    /// `x` holds covariates (`n × k`), `y` expression (`n × p`).
    pub fn new(x: Array2<f64>, y: Array2<f64>) -> Self {
        Self {
            x,
            y,
            d: None,
            a0: None,
            b0: None,
            hyper: Hyperparameters::default(),
            seed: thread_rng().gen::<u64>(),
        }
    }

    /// Structural mask `D` (`p × k`, entries 0 or 1). Defaults to all ones.
    pub fn mask(mut self, d: Array2<f64>) -> Self {
        self.d = Some(d);
        self
    }

    /// Starting value of `A` (`p × p`, zero diagonal). Drawn from the prior when absent.
    pub fn initial_a(mut self, a0: Array2<f64>) -> Self {
        self.a0 = Some(a0);
        self
    }

    /// Starting value of `B` (`p × k`). Drawn from the prior when absent.
    pub fn initial_b(mut self, b0: Array2<f64>) -> Self {
        self.b0 = Some(b0);
        self
    }

    pub fn hyperparameters(mut self, hyper: Hyperparameters) -> Self {
        self.hyper = hyper;
        self
    }

    /// Sets the seed of the single generator every draw of the run comes from.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn build_chain(self, niter: usize) -> Result<(RgmChain<SmallRng>, u64)> {
        check_iterations(niter)?;
        self.hyper.validate()?;
        let data = ModelData::new(self.x, self.y, self.d)?;
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let state = ModelState::initialize(
            &mut rng,
            &data,
            &self.hyper,
            self.a0.as_ref(),
            self.b0.as_ref(),
        )?;
        Ok((RgmChain::new(data, self.hyper, state, rng), self.seed))
    }

    /// Validates the inputs, runs `niter` sweeps and summarizes the draws.
    pub fn run(self, niter: usize) -> Result<RgmFit> {
        let (mut chain, seed) = self.build_chain(niter)?;
        let out = run_chain(&mut chain, niter)?;
        RgmFit::from_output(out, seed)
    }

    /// Same as [`run`](Self::run) with a progress bar on stderr.
    pub fn run_progress(self, niter: usize) -> Result<RgmFit> {
        let (mut chain, seed) = self.build_chain(niter)?;
        let pb = progress_bar(niter)?;
        let out = run_chain_with_progress(&mut chain, niter, &pb)?;
        RgmFit::from_output(out, seed)
    }
}

impl RgmFit {
    fn from_output(out: ChainOutput, seed: u64) -> Result<Self> {
        let posterior = summarize(&out.traces, BURN_IN)?;
        Ok(Self {
            a: posterior.a,
            b: posterior.b,
            gamma_prob: posterior.gamma_prob,
            phi_prob: posterior.phi_prob,
            a_mean: posterior.a_mean,
            b_mean: posterior.b_mean,
            log_likelihood: out.traces.log_likelihood.clone(),
            traces: out.traces,
            acceptance: out.acceptance,
            seed,
        })
    }

    /// Running maximum and early/late window statistics of the log-likelihood trace.
    pub fn log_likelihood_summary(&self, window: usize) -> Result<LogLikSummary> {
        log_likelihood_summary(&self.log_likelihood, window)
    }

    /// Print the estimated interactions with their inclusion probabilities.
    pub fn summary(&self) {
        println!(
            "{:<12} {:<12} {:<12} {:<12}",
            "Parameter", "Estimate", "Mean", "P(incl.)"
        );
        println!("{}", "-".repeat(50));
        for ((j, l), &v) in self.a.indexed_iter().filter(|((j, l), _)| j != l) {
            println!(
                "{:<12} {:<12.4} {:<12.4} {:<12.3}",
                format!("A[{j},{l}]"),
                v,
                self.a_mean[[j, l]],
                self.gamma_prob[[j, l]]
            );
        }
        for ((j, l), &v) in self.b.indexed_iter() {
            println!(
                "{:<12} {:<12.4} {:<12.4} {:<12.3}",
                format!("B[{j},{l}]"),
                v,
                self.b_mean[[j, l]],
                self.phi_prob[[j, l]]
            );
        }
    }
}
