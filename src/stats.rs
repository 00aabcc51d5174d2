//! Posterior summaries of a finished chain, plus acceptance and convergence diagnostics.

use log::warn;
use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_stats::QuantileExt;

use crate::core::Traces;
use crate::error::{Result, RgmError};
use crate::gibbs::SweepStats;
use crate::params::INCLUSION_THRESHOLD;

/// Acceptance rates outside this band suggest re-tuning the proposal variances.
const ACCEPTANCE_BAND: (f64, f64) = (0.05, 0.95);

/// Running counts of proposed and accepted Metropolis moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptanceTracker {
    pub accepted_a: u64,
    pub proposed_a: u64,
    pub accepted_b: u64,
    pub proposed_b: u64,
}

impl AcceptanceTracker {
    pub fn step(&mut self, stats: &SweepStats) {
        self.accepted_a += stats.accepted_a as u64;
        self.proposed_a += stats.proposed_a as u64;
        self.accepted_b += stats.accepted_b as u64;
        self.proposed_b += stats.proposed_b as u64;
    }

    /// Share of accepted `A` moves; `None` before any proposal.
    pub fn rate_a(&self) -> Option<f64> {
        rate(self.accepted_a, self.proposed_a)
    }

    /// Share of accepted `B` moves; `None` when no `B` entry is structurally allowed.
    pub fn rate_b(&self) -> Option<f64> {
        rate(self.accepted_b, self.proposed_b)
    }

    pub fn warn_if_poorly_tuned(&self) {
        for (name, r) in [("prop_var_a", self.rate_a()), ("prop_var_b", self.rate_b())] {
            if let Some(r) = r {
                if r < ACCEPTANCE_BAND.0 || r > ACCEPTANCE_BAND.1 {
                    warn!(
                        "acceptance rate {r:.3} is outside {ACCEPTANCE_BAND:?}; consider changing {name}"
                    );
                }
            }
        }
    }
}

fn rate(accepted: u64, proposed: u64) -> Option<f64> {
    (proposed > 0).then(|| accepted as f64 / proposed as f64)
}

/// Point estimates derived from the post burn-in part of the traces.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    /// Posterior mean of `A`, zeroed where the inclusion probability is below the threshold.
    pub a: Array2<f64>,
    /// Posterior mean of `B`, zeroed the same way.
    pub b: Array2<f64>,
    /// Posterior inclusion probabilities of `A` (mean of `Gamma`).
    pub gamma_prob: Array2<f64>,
    /// Posterior inclusion probabilities of `B` (mean of `Phi`).
    pub phi_prob: Array2<f64>,
    /// Unthresholded posterior mean of `A`.
    pub a_mean: Array2<f64>,
    /// Unthresholded posterior mean of `B`.
    pub b_mean: Array2<f64>,
}

fn column_mean(trace: &Array2<f64>, burn_in: usize, shape: (usize, usize)) -> Result<Array2<f64>> {
    let kept = trace.slice(s![.., burn_in..]);
    let mean = if kept.nrows() == 0 {
        Array1::zeros(0)
    } else {
        kept.mean_axis(Axis(1)).ok_or(RgmError::TooFewIterations {
            min: burn_in + 1,
            found: trace.ncols(),
        })?
    };
    Ok(mean.into_shape_with_order(shape)?)
}

fn threshold(mean: &Array2<f64>, prob: &Array2<f64>) -> Array2<f64> {
    let mut out = mean.clone();
    Zip::from(&mut out).and(prob).for_each(|v, &pr| {
        if pr < INCLUSION_THRESHOLD {
            *v = 0.0;
        }
    });
    out
}

/**
Discards the first `burn_in` columns, averages the rest, and zeroes every
interaction whose averaged indicator is below [`INCLUSION_THRESHOLD`].

# Examples

```rust
use ndarray::arr2;
use rgm_mcmc::core::Traces;
use rgm_mcmc::stats::summarize;

let mut traces = Traces::new(2, 1, 4);
// A[0, 1] is included in three of the four draws.
traces.a.row_mut(1).assign(&ndarray::arr1(&[0.0, 0.4, 0.6, 0.8]));
traces.gamma.row_mut(1).assign(&ndarray::arr1(&[0.0, 1.0, 1.0, 1.0]));
let post = summarize(&traces, 1).unwrap();
assert_eq!(post.gamma_prob, arr2(&[[0.0, 1.0], [0.0, 0.0]]));
assert!((post.a[[0, 1]] - 0.6).abs() < 1e-12);
```
*/
pub fn summarize(traces: &Traces, burn_in: usize) -> Result<Posterior> {
    let niter = traces.n_iterations();
    if burn_in >= niter {
        return Err(RgmError::TooFewIterations {
            min: burn_in + 1,
            found: niter,
        });
    }
    let p = traces.n_genes();
    let k = traces.n_covariates();
    let a_mean = column_mean(&traces.a, burn_in, (p, p))?;
    let gamma_prob = column_mean(&traces.gamma, burn_in, (p, p))?;
    let b_mean = column_mean(&traces.b, burn_in, (p, k))?;
    let phi_prob = column_mean(&traces.phi, burn_in, (p, k))?;
    Ok(Posterior {
        a: threshold(&a_mean, &gamma_prob),
        b: threshold(&b_mean, &phi_prob),
        gamma_prob,
        phi_prob,
        a_mean,
        b_mean,
    })
}

/// Convergence view of the log-likelihood trace.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLikSummary {
    /// Largest log-likelihood seen up to each iteration.
    pub running_max: Array1<f64>,
    pub max: f64,
    pub first_window_mean: f64,
    pub first_window_var: f64,
    pub last_window_mean: f64,
    pub last_window_var: f64,
    pub window: usize,
}

/// Trace index `i` holds the state after sweep `i + 1`.
fn non_finite_at(i: usize) -> RgmError {
    RgmError::NonFiniteLikelihood { iteration: i + 1 }
}

/// Summarizes `trace` with windows of `window` iterations at each end
/// (clamped to half the trace).
pub fn log_likelihood_summary(trace: &Array1<f64>, window: usize) -> Result<LogLikSummary> {
    let n = trace.len();
    if n < 2 {
        return Err(RgmError::TooFewIterations { min: 2, found: n });
    }
    if let Some(i) = trace.iter().position(|v| !v.is_finite()) {
        return Err(non_finite_at(i));
    }
    let window = window.min(n / 2).max(1);
    let mut best = f64::NEG_INFINITY;
    let running_max = trace.mapv(|v| {
        best = best.max(v);
        best
    });
    let max = *trace.max().map_err(|_| {
        non_finite_at(trace.iter().position(|v| v.is_nan()).unwrap_or(n - 1))
    })?;
    let first = trace.slice(s![..window]);
    let last = trace.slice(s![n - window..]);
    Ok(LogLikSummary {
        running_max,
        max,
        first_window_mean: first.mean().unwrap_or(f64::NAN),
        first_window_var: first.var(0.0),
        last_window_mean: last.mean().unwrap_or(f64::NAN),
        last_window_var: last.var(0.0),
        window,
    })
}
