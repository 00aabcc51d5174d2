//! Chain driver: pre-sized trace buffers and the loops that fill them.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use ndarray::{Array1, Array2};
use std::time::Instant;

use crate::error::Result;
use crate::gibbs::SweepStats;
use crate::state::ModelState;
use crate::stats::AcceptanceTracker;

pub trait MarkovChain {
    /// Does one full sweep of the chain, mutating its state in place.
    fn step(&mut self) -> Result<SweepStats>;

    /// Get the current state without stepping.
    fn current_state(&self) -> &ModelState;
}

/**
Per-iteration record of the chain.

Column `i` of each matrix buffer is the flattened state after iteration `i`.
Matrices are flattened row-major, so entry `(j, l)` of a `p × q` parameter
lives in row `j * q + l`. Buffers are allocated once for the full run.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Traces {
    /// `p² × niter`
    pub a: Array2<f64>,
    /// `p² × niter`
    pub gamma: Array2<f64>,
    /// `p·k × niter`
    pub b: Array2<f64>,
    /// `p·k × niter`
    pub phi: Array2<f64>,
    pub rho: Array1<f64>,
    pub psi: Array1<f64>,
    pub log_likelihood: Array1<f64>,
    n_genes: usize,
    n_covariates: usize,
}

impl Traces {
    pub fn new(n_genes: usize, n_covariates: usize, niter: usize) -> Self {
        let pp = n_genes * n_genes;
        let pk = n_genes * n_covariates;
        Self {
            a: Array2::zeros((pp, niter)),
            gamma: Array2::zeros((pp, niter)),
            b: Array2::zeros((pk, niter)),
            phi: Array2::zeros((pk, niter)),
            rho: Array1::zeros(niter),
            psi: Array1::zeros(niter),
            log_likelihood: Array1::zeros(niter),
            n_genes,
            n_covariates,
        }
    }

    /// Writes the state after iteration `i` into column `i`.
    pub fn record(&mut self, i: usize, state: &ModelState, log_likelihood: f64) {
        fn put(buffer: &mut Array2<f64>, i: usize, m: &Array2<f64>) {
            buffer
                .column_mut(i)
                .iter_mut()
                .zip(m.iter())
                .for_each(|(dst, &src)| *dst = src);
        }
        put(&mut self.a, i, &state.a);
        put(&mut self.gamma, i, &state.gamma);
        put(&mut self.b, i, &state.b);
        put(&mut self.phi, i, &state.phi);
        self.rho[i] = state.rho;
        self.psi[i] = state.psi;
        self.log_likelihood[i] = log_likelihood;
    }

    pub fn n_iterations(&self) -> usize {
        self.log_likelihood.len()
    }

    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    pub fn n_covariates(&self) -> usize {
        self.n_covariates
    }
}

/// Traces of a finished run plus acceptance bookkeeping.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub traces: Traces,
    pub acceptance: AcceptanceTracker,
}

fn run_inner<M, F>(chain: &mut M, niter: usize, mut on_step: F) -> Result<ChainOutput>
where
    M: MarkovChain,
    F: FnMut(usize),
{
    let p = chain.current_state().n_genes();
    let k = chain.current_state().n_covariates();
    let mut traces = Traces::new(p, k, niter);
    let mut acceptance = AcceptanceTracker::default();
    let started = Instant::now();

    info!("starting chain: p = {p}, k = {k}, niter = {niter}");
    for i in 0..niter {
        let stats = chain.step()?;
        acceptance.step(&stats);
        traces.record(i, chain.current_state(), stats.log_likelihood);
        if (i + 1) % 1000 == 0 {
            debug!(
                "iteration {}: log-likelihood {:.4}",
                i + 1,
                stats.log_likelihood
            );
        }
        on_step(i);
    }
    info!(
        "chain finished in {:.2?}: acceptance A = {}, B = {}",
        started.elapsed(),
        fmt_rate(acceptance.rate_a()),
        fmt_rate(acceptance.rate_b()),
    );
    acceptance.warn_if_poorly_tuned();

    Ok(ChainOutput { traces, acceptance })
}

fn fmt_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"))
}

/// Runs `niter` sweeps and records every one of them. A failed sweep aborts the run.
pub fn run_chain<M: MarkovChain>(chain: &mut M, niter: usize) -> Result<ChainOutput> {
    run_inner(chain, niter, |_| {})
}

/// Same as [`run_chain`], advancing `pb` once per sweep.
pub fn run_chain_with_progress<M: MarkovChain>(
    chain: &mut M,
    niter: usize,
    pb: &ProgressBar,
) -> Result<ChainOutput> {
    pb.set_length(niter as u64);
    let out = run_inner(chain, niter, |_| pb.inc(1))?;
    pb.finish_with_message("Done!");
    Ok(out)
}

/// Progress bar in the style used by every sampler of this crate.
pub fn progress_bar(niter: usize) -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
        .progress_chars("##-");
    let pb = ProgressBar::new(niter as u64);
    pb.set_prefix("Chain");
    pb.set_style(style);
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    /// Deterministic stand-in that adds one to every free entry per step.
    struct CountingChain {
        state: ModelState,
    }

    impl MarkovChain for CountingChain {
        fn step(&mut self) -> Result<SweepStats> {
            self.state.a[[0, 1]] += 1.0;
            self.state.b[[1, 0]] += 1.0;
            Ok(SweepStats {
                log_likelihood: -self.state.a[[0, 1]],
                accepted_a: 1,
                proposed_a: 2,
                accepted_b: 0,
                proposed_b: 1,
            })
        }

        fn current_state(&self) -> &ModelState {
            &self.state
        }
    }

    fn counting() -> CountingChain {
        CountingChain {
            state: ModelState {
                a: Array2::zeros((2, 2)),
                gamma: arr2(&[[0.0, 1.0], [0.0, 0.0]]),
                tau: Array2::ones((2, 2)),
                b: Array2::zeros((2, 1)),
                phi: Array2::zeros((2, 1)),
                eta: Array2::ones((2, 1)),
                rho: 0.5,
                psi: 0.25,
                sigma_inv: arr1(&[1.0, 1.0]),
            },
        }
    }

    #[test]
    fn traces_have_one_column_per_iteration() {
        let mut chain = counting();
        let out = run_chain(&mut chain, 5).unwrap();
        let t = &out.traces;
        assert_eq!(t.a.dim(), (4, 5));
        assert_eq!(t.b.dim(), (2, 5));
        assert_eq!(t.n_iterations(), 5);
        // Row-major flattening: A[0, 1] is row 1, B[1, 0] is row 1.
        assert_eq!(t.a.row(1), arr1(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(t.b.row(1), arr1(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(t.gamma.row(1), arr1(&[1.0; 5]));
        assert_eq!(t.log_likelihood, arr1(&[-1.0, -2.0, -3.0, -4.0, -5.0]));
        assert_eq!(t.psi, arr1(&[0.25; 5]));
        assert_eq!(out.acceptance.rate_a(), Some(0.5));
        assert_eq!(out.acceptance.rate_b(), Some(0.0));
    }

    #[test]
    fn progress_run_matches_plain_run() {
        let plain = run_chain(&mut counting(), 7).unwrap();
        let pb = ProgressBar::hidden();
        let with_pb = run_chain_with_progress(&mut counting(), 7, &pb).unwrap();
        assert_eq!(plain.traces, with_pb.traces);
        assert_eq!(pb.position(), 7);
    }

    #[test]
    fn progress_bar_template_is_valid() {
        assert!(progress_bar(10).is_ok());
    }
}
