/*!
Full-conditional draws for the conjugate parameters of the model, and the
spike-and-slab log prior used by the Metropolis updaters.

Every draw takes the random number generator explicitly, so a chain seeded
once is reproducible bit for bit.

| Parameter | Full conditional |
|---|---|
| `rho` | `Beta(a_rho + #{Gamma = 1}, b_rho + #{Gamma = 0})`, off-diagonal only |
| `psi` | `Beta(a_psi + #{Phi = 1}, b_psi + #{Phi = 0})`, restricted to `D = 1` |
| `tau`, `eta` | `InvGamma(a + 1/2, b + x² / (2 s))`, `s = 1` (slab) or `nu` (spike) |
| `sigma_inv[j]` | `Gamma(a_sigma + n/2, rate = b_sigma + SSR_j / 2)` |

# Examples

```rust
use rgm_mcmc::distributions::draw_slab_variance;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let mut rng = SmallRng::seed_from_u64(42);
let tau = draw_slab_variance(&mut rng, 0.3, 1.0, 0.01, 0.01, 1e-4).unwrap();
assert!(tau > 0.0);
```
*/

use ndarray::Array2;
use rand::Rng;
use rand_distr::{Beta, Distribution, Gamma, Normal};

use crate::error::{Result, RgmError};

const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// `log N(x; 0, var)`.
#[inline]
pub fn normal_log_density(x: f64, var: f64) -> f64 {
    -0.5 * (LN_2PI + var.ln()) - x * x / (2.0 * var)
}

/**
Log prior of one spike-and-slab entry together with its indicator:

\[
\log p(x, g) = \log \mathcal{N}(x; 0, s\,v) + g \log \pi + (1 - g) \log(1 - \pi),
\quad s = 1 \text{ if } g = 1 \text{ else } \nu
\]

where `v` is the slab variance (`tau` or `eta`), `nu` the spike ratio and `pi`
the inclusion probability (`rho` or `psi`).
*/
pub fn spike_slab_log_prior(x: f64, indicator: f64, slab_var: f64, nu: f64, incl: f64) -> f64 {
    if indicator == 1.0 {
        normal_log_density(x, slab_var) + incl.ln()
    } else {
        normal_log_density(x, nu * slab_var) + (1.0 - incl).ln()
    }
}

fn beta_draw<R: Rng + ?Sized>(
    rng: &mut R,
    parameter: &'static str,
    alpha: f64,
    beta: f64,
) -> Result<f64> {
    let dist = Beta::new(alpha, beta).map_err(|e| RgmError::Distribution {
        what: "Beta",
        message: e.to_string(),
    })?;
    let v = dist.sample(rng);
    // Exactly 0 or 1 would put a log(0) into every later acceptance ratio.
    if v > 0.0 && v < 1.0 {
        Ok(v)
    } else {
        Err(RgmError::DegenerateDraw {
            parameter,
            value: v,
        })
    }
}

fn gamma_draw<R: Rng + ?Sized>(rng: &mut R, shape: f64, rate: f64) -> Result<f64> {
    let dist = Gamma::new(shape, 1.0 / rate).map_err(|e| RgmError::Distribution {
        what: "Gamma",
        message: e.to_string(),
    })?;
    Ok(dist.sample(rng))
}

fn positive(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RgmError::DegenerateDraw { parameter, value })
    }
}

/// Draws `rho` given the current `Gamma` (`p × p`); the diagonal is ignored.
pub fn draw_rho<R: Rng + ?Sized>(
    rng: &mut R,
    gamma: &Array2<f64>,
    a_rho: f64,
    b_rho: f64,
) -> Result<f64> {
    let p = gamma.nrows();
    let ones: f64 = gamma
        .indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, &g)| g)
        .sum();
    let zeros = (p * (p - 1)) as f64 - ones;
    beta_draw(rng, "rho", a_rho + ones, b_rho + zeros)
}

/// Draws `psi` given the current `Phi` (`p × k`), counting only positions with `D = 1`.
pub fn draw_psi<R: Rng + ?Sized>(
    rng: &mut R,
    phi: &Array2<f64>,
    d: &Array2<f64>,
    a_psi: f64,
    b_psi: f64,
) -> Result<f64> {
    let (ones, allowed) = phi
        .iter()
        .zip(d.iter())
        .filter(|(_, &m)| m != 0.0)
        .fold((0.0, 0.0), |(ones, allowed), (&f, _)| (ones + f, allowed + 1.0));
    beta_draw(rng, "psi", a_psi + ones, b_psi + allowed - ones)
}

/**
Draws the slab variance of one interaction magnitude `x` with indicator
`indicator`, under an `InvGamma(a, b)` prior and spike ratio `nu`.

Used for both `tau` (entries of `A`) and `eta` (entries of `B`).
*/
pub fn draw_slab_variance<R: Rng + ?Sized>(
    rng: &mut R,
    x: f64,
    indicator: f64,
    a: f64,
    b: f64,
    nu: f64,
) -> Result<f64> {
    let scale = if indicator == 1.0 { 1.0 } else { nu };
    let precision = gamma_draw(rng, a + 0.5, b + x * x / (2.0 * scale))?;
    positive("slab variance", 1.0 / precision)
}

/// Draws `tau[j, l]` for `A[j, l] = a` with indicator `gamma`.
pub fn draw_tau<R: Rng + ?Sized>(
    rng: &mut R,
    a: f64,
    gamma: f64,
    a_tau: f64,
    b_tau: f64,
    nu_1: f64,
) -> Result<f64> {
    draw_slab_variance(rng, a, gamma, a_tau, b_tau, nu_1)
}

/// Draws `eta[j, l]` for `B[j, l] = b` with indicator `phi`.
pub fn draw_eta<R: Rng + ?Sized>(
    rng: &mut R,
    b: f64,
    phi: f64,
    a_eta: f64,
    b_eta: f64,
    nu_2: f64,
) -> Result<f64> {
    draw_slab_variance(rng, b, phi, a_eta, b_eta, nu_2)
}

/// Draws the residual precision of one gene equation from its sum of squared residuals.
pub fn draw_sigma_inv<R: Rng + ?Sized>(
    rng: &mut R,
    ssr: f64,
    n: usize,
    a_sigma: f64,
    b_sigma: f64,
) -> Result<f64> {
    let v = gamma_draw(rng, a_sigma + n as f64 / 2.0, b_sigma + ssr / 2.0)?;
    positive("sigma_inv", v)
}

/// Prior draw of an inverse-gamma slab variance, used at initialization.
pub fn draw_inv_gamma<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> Result<f64> {
    let precision = gamma_draw(rng, a, b)?;
    positive("slab variance", 1.0 / precision)
}

/// Prior draw of an inclusion probability from `Beta(a, b)`.
pub fn draw_inclusion_prob<R: Rng + ?Sized>(
    rng: &mut R,
    parameter: &'static str,
    a: f64,
    b: f64,
) -> Result<f64> {
    beta_draw(rng, parameter, a, b)
}

/// Prior draw of a residual precision from `Gamma(a, rate = b)`.
pub fn draw_precision<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> Result<f64> {
    let v = gamma_draw(rng, a, b)?;
    positive("sigma_inv", v)
}

/// Draws `N(mean, var)`.
pub fn draw_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, var: f64) -> Result<f64> {
    let dist = Normal::new(mean, var.sqrt()).map_err(|e| RgmError::Distribution {
        what: "Normal",
        message: e.to_string(),
    })?;
    let v = dist.sample(rng);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RgmError::DegenerateDraw {
            parameter: "normal proposal",
            value: v,
        })
    }
}
