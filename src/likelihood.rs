/*!
Gaussian likelihood of the reciprocal structural equation model

\[
Y (I - A)^\top = X B^\top + E, \qquad E_{ij} \sim \mathcal{N}(0, 1 / \sigma^{-1}_j).
\]

Because `A` may contain cycles, the density of `Y` carries the Jacobian
`n log|det(I - A)|` on top of the per-gene normal terms. Residuals are kept
gene-major (`p × n`), so row `j` is the residual of gene `j`'s equation.
*/

use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use rayon::prelude::*;

use crate::error::{Result, RgmError};
use crate::validate::ModelData;

const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// `(I - A) Yᵀ`, shape `p × n`.
pub fn structural_term(a: &Array2<f64>, data: &ModelData) -> Array2<f64> {
    &data.yt - &a.dot(&data.yt)
}

/// `(I - A) Yᵀ - B Xᵀ`, shape `p × n`.
pub fn residuals(a: &Array2<f64>, b: &Array2<f64>, data: &ModelData) -> Array2<f64> {
    residuals_from(&structural_term(a, data), b, data)
}

/// Residuals from a precomputed `(I - A) Yᵀ`.
pub fn residuals_from(structural: &Array2<f64>, b: &Array2<f64>, data: &ModelData) -> Array2<f64> {
    structural - &b.dot(&data.xt)
}

/// Sum of squared residuals of every gene equation. Rows are independent, so
/// they are reduced in parallel; the result order is the row order.
pub fn row_ssr(resid: &Array2<f64>) -> Array1<f64> {
    let ssr: Vec<f64> = resid
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| row.dot(&row))
        .collect();
    Array1::from(ssr)
}

/// Sum of squares of `row - delta * column`, the residual row after one
/// coefficient of that equation moves by `delta`.
pub fn shifted_ssr(row: ArrayView1<f64>, column: ArrayView1<f64>, delta: f64) -> f64 {
    row.iter()
        .zip(column.iter())
        .map(|(r, c)| {
            let e = r - delta * c;
            e * e
        })
        .sum()
}

fn to_nalgebra(m: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[[i, j]])
}

fn i_minus(a: &Array2<f64>) -> Array2<f64> {
    Array2::eye(a.nrows()) - a
}

/// `log |det(I - A)|`; `-inf` when `I - A` is singular.
pub fn log_abs_det(a: &Array2<f64>) -> f64 {
    let lu = to_nalgebra(&i_minus(a)).lu();
    lu.u().diagonal().iter().map(|u| u.abs().ln()).sum()
}

/**
Full log-likelihood of `Y` given `A`, `B` and the residual precisions.

\[
\ell = n \log|\det(I - A)| + \sum_j \Big[\tfrac{n}{2}\log\sigma^{-1}_j
      - \tfrac{n}{2}\log 2\pi - \tfrac{1}{2}\sigma^{-1}_j \mathrm{SSR}_j\Big]
\]

# Examples

```rust
use ndarray::{arr2, Array1, Array2};
use rgm_mcmc::likelihood::log_likelihood;
use rgm_mcmc::validate::ModelData;

let x = arr2(&[[1.0], [0.0]]);
let y = arr2(&[[0.0, 0.0], [0.0, 0.0]]);
let data = ModelData::new(x, y, None).unwrap();
let ll = log_likelihood(
    &Array2::zeros((2, 2)),
    &Array2::zeros((2, 1)),
    &Array1::ones(2),
    &data,
);
// Four standard normal densities evaluated at zero.
assert!((ll + 2.0 * (2.0 * std::f64::consts::PI).ln()).abs() < 1e-12);
```
*/
pub fn log_likelihood(
    a: &Array2<f64>,
    b: &Array2<f64>,
    sigma_inv: &Array1<f64>,
    data: &ModelData,
) -> f64 {
    let ssr = row_ssr(&residuals(a, b, data));
    log_likelihood_from_ssr(log_abs_det(a), &ssr, sigma_inv, data.n_samples())
}

/// Same as [`log_likelihood`] from already reduced pieces.
pub fn log_likelihood_from_ssr(
    log_det: f64,
    ssr: &Array1<f64>,
    sigma_inv: &Array1<f64>,
    n: usize,
) -> f64 {
    let n = n as f64;
    let mut gene_terms = 0.0;
    Zip::from(ssr).and(sigma_inv).for_each(|&s, &prec| {
        gene_terms += 0.5 * n * (prec.ln() - LN_2PI) - 0.5 * prec * s;
    });
    n * log_det + gene_terms
}

/**
Running `(I - A)⁻¹` for one pass over the entries of `A`.

Moving `A[j, l]` by `delta` is the rank-one change `I - A' = (I - A) - delta e_j e_lᵀ`,
so the determinant ratio is `1 - delta (I - A)⁻¹[l, j]` and an accepted move is
folded in with Sherman-Morrison in `O(p²)`. The inverse is rebuilt from scratch
at the start of every pass to keep rounding from accumulating.
*/
#[derive(Debug, Clone)]
pub struct StructuralInverse {
    inv: Array2<f64>,
}

impl StructuralInverse {
    pub fn new(a: &Array2<f64>) -> Result<Self> {
        let p = a.nrows();
        let inv = to_nalgebra(&i_minus(a))
            .try_inverse()
            .ok_or(RgmError::SingularSystem)?;
        Ok(Self {
            inv: Array2::from_shape_fn((p, p), |(i, j)| inv[(i, j)]),
        })
    }

    /// `log |det(I - A')| - log |det(I - A)|` for `A'[j, l] = A[j, l] + delta`.
    pub fn log_det_ratio(&self, j: usize, l: usize, delta: f64) -> f64 {
        (1.0 - delta * self.inv[[l, j]]).abs().ln()
    }

    /// Applies an accepted move of `A[j, l]` by `delta`.
    pub fn update(&mut self, j: usize, l: usize, delta: f64) -> Result<()> {
        let denom = 1.0 - delta * self.inv[[l, j]];
        if denom == 0.0 || !denom.is_finite() {
            return Err(RgmError::SingularSystem);
        }
        let col = self.inv.column(j).to_owned();
        let row = self.inv.row(l).to_owned();
        let scale = delta / denom;
        Zip::indexed(&mut self.inv).for_each(|(r, c), v| *v += scale * col[r] * row[c]);
        Ok(())
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.inv
    }
}
