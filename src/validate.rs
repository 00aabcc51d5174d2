//! Input checks run before any latent parameter is initialized.
//!
//! The sampler itself assumes everything here holds and does not re-check it.

use ndarray::{Array2, ArrayView2};

use crate::error::{Result, RgmError};
use crate::params::MIN_ITERATIONS;

/// Observed data and structural mask, validated and immutable for the run.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Covariates, `n × k`.
    pub x: Array2<f64>,
    /// Expression, `n × p`.
    pub y: Array2<f64>,
    /// Structural mask, `p × k`, entries in {0, 1}.
    pub d: Array2<f64>,
    /// `Yᵀ`, `p × n`; cached because every residual is computed gene-major.
    pub yt: Array2<f64>,
    /// `Xᵀ`, `k × n`.
    pub xt: Array2<f64>,
}

impl ModelData {
    /// Validates `x` (`n × k`), `y` (`n × p`) and the optional mask `d`
    /// (`p × k`, all-ones when absent).
    pub fn new(x: Array2<f64>, y: Array2<f64>, d: Option<Array2<f64>>) -> Result<Self> {
        let (n, k) = x.dim();
        let (n_y, p) = y.dim();
        if n_y != n {
            return Err(RgmError::DimensionMismatch {
                what: "Y (rows must match X)",
                expected: (n, p),
                found: (n_y, p),
            });
        }
        if n == 0 {
            return Err(RgmError::TooSmall {
                what: "samples",
                min: 1,
                found: 0,
            });
        }
        if p < 2 {
            return Err(RgmError::TooSmall {
                what: "genes",
                min: 2,
                found: p,
            });
        }
        check_finite("X", x.view())?;
        check_finite("Y", y.view())?;

        let d = match d {
            Some(d) => {
                check_shape("D", &d, (p, k))?;
                check_binary(d.view())?;
                d
            }
            None => Array2::ones((p, k)),
        };

        let yt = y.t().to_owned();
        let xt = x.t().to_owned();
        Ok(Self { x, y, d, yt, xt })
    }

    pub fn n_samples(&self) -> usize {
        self.y.nrows()
    }

    pub fn n_genes(&self) -> usize {
        self.y.ncols()
    }

    pub fn n_covariates(&self) -> usize {
        self.x.ncols()
    }
}

pub(crate) fn check_shape(
    what: &'static str,
    m: &Array2<f64>,
    expected: (usize, usize),
) -> Result<()> {
    if m.dim() != expected {
        return Err(RgmError::DimensionMismatch {
            what,
            expected,
            found: m.dim(),
        });
    }
    Ok(())
}

pub(crate) fn check_finite(what: &'static str, m: ArrayView2<f64>) -> Result<()> {
    match m.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), _)) => Err(RgmError::NonFiniteInput { what, row, col }),
        None => Ok(()),
    }
}

fn check_binary(d: ArrayView2<f64>) -> Result<()> {
    match d.indexed_iter().find(|(_, &v)| v != 0.0 && v != 1.0) {
        Some(((row, col), &value)) => Err(RgmError::InvalidMask { row, col, value }),
        None => Ok(()),
    }
}

/// Checks a caller-supplied starting interaction matrix `A0` (`p × p`, zero diagonal).
pub fn check_initial_a(a0: &Array2<f64>, p: usize) -> Result<()> {
    check_shape("A0", a0, (p, p))?;
    check_finite("A0", a0.view())?;
    match (0..p).find(|&i| a0[[i, i]] != 0.0) {
        Some(index) => Err(RgmError::NonZeroDiagonal {
            index,
            value: a0[[index, index]],
        }),
        None => Ok(()),
    }
}

/// Checks a caller-supplied starting covariate matrix `B0` (`p × k`).
pub fn check_initial_b(b0: &Array2<f64>, p: usize, k: usize) -> Result<()> {
    check_shape("B0", b0, (p, k))?;
    check_finite("B0", b0.view())
}

pub fn check_iterations(niter: usize) -> Result<()> {
    if niter < MIN_ITERATIONS {
        return Err(RgmError::TooFewIterations {
            min: MIN_ITERATIONS,
            found: niter,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    fn data(n: usize, p: usize, k: usize) -> (Array2<f64>, Array2<f64>) {
        (Array2::zeros((n, k)), Array2::zeros((n, p)))
    }

    #[test]
    fn default_mask_is_all_ones() {
        let (x, y) = data(5, 3, 2);
        let md = ModelData::new(x, y, None).unwrap();
        assert_eq!(md.d, Array2::<f64>::ones((3, 2)));
        assert_eq!(md.yt.dim(), (3, 5));
        assert_eq!(md.xt.dim(), (2, 5));
    }

    #[test]
    fn rejects_row_mismatch() {
        let err = ModelData::new(Array2::zeros((4, 2)), Array2::zeros((5, 3)), None).unwrap_err();
        assert!(matches!(err, RgmError::DimensionMismatch { .. }));
    }

    #[test]
    fn rejects_single_gene() {
        let (x, y) = data(5, 1, 2);
        assert!(matches!(
            ModelData::new(x, y, None),
            Err(RgmError::TooSmall { what: "genes", .. })
        ));
    }

    #[test]
    fn rejects_non_binary_mask() {
        let (x, y) = data(5, 2, 2);
        let d = arr2(&[[1.0, 0.0], [0.5, 1.0]]);
        match ModelData::new(x, y, Some(d)) {
            Err(RgmError::InvalidMask { row, col, value }) => {
                assert_eq!((row, col), (1, 0));
                assert_eq!(value, 0.5);
            }
            other => panic!("expected InvalidMask, got {other:?}"),
        }
    }

    #[test]
    fn rejects_mask_of_wrong_shape() {
        let (x, y) = data(5, 2, 2);
        let err = ModelData::new(x, y, Some(Array2::ones((2, 3)))).unwrap_err();
        assert!(matches!(err, RgmError::DimensionMismatch { what: "D", .. }));
    }

    #[test]
    fn rejects_nan_in_expression() {
        let (x, mut y) = data(5, 2, 2);
        y[[3, 1]] = f64::NAN;
        assert!(matches!(
            ModelData::new(x, y, None),
            Err(RgmError::NonFiniteInput {
                what: "Y",
                row: 3,
                col: 1
            })
        ));
    }

    #[test]
    fn initial_a_needs_zero_diagonal() {
        let a0 = arr2(&[[0.0, 0.2], [0.1, 0.3]]);
        assert!(matches!(
            check_initial_a(&a0, 2),
            Err(RgmError::NonZeroDiagonal { index: 1, .. })
        ));
        assert!(check_initial_a(&arr2(&[[0.0, 0.2], [0.1, 0.0]]), 2).is_ok());
    }

    #[test]
    fn iteration_floor() {
        assert!(check_iterations(MIN_ITERATIONS - 1).is_err());
        assert!(check_iterations(MIN_ITERATIONS).is_ok());
    }
}
