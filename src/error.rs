//! Error type shared by the validation layer and the sampler.

use thiserror::Error;

/// Everything that can go wrong while setting up or running the chain.
///
/// Validation variants are raised before any latent parameter is initialized.
/// The numerical variants abort a running chain: a failed draw is never
/// retried or clamped.
#[derive(Debug, Error)]
pub enum RgmError {
    #[error("dimension mismatch for {what}: expected {expected:?}, got {found:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("at least {min} {what} are required, got {found}")]
    TooSmall {
        what: &'static str,
        min: usize,
        found: usize,
    },
    #[error("structural mask entry D[{row}, {col}] = {value} is not 0 or 1")]
    InvalidMask { row: usize, col: usize, value: f64 },
    #[error("initial interaction matrix has nonzero diagonal entry A0[{index}, {index}] = {value}")]
    NonZeroDiagonal { index: usize, value: f64 },
    #[error("hyperparameter `{name}` must be positive and finite, got {value}")]
    NonPositiveHyperparameter { name: &'static str, value: f64 },
    #[error("{what} contains a non-finite value at ({row}, {col})")]
    NonFiniteInput {
        what: &'static str,
        row: usize,
        col: usize,
    },
    #[error("niter = {found} is below the minimum of {min}")]
    TooFewIterations { min: usize, found: usize },
    #[error("could not build {what} distribution: {message}")]
    Distribution { what: &'static str, message: String },
    #[error("degenerate draw for {parameter}: {value}")]
    DegenerateDraw { parameter: &'static str, value: f64 },
    #[error("I - A is singular; the structural system has no unique solution")]
    SingularSystem,
    #[error("log-likelihood is not finite at iteration {iteration}")]
    NonFiniteLikelihood { iteration: usize },
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Progress(#[from] indicatif::style::TemplateError),
    #[cfg(feature = "csv")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RgmError>;
