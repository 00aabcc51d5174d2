//! Spike-and-slab MCMC for reciprocal graphical models of gene regulation.
//!
//! Most users only need [`ReciprocalGraphicalModel`]; the lower-level modules
//! expose the individual conditional updates and the chain driver.

pub mod core;
pub mod distributions;
pub mod error;
pub mod gibbs;
#[cfg(feature = "csv")]
pub mod io;
pub mod likelihood;
pub mod metropolis_hastings;
pub mod model;
pub mod params;
pub mod state;
pub mod stats;
pub mod validate;

pub use error::{Result, RgmError};
pub use model::{ReciprocalGraphicalModel, RgmFit};
pub use params::Hyperparameters;
