#[cfg(feature = "csv")]
pub mod csv;
