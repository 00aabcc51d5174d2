/*!
# Saving chain output to CSV

Enable via the `csv` feature.
*/

use csv::Writer;
use ndarray::{Array1, Array2};
use std::fs::File;
use std::path::Path;

use crate::error::Result;

/**
Saves a trace buffer (`dimension × iteration`) as a CSV file with one row per
iteration.

The header is `iteration,dim_0,dim_1,...`; `dim_r` is row `r` of the buffer,
i.e. entry `(r / q, r % q)` of the flattened `p × q` parameter.

# Examples

```rust
use ndarray::arr2;
use rgm_mcmc::io::csv::save_trace_csv;

// Two flattened entries, three iterations.
let trace = arr2(&[[0.1, 0.2, 0.3], [1.0, 1.0, 0.0]]);
let file = tempfile::NamedTempFile::new()?;
save_trace_csv(&trace, file.path())?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_trace_csv<P: AsRef<Path>>(trace: &Array2<f64>, path: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(path)?);

    let mut header = vec!["iteration".to_string()];
    header.extend((0..trace.nrows()).map(|i| format!("dim_{}", i)));
    wtr.write_record(&header)?;

    for (i, column) in trace.columns().into_iter().enumerate() {
        let mut row = vec![i.to_string()];
        row.extend(column.iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Saves a scalar trace (e.g. the log-likelihood) with header `iteration,value`.
pub fn save_scalar_trace_csv<P: AsRef<Path>>(trace: &Array1<f64>, path: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(path)?);
    wtr.write_record(["iteration", "value"])?;
    for (i, v) in trace.iter().enumerate() {
        wtr.write_record([i.to_string(), v.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Saves a matrix row by row without a header, e.g. the estimated `A` or `B`.
pub fn save_matrix_csv<P: AsRef<Path>>(matrix: &Array2<f64>, path: P) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    for row in matrix.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
