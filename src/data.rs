//! CSV loading of dense numeric vectors using Polars

use anyhow::{bail, Context};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Vectors read from a CSV file, one row per vector
#[derive(Debug, Clone)]
pub struct VectorData {
    /// Raw feature matrix (n_rows, n_features), not normalized
    pub features: Array2<f64>,
    /// Column names in feature order
    pub column_names: Vec<String>,
}

impl VectorData {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Turn user-supplied values into a feature vector of the loaded width
    pub fn to_feature_vector(&self, values: &[f64]) -> crate::AppResult<Array1<f64>> {
        if values.len() != self.n_features() {
            bail!(
                "Vector must have exactly {} values (columns: {}), got {}",
                self.n_features(),
                self.column_names.join(","),
                values.len()
            );
        }
        Ok(Array1::from(values.to_vec()))
    }
}

/// Load a CSV file whose every column is numeric
///
/// # Arguments
/// * `file_path` - Path to the CSV file
/// * `has_header` - Whether the first line holds column names
///
/// # Returns
/// * `VectorData` with one row per CSV record
pub fn load_vectors(file_path: &str, has_header: bool) -> crate::AppResult<VectorData> {
    let df = CsvReadOptions::default()
        .with_has_header(has_header)
        .try_into_reader_with_file_path(Some(file_path.into()))?
        .finish()
        .with_context(|| format!("Failed to read CSV file {}", file_path))?;

    if df.height() == 0 || df.width() == 0 {
        bail!("No data found in {}", file_path);
    }

    dataframe_to_matrix(&df)
}

/// Copy every column into an ndarray matrix, casting to f64
fn dataframe_to_matrix(df: &DataFrame) -> crate::AppResult<VectorData> {
    let mut features = Array2::<f64>::zeros((df.height(), df.width()));
    let mut column_names = Vec::with_capacity(df.width());

    for (col_idx, series) in df.get_columns().iter().enumerate() {
        if series.null_count() > 0 {
            bail!("Column '{}' contains missing values", series.name());
        }

        let values = series
            .strict_cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is not numeric", series.name()))?;

        for (row_idx, value) in values.f64()?.into_no_null_iter().enumerate() {
            features[[row_idx, col_idx]] = value;
        }
        column_names.push(series.name().to_string());
    }

    Ok(VectorData {
        features,
        column_names,
    })
}
