//! Error type for the clustering library

use thiserror::Error;

/// Errors surfaced by configuring or fitting a [`CosineCluster`](crate::CosineCluster)
#[derive(Debug, Error)]
pub enum CosineClusterError {
    /// Group count or iteration cap is unusable for the given input
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input row cannot be normalized to a unit vector
    #[error("degenerate input at row {row}: {reason}")]
    DegenerateInput { row: usize, reason: String },

    /// A vector handed to the fitted model has the wrong width
    #[error("dimension mismatch: model expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Linfa(#[from] linfa::error::Error),
}
