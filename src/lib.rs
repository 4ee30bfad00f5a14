//! cosine-cluster: directional k-means for vectors where only orientation matters
//!
//! Rows are normalized to unit length, assigned to the center with the highest
//! cosine similarity, and each center is recomputed as the normalized sum of its
//! members until assignments stop changing or the iteration cap is passed.

pub mod algorithm;
pub mod cli;
pub mod data;
pub mod error;
pub mod hyperparams;
pub mod model;
pub mod viz;

// Re-export public items for easier access
pub use algorithm::InitMethod;
pub use cli::Args;
pub use data::{load_vectors, VectorData};
pub use error::CosineClusterError;
pub use hyperparams::{CosineClusterParams, CosineClusterValidParams, DEFAULT_MAX_NUM_ITERATIONS};
pub use model::{CosineCluster, CosineClusterModel, Termination};
pub use viz::generate_visualization_report;

/// Result type of the clustering library
pub type Result<T, E = CosineClusterError> = std::result::Result<T, E>;

/// Result type of the CLI-facing layers (loading, plotting)
pub type AppResult<T> = anyhow::Result<T>;
