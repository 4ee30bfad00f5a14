//! linfa-style hyper-parameters for the cosine k-means engine

use crate::algorithm::InitMethod;
use crate::error::CosineClusterError;
use crate::model::{CosineCluster, CosineClusterModel};
use crate::Result;
use linfa::traits::Fit;
use linfa::{DatasetBase, ParamGuard};
use ndarray::{ArrayBase, Data, Ix2};

/// Iteration cap used when none is given
pub const DEFAULT_MAX_NUM_ITERATIONS: usize = 20;

/// Checked hyper-parameters, ready to fit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosineClusterValidParams {
    n_clusters: usize,
    max_num_iterations: usize,
    init_method: InitMethod,
    seed: Option<u64>,
}

/// Unchecked hyper-parameters, built with [`CosineCluster::params`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosineClusterParams(CosineClusterValidParams);

impl CosineClusterParams {
    pub fn new(n_clusters: usize) -> Self {
        Self(CosineClusterValidParams {
            n_clusters,
            max_num_iterations: DEFAULT_MAX_NUM_ITERATIONS,
            init_method: InitMethod::default(),
            seed: None,
        })
    }

    pub fn max_num_iterations(mut self, max_num_iterations: usize) -> Self {
        self.0.max_num_iterations = max_num_iterations;
        self
    }

    pub fn init_method(mut self, init_method: InitMethod) -> Self {
        self.0.init_method = init_method;
        self
    }

    /// Shorthand for `init_method(InitMethod::Random)` when `true`
    pub fn random_init(self, random_init: bool) -> Self {
        self.init_method(InitMethod::from_random_flag(random_init))
    }

    /// Seed the generator used by [`InitMethod::Random`]
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = Some(seed);
        self
    }
}

impl CosineClusterValidParams {
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn max_num_iterations(&self) -> usize {
        self.max_num_iterations
    }

    pub fn init_method(&self) -> InitMethod {
        self.init_method
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The engine these parameters describe
    pub fn engine(&self) -> CosineCluster {
        CosineCluster::from_valid(self.n_clusters, self.max_num_iterations, self.seed)
    }
}

/// Configuration checks that do not depend on the data
pub(crate) fn validate_config(n_clusters: usize, max_num_iterations: usize) -> Result<()> {
    if n_clusters == 0 {
        return Err(CosineClusterError::InvalidConfiguration(
            "number of clusters must be positive".to_string(),
        ));
    }
    if max_num_iterations == 0 {
        return Err(CosineClusterError::InvalidConfiguration(
            "max_num_iterations must be positive".to_string(),
        ));
    }
    Ok(())
}

impl ParamGuard for CosineClusterParams {
    type Checked = CosineClusterValidParams;
    type Error = CosineClusterError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        validate_config(self.0.n_clusters, self.0.max_num_iterations)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<S, T> Fit<ArrayBase<S, Ix2>, T, CosineClusterError> for CosineClusterValidParams
where
    S: Data<Elem = f64>,
{
    type Object = CosineClusterModel;

    /// Fit on the dataset records; targets are ignored
    fn fit(&self, dataset: &DatasetBase<ArrayBase<S, Ix2>, T>) -> Result<Self::Object> {
        self.engine()
            .fit(dataset.records(), self.init_method == InitMethod::Random)
    }
}
