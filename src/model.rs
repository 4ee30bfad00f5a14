//! Cosine k-means engine and fitted model

use crate::algorithm::{self, check_cluster_count, InitMethod};
use crate::error::CosineClusterError;
use crate::hyperparams::{validate_config, CosineClusterParams, DEFAULT_MAX_NUM_ITERATIONS};
use crate::Result;
use linfa::traits::PredictInplace;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Directional k-means engine
///
/// Holds configuration only. Every call to [`CosineCluster::fit`] starts from
/// scratch and returns a fresh [`CosineClusterModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosineCluster {
    n_clusters: usize,
    max_num_iterations: usize,
    seed: Option<u64>,
}

/// Why the fit loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Two consecutive rounds produced the same assignment
    Converged,
    /// The round counter went past `max_num_iterations`
    IterationCapReached,
}

/// Result of a completed fit
#[derive(Debug, Clone)]
pub struct CosineClusterModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Unit-norm cluster centers (`k x d`)
    pub cluster_centers: Array2<f64>,
    /// Cluster assignment for every training row
    pub cluster_indices: Array1<usize>,
    /// How the fit ended
    pub termination: Termination,
    /// Assign/update rounds executed
    pub n_rounds: usize,
    /// `n - sum of best cosine similarities`
    pub inertia: f64,
}

/// Snapshot taken when the loop reaches a terminal state
#[derive(Debug)]
struct Snapshot {
    rounds: usize,
    centers: Array2<f64>,
    cluster_indices: Array1<usize>,
}

#[derive(Debug)]
enum FitState {
    Initializing,
    Iterating {
        rounds: usize,
        centers: Array2<f64>,
        previous: Option<Array1<usize>>,
    },
    Converged(Snapshot),
    IterationCapReached(Snapshot),
}

/// Read-only inputs shared by every transition of one fit
struct FitContext<'a> {
    normalized: &'a Array2<f64>,
    n_clusters: usize,
    max_num_iterations: usize,
    init_method: InitMethod,
}

impl FitState {
    fn advance<R: Rng>(self, ctx: &FitContext<'_>, rng: &mut R) -> Result<FitState> {
        match self {
            FitState::Initializing => {
                let centers =
                    algorithm::init_centers(ctx.normalized, ctx.n_clusters, ctx.init_method, rng)?;
                Ok(FitState::Iterating {
                    rounds: 0,
                    centers,
                    previous: None,
                })
            }
            FitState::Iterating {
                rounds,
                centers,
                previous,
            } => {
                let cluster_indices = algorithm::assign(ctx.normalized, &centers);
                let converged = previous.as_ref() == Some(&cluster_indices);

                let update =
                    algorithm::update_centers(ctx.normalized, &cluster_indices, ctx.n_clusters);
                let rounds = rounds + 1;

                debug!(
                    round = rounds,
                    reassigned = count_changes(previous.as_ref(), &cluster_indices),
                    reseeded = update.reseeded.len(),
                    "cosine k-means round complete"
                );

                if converged {
                    Ok(FitState::Converged(Snapshot {
                        rounds,
                        centers: update.centers,
                        cluster_indices,
                    }))
                } else if rounds > ctx.max_num_iterations {
                    Ok(FitState::IterationCapReached(Snapshot {
                        rounds,
                        centers: update.centers,
                        cluster_indices,
                    }))
                } else {
                    Ok(FitState::Iterating {
                        rounds,
                        centers: update.centers,
                        previous: Some(cluster_indices),
                    })
                }
            }
            terminal => Ok(terminal),
        }
    }
}

fn count_changes(previous: Option<&Array1<usize>>, current: &Array1<usize>) -> usize {
    match previous {
        Some(previous) => previous
            .iter()
            .zip(current.iter())
            .filter(|(before, after)| before != after)
            .count(),
        None => current.len(),
    }
}

impl CosineCluster {
    /// Engine with the default iteration cap of 20
    pub fn new(n_clusters: usize) -> Result<Self> {
        Self::with_max_num_iterations(n_clusters, DEFAULT_MAX_NUM_ITERATIONS)
    }

    pub fn with_max_num_iterations(n_clusters: usize, max_num_iterations: usize) -> Result<Self> {
        validate_config(n_clusters, max_num_iterations)?;
        Ok(Self::from_valid(n_clusters, max_num_iterations, None))
    }

    pub(crate) fn from_valid(n_clusters: usize, max_num_iterations: usize, seed: Option<u64>) -> Self {
        Self {
            n_clusters,
            max_num_iterations,
            seed,
        }
    }

    /// Seed random initialization so repeated fits agree
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Unchecked linfa hyper-parameters
    pub fn params(n_clusters: usize) -> CosineClusterParams {
        CosineClusterParams::new(n_clusters)
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn max_num_iterations(&self) -> usize {
        self.max_num_iterations
    }

    /// Fit `data` into `n_clusters` groups
    ///
    /// # Arguments
    /// * `data` - N x D matrix; it is copied and normalized, never mutated
    /// * `random_init` - random unit centers instead of the first K rows
    ///
    /// # Returns
    /// * Fitted `CosineClusterModel`, or `InvalidConfiguration` when K > N and
    ///   `DegenerateInput` for zero-norm rows
    pub fn fit<S>(&self, data: &ArrayBase<S, Ix2>, random_init: bool) -> Result<CosineClusterModel>
    where
        S: Data<Elem = f64>,
    {
        match self.seed {
            Some(seed) => self.fit_with_rng(data, random_init, &mut StdRng::seed_from_u64(seed)),
            None => self.fit_with_rng(data, random_init, &mut rand::thread_rng()),
        }
    }

    /// Same as [`CosineCluster::fit`] with a caller-provided generator
    pub fn fit_with_rng<S, R>(
        &self,
        data: &ArrayBase<S, Ix2>,
        random_init: bool,
        rng: &mut R,
    ) -> Result<CosineClusterModel>
    where
        S: Data<Elem = f64>,
        R: Rng,
    {
        check_cluster_count(self.n_clusters, data.nrows())?;

        let normalized = algorithm::normalize_rows(data)?;
        let ctx = FitContext {
            normalized: &normalized,
            n_clusters: self.n_clusters,
            max_num_iterations: self.max_num_iterations,
            init_method: InitMethod::from_random_flag(random_init),
        };

        let mut state = FitState::Initializing;
        loop {
            state = match state.advance(&ctx, rng)? {
                FitState::Converged(snapshot) => {
                    return Ok(self.publish(&normalized, snapshot, Termination::Converged))
                }
                FitState::IterationCapReached(snapshot) => {
                    return Ok(self.publish(&normalized, snapshot, Termination::IterationCapReached))
                }
                next => next,
            };
        }
    }

    fn publish(
        &self,
        normalized: &Array2<f64>,
        snapshot: Snapshot,
        termination: Termination,
    ) -> CosineClusterModel {
        let inertia = algorithm::inertia(normalized, &snapshot.centers);

        info!(
            ?termination,
            rounds = snapshot.rounds,
            inertia,
            "cosine k-means fit finished"
        );

        CosineClusterModel {
            n_clusters: self.n_clusters,
            cluster_centers: snapshot.centers,
            cluster_indices: snapshot.cluster_indices,
            termination,
            n_rounds: snapshot.rounds,
            inertia,
        }
    }
}

impl CosineClusterModel {
    pub fn clusters_converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Width of the vectors the model was fitted on
    pub fn n_features(&self) -> usize {
        self.cluster_centers.ncols()
    }

    /// Group whose center is most similar to `features`
    ///
    /// The vector does not need to be normalized; it only must not be zero.
    pub fn predict_row<S>(&self, features: &ArrayBase<S, Ix1>) -> Result<usize>
    where
        S: Data<Elem = f64>,
    {
        if features.len() != self.n_features() {
            return Err(CosineClusterError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let row = features.view().insert_axis(ndarray::Axis(0));
        let normalized = algorithm::normalize_rows(&row)?;
        Ok(algorithm::assign(&normalized, &self.cluster_centers)[0])
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.cluster_indices.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Mean silhouette coefficient over the first `sample_size` rows, using
    /// cosine distance `1 - cos(a, b)`
    ///
    /// `normalized` must be the unit-norm training rows in fit order.
    pub fn silhouette_sample(&self, normalized: &Array2<f64>, sample_size: usize) -> f64 {
        let n_samples = normalized.nrows().min(sample_size).min(self.cluster_indices.len());
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let point = normalized.row(i);
            let cluster_label = self.cluster_indices[i];

            let mut same_cluster = (0.0, 0usize);
            let mut other_clusters = vec![(0.0, 0usize); self.n_clusters];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }

                let distance = 1.0 - point.dot(&normalized.row(j));
                let other_label = self.cluster_indices[j];

                if other_label == cluster_label {
                    same_cluster.0 += distance;
                    same_cluster.1 += 1;
                } else if other_label < self.n_clusters {
                    other_clusters[other_label].0 += distance;
                    other_clusters[other_label].1 += 1;
                }
            }

            let a_i = if same_cluster.1 == 0 {
                0.0
            } else {
                same_cluster.0 / same_cluster.1 as f64
            };

            let b_i = other_clusters
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(total, count)| total / *count as f64)
                .fold(f64::INFINITY, f64::min);

            let silhouette_i = if b_i.is_infinite() || a_i.max(b_i) <= 0.0 {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}

impl<S> PredictInplace<ArrayBase<S, Ix2>, Array1<usize>> for CosineClusterModel
where
    S: Data<Elem = f64>,
{
    /// Rows are compared by dot product with the unit centers, which ranks
    /// centers the same way cosine similarity does. All-zero rows go to group 0.
    fn predict_inplace(&self, records: &ArrayBase<S, Ix2>, targets: &mut Array1<usize>) {
        assert_eq!(
            records.nrows(),
            targets.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            records.ncols(),
            self.n_features(),
            "Records must have the same width as the cluster centers."
        );

        targets.assign(&algorithm::assign(records, &self.cluster_centers));
    }

    fn default_target(&self, records: &ArrayBase<S, Ix2>) -> Array1<usize> {
        Array1::zeros(records.nrows())
    }
}
