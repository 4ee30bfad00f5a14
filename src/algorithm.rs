//! Building blocks of the directional k-means fit
//!
//! Every function here is pure: it borrows its inputs and returns a freshly
//! allocated result. The fit loop in [`crate::model`] composes them as
//! normalize -> init -> (assign -> update)* -> inertia.

use crate::error::CosineClusterError;
use crate::Result;
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView1, Data, Ix2};
use rand::Rng;

/// How the initial centers are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitMethod {
    /// First `k` normalized input rows, reproducible
    #[default]
    FirstRows,
    /// `k` uniform draws from `[0, 1)^d`, each normalized to unit length
    Random,
}

impl InitMethod {
    /// Map the `random_init` flag of [`CosineCluster::fit`](crate::CosineCluster::fit)
    pub fn from_random_flag(random_init: bool) -> Self {
        if random_init {
            InitMethod::Random
        } else {
            InitMethod::FirstRows
        }
    }
}

/// Divide every row by its Euclidean norm
///
/// Rows that are all zeros or hold a non-finite entry cannot become unit
/// vectors and are rejected with [`CosineClusterError::DegenerateInput`]
/// naming the first such row. The norm is computed on the row scaled by its
/// largest magnitude, so very large or very small entries neither overflow nor
/// underflow.
pub fn normalize_rows<S>(data: &ArrayBase<S, Ix2>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
{
    let mut normalized = data.to_owned();

    for (row_idx, mut row) in normalized.outer_iter_mut().enumerate() {
        if row.iter().any(|value| !value.is_finite()) {
            return Err(CosineClusterError::DegenerateInput {
                row: row_idx,
                reason: "row contains non-finite values".to_string(),
            });
        }

        let scale = row.iter().fold(0.0f64, |acc, value| acc.max(value.abs()));
        if scale == 0.0 {
            return Err(CosineClusterError::DegenerateInput {
                row: row_idx,
                reason: "row has zero norm".to_string(),
            });
        }

        let norm = scale
            * row
                .iter()
                .map(|value| (value / scale).powi(2))
                .sum::<f64>()
                .sqrt();
        row /= norm;
    }

    Ok(normalized)
}

/// Reject group counts that cannot be drawn from `n_rows` rows
pub(crate) fn check_cluster_count(n_clusters: usize, n_rows: usize) -> Result<()> {
    if n_clusters == 0 {
        return Err(CosineClusterError::InvalidConfiguration(
            "number of clusters must be positive".to_string(),
        ));
    }
    if n_clusters > n_rows {
        return Err(CosineClusterError::InvalidConfiguration(format!(
            "number of clusters ({}) exceeds number of data points ({})",
            n_clusters, n_rows
        )));
    }
    Ok(())
}

/// Produce the `k x d` starting center matrix
///
/// `normalized` must already have unit-norm rows; in [`InitMethod::FirstRows`]
/// mode they are copied verbatim.
pub fn init_centers<S, R>(
    normalized: &ArrayBase<S, Ix2>,
    n_clusters: usize,
    method: InitMethod,
    rng: &mut R,
) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    R: Rng,
{
    check_cluster_count(n_clusters, normalized.nrows())?;

    match method {
        InitMethod::FirstRows => Ok(normalized.slice(s![..n_clusters, ..]).to_owned()),
        InitMethod::Random => {
            let raw = Array2::from_shape_fn((n_clusters, normalized.ncols()), |_| {
                rng.gen::<f64>()
            });
            normalize_rows(&raw)
        }
    }
}

/// Cosine similarity of every row against every center (`n x k`)
///
/// Both sides are expected to be unit-norm, so the plain dot product is the
/// cosine similarity.
pub fn similarity_matrix<S1, S2>(
    normalized: &ArrayBase<S1, Ix2>,
    centers: &ArrayBase<S2, Ix2>,
) -> Array2<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    normalized.dot(&centers.t())
}

/// Index and value of the best entry, lowest index on ties
///
/// NaN never compares greater, so it can only win when every entry is NaN
/// (index 0).
pub(crate) fn best_center(similarities: ArrayView1<f64>) -> (usize, f64) {
    let mut best_idx = 0;
    let mut best_sim = f64::NEG_INFINITY;

    for (idx, &sim) in similarities.iter().enumerate() {
        if sim > best_sim {
            best_idx = idx;
            best_sim = sim;
        }
    }

    (best_idx, best_sim)
}

/// Assign every row to its most similar center
pub fn assign<S1, S2>(normalized: &ArrayBase<S1, Ix2>, centers: &ArrayBase<S2, Ix2>) -> Array1<usize>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    similarity_matrix(normalized, centers)
        .outer_iter()
        .map(|row| best_center(row).0)
        .collect()
}

/// Outcome of one center update
#[derive(Debug, Clone)]
pub struct CenterUpdate {
    /// New `k x d` center matrix, all rows unit-norm
    pub centers: Array2<f64>,
    /// Groups that fell back to the input row with their own index
    pub reseeded: Vec<usize>,
}

/// Recompute every center as the normalized sum of its members
///
/// A group with no members, or whose members sum to the zero vector, takes
/// normalized input row `k` instead. Requires `k <= n` and every entry of
/// `cluster_indices` below `k`.
pub fn update_centers<S>(
    normalized: &ArrayBase<S, Ix2>,
    cluster_indices: &Array1<usize>,
    n_clusters: usize,
) -> CenterUpdate
where
    S: Data<Elem = f64>,
{
    let mut centers = Array2::<f64>::zeros((n_clusters, normalized.ncols()));
    let mut counts = vec![0usize; n_clusters];

    for (row, &cluster) in normalized.outer_iter().zip(cluster_indices.iter()) {
        let mut sum = centers.row_mut(cluster);
        sum += &row;
        counts[cluster] += 1;
    }

    let mut reseeded = Vec::new();
    for (cluster, mut center) in centers.outer_iter_mut().enumerate() {
        let norm = center.dot(&center).sqrt();
        if counts[cluster] == 0 || norm == 0.0 {
            center.assign(&normalized.row(cluster));
            reseeded.push(cluster);
        } else {
            center /= norm;
        }
    }

    CenterUpdate { centers, reseeded }
}

/// `n - sum_i max_k cos(row_i, center_k)`, 0 for a perfect fit
pub fn inertia<S1, S2>(normalized: &ArrayBase<S1, Ix2>, centers: &ArrayBase<S2, Ix2>) -> f64
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    let best_total: f64 = similarity_matrix(normalized, centers)
        .outer_iter()
        .map(|row| best_center(row).1)
        .sum();

    normalized.nrows() as f64 - best_total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, Axis};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scenario_rows() -> Array2<f64> {
        array![[1.0, 0.0], [0.9, 0.1], [0.0, 1.0], [0.1, 0.9]]
    }

    fn row_norms(matrix: &Array2<f64>) -> Vec<f64> {
        matrix
            .outer_iter()
            .map(|row| row.dot(&row).sqrt())
            .collect()
    }

    #[test]
    fn test_normalize_rows_unit_norm() {
        let data = array![[3.0, 4.0], [-2.0, 0.0], [0.5, 0.5]];
        let normalized = normalize_rows(&data).unwrap();

        for norm in row_norms(&normalized) {
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(normalized[[0, 0]], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized[[0, 1]], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized[[1, 0]], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_rows_leaves_input_untouched() {
        let data = array![[3.0, 4.0]];
        let _ = normalize_rows(&data).unwrap();
        assert_eq!(data, array![[3.0, 4.0]]);
    }

    #[test]
    fn test_normalize_rows_is_idempotent() {
        let once = normalize_rows(&scenario_rows()).unwrap();
        let twice = normalize_rows(&once).unwrap();
        assert_abs_diff_eq!(once, twice, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_rows_rejects_zero_row() {
        let data = array![[1.0, 2.0], [0.0, 0.0], [0.0, 0.0]];
        match normalize_rows(&data) {
            Err(CosineClusterError::DegenerateInput { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected DegenerateInput, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_rows_rejects_non_finite_row() {
        let data = array![[1.0, f64::NAN]];
        assert!(matches!(
            normalize_rows(&data),
            Err(CosineClusterError::DegenerateInput { row: 0, .. })
        ));
    }

    #[test]
    fn test_normalize_rows_extreme_magnitudes() {
        let data = array![[1e200, 1e200], [1e200, -1e200], [1e-200, 0.0], [0.0, 5e-324]];
        let normalized = normalize_rows(&data).unwrap();

        let half_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(normalized.row(0), array![half_sqrt2, half_sqrt2].view(), epsilon = 1e-12);
        assert_abs_diff_eq!(normalized.row(1), array![half_sqrt2, -half_sqrt2].view(), epsilon = 1e-12);
        assert_abs_diff_eq!(normalized.row(2), array![1.0, 0.0].view(), epsilon = 1e-12);
        assert_abs_diff_eq!(normalized.row(3), array![0.0, 1.0].view(), epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_rows_rejects_infinite_entry() {
        let data = array![[1.0, 0.0], [f64::INFINITY, 1.0]];
        assert!(matches!(
            normalize_rows(&data),
            Err(CosineClusterError::DegenerateInput { row: 1, .. })
        ));
    }

    #[test]
    fn test_init_first_rows() {
        let normalized = normalize_rows(&scenario_rows()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let centers = init_centers(&normalized, 2, InitMethod::FirstRows, &mut rng).unwrap();

        assert_eq!(centers, normalized.slice(s![..2, ..]).to_owned());
    }

    #[test]
    fn test_init_random_is_unit_norm_and_seeded() {
        let normalized = normalize_rows(&scenario_rows()).unwrap();
        let first = init_centers(&normalized, 3, InitMethod::Random, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let second = init_centers(&normalized, 3, InitMethod::Random, &mut StdRng::seed_from_u64(42))
            .unwrap();

        assert_eq!(first.shape(), &[3, 2]);
        assert_eq!(first, second);
        for norm in row_norms(&first) {
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_init_rejects_bad_cluster_counts() {
        let normalized = normalize_rows(&scenario_rows()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        for k in [0, 5] {
            assert!(matches!(
                init_centers(&normalized, k, InitMethod::FirstRows, &mut rng),
                Err(CosineClusterError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_similarity_bounds_and_self_similarity() {
        let normalized = normalize_rows(&array![[1.0, 2.0, -3.0], [-4.0, 0.5, 0.0], [0.3, 0.3, 0.3]])
            .unwrap();
        let similarities = similarity_matrix(&normalized, &normalized);

        for &sim in similarities.iter() {
            assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&sim));
        }
        for diagonal in similarities.diag() {
            assert_abs_diff_eq!(*diagonal, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_assign_first_rows_scenario() {
        // Row 1 is its own center under first-rows init, so it lands in group 1
        let normalized = normalize_rows(&scenario_rows()).unwrap();
        let centers = normalized.slice(s![..2, ..]).to_owned();

        assert_eq!(assign(&normalized, &centers), array![0usize, 1, 1, 1]);
    }

    #[test]
    fn test_assign_and_update_axis_centers() {
        let normalized = normalize_rows(&scenario_rows()).unwrap();
        let centers = array![[1.0, 0.0], [0.0, 1.0]];

        let indices = assign(&normalized, &centers);
        assert_eq!(indices, array![0usize, 0, 1, 1]);

        let update = update_centers(&normalized, &indices, 2);
        let expected = &normalized.row(0) + &normalized.row(1);
        let expected = &expected / expected.dot(&expected).sqrt();

        assert!(update.reseeded.is_empty());
        assert_abs_diff_eq!(update.centers.row(0), expected.view(), epsilon = 1e-12);
        assert_abs_diff_eq!(update.centers[[0, 0]], 0.99847, epsilon = 1e-5);
        assert_abs_diff_eq!(update.centers[[0, 1]], 0.05530, epsilon = 1e-5);
    }

    #[test]
    fn test_assign_ties_go_to_lowest_index() {
        let normalized = array![[1.0, 0.0], [0.0, 1.0]];
        let centers = array![[0.0, 1.0], [1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];

        let first = assign(&normalized, &centers);
        let second = assign(&normalized, &centers);
        assert_eq!(first, array![1usize, 0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_update_empty_cluster_falls_back_to_input_row() {
        let normalized = normalize_rows(&array![[1.0, 0.0], [0.6, 0.8], [0.0, 1.0]]).unwrap();
        let indices = array![0, 0, 2];

        let update = update_centers(&normalized, &indices, 3);

        assert_eq!(update.reseeded, vec![1]);
        assert_eq!(update.centers.row(1), normalized.row(1));
        assert_eq!(update.centers.row(2), normalized.row(2));
    }

    #[test]
    fn test_update_cancelling_members_fall_back() {
        let normalized = array![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]];
        let indices = array![1, 0, 1];

        let update = update_centers(&normalized, &indices, 2);

        // Rows 0 and 2 cancel, so group 1 takes input row 1 despite having members
        assert_eq!(update.reseeded, vec![1]);
        assert_eq!(update.centers.row(1), normalized.row(1));
        assert_abs_diff_eq!(update.centers.row(0), array![0.0, 1.0].view(), epsilon = 1e-12);
    }

    #[test]
    fn test_update_centers_are_unit_norm() {
        let normalized = normalize_rows(&array![[1.0, 2.0], [2.0, 1.0], [-1.0, 3.0], [4.0, -1.0]])
            .unwrap();
        let update = update_centers(&normalized, &array![0, 0, 1, 1], 2);

        for row in update.centers.axis_iter(Axis(0)) {
            assert_abs_diff_eq!(row.dot(&row), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inertia_range() {
        let normalized = normalize_rows(&scenario_rows()).unwrap();

        assert_abs_diff_eq!(inertia(&normalized, &normalized), 0.0, epsilon = 1e-12);

        let opposite = array![[-1.0, 0.0]];
        let single = array![[1.0, 0.0]];
        assert_abs_diff_eq!(inertia(&single, &opposite), 2.0, epsilon = 1e-12);
    }
}
