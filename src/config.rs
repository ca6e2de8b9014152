use serde::Deserialize;
use serde::Serialize;

/// Configuration for attaching points that fall outside every selected
/// cluster.
///
/// The post-processors run in a fixed order: outlier attribution, outlier
/// clustering, then Voronoi fill. Each step only runs when its flag is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentParams {
  /// Attach each unassigned point to its nearest cluster as an outlier,
  /// recording a distance normalized to [0, 1] within that cluster's
  /// outlier set.
  ///
  /// Default: false
  pub outlier_detection: bool,

  /// Promote a cluster's outliers to a standalone cluster once they reach
  /// the minimum cluster size.
  ///
  /// Only meaningful together with `outlier_detection`.
  ///
  /// Default: false
  pub outlier_clustering: bool,

  /// Append every remaining unassigned point to the member list of its
  /// nearest cluster, so that no point is left without a cluster.
  ///
  /// Default: false
  pub voronoi: bool,

  /// Measure nearness as the minimum distance to any member point instead
  /// of the distance to the cluster centroid.
  ///
  /// Default: false (centroid distance)
  pub nearest_neighbor: bool,
}

/// Configuration for restricting the training set before the pipeline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingParams {
  /// Number of points to train on.
  ///
  /// `None` trains on the full dataset. `Some(m)` trains on the first `m`
  /// points unless an explicit index sample was drawn via
  /// [`Clustering::subsample_with`](crate::Clustering::subsample_with).
  /// A value larger than the dataset, or smaller than twice the minimum
  /// cluster size, is rejected when the pipeline runs.
  ///
  /// Default: None
  pub subsample: Option<usize>,
}

/// Complete clustering configuration.
///
/// All flags default to off; the chainable option methods on
/// [`Clustering`](crate::Clustering) are the usual way to set them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusteringConfig {
  /// Emit per-stage progress events through `tracing`.
  ///
  /// Default: false
  pub verbose: bool,

  /// Training-set restriction.
  pub sampling: SamplingParams,

  /// Post-processing behavior for unassigned points.
  pub assignment: AssignmentParams,
}
