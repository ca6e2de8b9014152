use thiserror::Error;

/// Errors reported at the clustering API boundary.
///
/// Every failure is a typed value; the engine does not panic on caller
/// input. An error aborts the current operation without mutating any
/// observable state, and there are no retries at this layer.
#[derive(Debug, Error)]
pub enum ClusteringError {
  /// The point set or the parameters are invalid: empty data, ragged or
  /// zero-width rows, a minimum cluster size below 2, too few points for
  /// the requested minimum cluster size, or a subsample that does not fit
  /// the dataset.
  #[error("invalid configuration: {0}")]
  Configuration(String),

  /// The distance function returned NaN or a negative value for the given
  /// pair of point indices.
  #[error("distance function returned an invalid value for pair ({i}, {j})")]
  Distance {
    /// First point index of the offending pair.
    i: usize,
    /// Second point index of the offending pair.
    j: usize,
  },

  /// Fewer than n-1 finite edges are available, so the mutual-reachability
  /// graph has no spanning tree.
  #[error("mutual reachability graph is disconnected: {0}")]
  Graph(String),

  /// The clustering lifecycle was violated: `run` invoked twice, or
  /// `assign` invoked on a clustering that has not completed a run.
  #[error("invalid clustering state: {0}")]
  State(String),
}
