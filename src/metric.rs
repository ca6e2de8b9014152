use ndarray::ArrayView1;

/// A distance function over points.
///
/// Distances must be non-negative and symmetric, with `d(x, x) = 0`.
/// A NaN or negative return value aborts the run with
/// [`ClusteringError::Distance`](crate::ClusteringError::Distance).
/// Thread-safety (`Send + Sync`) is required because the engine evaluates
/// distances from parallel workers.
pub trait Distance: Send + Sync {
  /// Compute the distance between two points of equal dimension.
  fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64;
}

/// Plain closures and function pointers are accepted wherever a
/// [`Distance`] is expected.
impl<F> Distance for F
where
  F: Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync,
{
  fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    self(a, b)
  }
}
