use ndarray::Array1;
use ndarray::ArrayView2;

/// A cluster-quality score over a candidate cluster's member points.
///
/// Given the member indices of a candidate and the full point matrix, the
/// score returns a non-negative real; larger is better. The engine
/// multiplies this value by the candidate's dendrogram persistence to
/// produce the final cluster score, so a score function only needs to
/// capture the geometric quality of the member set.
pub trait ClusterScore: Send + Sync {
  /// Score the candidate whose member rows of `points` are `members`.
  fn score(&self, members: &[usize], points: ArrayView2<f64>) -> f64;
}

/// Plain closures and function pointers are accepted wherever a
/// [`ClusterScore`] is expected.
impl<F> ClusterScore for F
where
  F: Fn(&[usize], ArrayView2<f64>) -> f64 + Send + Sync,
{
  fn score(&self, members: &[usize], points: ArrayView2<f64>) -> f64 {
    self(members, points)
  }
}

/// Compactness score `1 / (1 + v)` where `v` is the mean squared deviation
/// of the members from their centroid.
///
/// Tight clusters score close to 1, diffuse clusters approach 0. This is
/// the shipped default score.
#[derive(Debug, Clone, Copy)]
pub struct VarianceScore;

impl ClusterScore for VarianceScore {
  fn score(&self, members: &[usize], points: ArrayView2<f64>) -> f64 {
    1.0 / (1.0 + variance(members, points))
  }
}

/// Arithmetic mean of the member rows.
pub(crate) fn centroid(members: &[usize], points: ArrayView2<f64>) -> Array1<f64> {
  let mut mean = Array1::<f64>::zeros(points.ncols());
  if members.is_empty() {
    return mean;
  }
  for &m in members {
    mean += &points.row(m);
  }
  mean / members.len() as f64
}

/// Mean squared deviation of the member rows from their centroid.
pub(crate) fn variance(members: &[usize], points: ArrayView2<f64>) -> f64 {
  if members.is_empty() {
    return 0.0;
  }
  let mean = centroid(members, points);
  let mut total = 0.0;
  for &m in members {
    let row = points.row(m);
    for d in 0..points.ncols() {
      let diff = row[d] - mean[d];
      total += diff * diff;
    }
  }
  total / members.len() as f64
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::array;

  #[test]
  fn centroid_is_elementwise_mean() {
    let points = array![[0.0, 0.0], [2.0, 4.0], [4.0, 8.0]];
    let c = centroid(&[0, 1, 2], points.view());
    assert_eq!(c, array![2.0, 4.0]);
  }

  #[test]
  fn variance_of_identical_points_is_zero() {
    let points = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
    assert_eq!(variance(&[0, 1, 2], points.view()), 0.0);
    assert_eq!(VarianceScore.score(&[0, 1, 2], points.view()), 1.0);
  }

  #[test]
  fn diffuse_members_score_lower() {
    let points = array![[0.0, 0.0], [0.1, 0.0], [10.0, 0.0], [30.0, 0.0]];
    let tight = VarianceScore.score(&[0, 1], points.view());
    let diffuse = VarianceScore.score(&[2, 3], points.view());
    assert!(tight > diffuse);
  }
}
