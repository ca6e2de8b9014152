use crate::metric::Distance;
use ndarray::ArrayView1;

/// Euclidean (L2) distance: `sqrt(sum((a_i - b_i)^2))`.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanDistance;

impl Distance for EuclideanDistance {
  fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let mut sum_sq = 0.0;
    for i in 0..a.len() {
      let diff = a[i] - b[i];
      sum_sq += diff * diff;
    }
    sum_sq.sqrt()
  }
}

/// Manhattan (L1) distance: `sum(|a_i - b_i|)`.
#[derive(Debug, Clone, Copy)]
pub struct ManhattanDistance;

impl Distance for ManhattanDistance {
  fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let mut sum = 0.0;
    for i in 0..a.len() {
      sum += (a[i] - b[i]).abs();
    }
    sum
  }
}
