use crate::error::ClusteringError;
use crate::metric::Distance;
use dashmap::DashSet;
use ndarray::ArrayView2;
use rayon::prelude::*;
use typed_builder::TypedBuilder;

/// Per-point core distances: for each point, the distance to its k-th
/// nearest neighbor, counting the point itself as its own first neighbor
/// at distance zero. `k` is the minimum cluster size.
///
/// Brute force over all pairs, parallel over points. Distance ties are
/// broken by point index so repeated runs rank neighbors identically.
/// Every pairwise distance is evaluated here, which makes this stage the
/// validation gate for the distance function: any NaN or negative value
/// anywhere in the matrix fails the run.
#[derive(TypedBuilder)]
pub(crate) struct CoreDistances<'a, 'd> {
  points: ArrayView2<'a, f64>,
  k: usize,
  distance: &'d dyn Distance,
}

impl CoreDistances<'_, '_> {
  pub fn exec(self) -> Result<Vec<f64>, ClusteringError> {
    let CoreDistances { points, k, distance } = self;
    let n = points.nrows();
    debug_assert!(k >= 2 && n >= k);

    let invalid = DashSet::new();
    let core: Vec<f64> = (0..n)
      .into_par_iter()
      .map(|i| {
        let mut dists: Vec<(f64, usize)> = Vec::with_capacity(n - 1);
        for j in 0..n {
          if j == i {
            continue;
          }
          let d = distance.distance(points.row(i), points.row(j));
          if d.is_nan() || d < 0.0 {
            invalid.insert((i.min(j), i.max(j)));
            continue;
          }
          dists.push((d, j));
        }
        if dists.len() < k - 1 {
          return f64::NAN;
        }
        dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        // the point itself occupies the first neighbor slot at distance 0
        dists[k - 2].0
      })
      .collect();

    if let Some((i, j)) = invalid.iter().map(|p| *p).min() {
      return Err(ClusteringError::Distance { i, j });
    }
    Ok(core)
  }
}
