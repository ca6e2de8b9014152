use crate::error::ClusteringError;
use crate::hdbscan::sort_edges;
use crate::hdbscan::Edge;
use crate::metric::Distance;
use itertools::Itertools;
use ndarray::ArrayView2;
use typed_builder::TypedBuilder;

/// Materialized mutual-reachability edge list over every unordered pair,
/// weighted by `max(core(i), core(j), d(i, j))` and sorted ascending.
///
/// Used when the caller skips MST construction: the full edge sequence
/// feeds the union-find agglomeration directly, which drops cycle edges on
/// its own. Memory is O(n²); the spanning-tree path should be preferred
/// for anything large.
#[derive(TypedBuilder)]
pub(crate) struct MutualReachabilityGraph<'a, 'c, 'd> {
  points: ArrayView2<'a, f64>,
  core_distances: &'c [f64],
  distance: &'d dyn Distance,
}

impl MutualReachabilityGraph<'_, '_, '_> {
  pub fn exec(self) -> Result<Vec<Edge>, ClusteringError> {
    let MutualReachabilityGraph {
      points,
      core_distances,
      distance,
    } = self;
    let n = points.nrows();

    let mut edges = Vec::with_capacity(n * (n - 1) / 2);
    for (i, j) in (0..n).tuple_combinations() {
      let d = distance.distance(points.row(i), points.row(j));
      if d.is_nan() || d < 0.0 {
        return Err(ClusteringError::Distance { i, j });
      }
      let weight = core_distances[i].max(core_distances[j]).max(d);
      // non-finite weights cannot join the tree; the agglomeration reports
      // the disconnection if too few finite edges remain
      if weight.is_finite() {
        edges.push(Edge::new(i, j, weight));
      }
    }
    sort_edges(&mut edges);
    Ok(edges)
  }
}
