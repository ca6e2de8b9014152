//! The clustering pipeline, in dependency order: core distances, the
//! mutual-reachability graph, its minimum spanning tree, single-linkage
//! agglomeration into a dendrogram, candidate scoring and selection, and
//! post-processing of the selected clusters.

pub(crate) mod core_distances;
pub(crate) mod dendrogram;
pub(crate) mod mst;
pub(crate) mod mutual_reachability;
pub(crate) mod postprocess;
pub(crate) mod selection;

/// A weighted edge of the mutual-reachability graph, normalized to `i < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
  pub i: usize,
  pub j: usize,
  pub weight: f64,
}

impl Edge {
  pub fn new(a: usize, b: usize, weight: f64) -> Self {
    let (i, j) = if a < b { (a, b) } else { (b, a) };
    Self { i, j, weight }
  }
}

/// Ascending `(weight, i, j)` order, shared by the MST output and the
/// direct edge path so that the agglomeration sees one deterministic edge
/// sequence for a given input.
pub(crate) fn sort_edges(edges: &mut [Edge]) {
  edges.sort_by(|a, b| {
    a.weight
      .total_cmp(&b.weight)
      .then(a.i.cmp(&b.i))
      .then(a.j.cmp(&b.j))
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn edges_normalize_endpoints() {
    let e = Edge::new(5, 2, 1.0);
    assert_eq!((e.i, e.j), (2, 5));
  }

  #[test]
  fn sort_breaks_weight_ties_by_endpoints() {
    let mut edges = vec![
      Edge::new(3, 4, 1.0),
      Edge::new(0, 2, 1.0),
      Edge::new(0, 1, 0.5),
      Edge::new(1, 2, 1.0),
    ];
    sort_edges(&mut edges);
    let order: Vec<(usize, usize)> = edges.iter().map(|e| (e.i, e.j)).collect();
    assert_eq!(order, vec![(0, 1), (0, 2), (1, 2), (3, 4)]);
  }
}
