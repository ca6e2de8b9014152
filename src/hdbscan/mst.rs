use crate::error::ClusteringError;
use crate::hdbscan::sort_edges;
use crate::hdbscan::Edge;
use crate::metric::Distance;
use ndarray::ArrayView2;
use rayon::prelude::*;
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Copy)]
struct FrontierSlot {
  weight: f64,
  from: usize,
}

/// Prim's algorithm over the implicit complete mutual-reachability graph.
///
/// The frontier is array-backed, so each round is a parallel relaxation
/// against the newly added vertex followed by a parallel minimum
/// reduction. Nothing is materialized beyond O(n) state. Ties are broken
/// by point index everywhere a weight is compared, which makes the edge
/// sequence deterministic for a given input.
///
/// Pairwise distances were already validated by the core-distance stage,
/// so they are consumed here without re-checking.
#[derive(TypedBuilder)]
pub(crate) struct MinimumSpanningTree<'a, 'c, 'd> {
  points: ArrayView2<'a, f64>,
  core_distances: &'c [f64],
  distance: &'d dyn Distance,
}

impl MinimumSpanningTree<'_, '_, '_> {
  pub fn exec(self) -> Result<Vec<Edge>, ClusteringError> {
    let MinimumSpanningTree {
      points,
      core_distances,
      distance,
    } = self;
    let n = points.nrows();

    let mut in_tree = vec![false; n];
    let mut frontier = vec![
      FrontierSlot {
        weight: f64::INFINITY,
        from: 0,
      };
      n
    ];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    let mut current = 0usize;

    for _ in 1..n {
      in_tree[current] = true;
      let row = points.row(current);
      let core_current = core_distances[current];

      let tree = &in_tree;
      frontier
        .par_iter_mut()
        .enumerate()
        .filter(|(i, _)| !tree[*i])
        .for_each(|(i, slot)| {
          let d = distance.distance(row, points.row(i));
          let w = core_current.max(core_distances[i]).max(d);
          if w < slot.weight {
            slot.weight = w;
            slot.from = current;
          }
        });

      let best = frontier
        .par_iter()
        .enumerate()
        .filter(|(i, _)| !tree[*i])
        .min_by(|(i, a), (j, b)| a.weight.total_cmp(&b.weight).then(i.cmp(j)));

      let (next, slot) = match best {
        Some((next, slot)) => (next, *slot),
        None => break,
      };
      if !slot.weight.is_finite() {
        return Err(ClusteringError::Graph(format!(
          "point {next} is not reachable through finite mutual reachability distances"
        )));
      }
      edges.push(Edge::new(slot.from, next, slot.weight));
      current = next;
    }

    sort_edges(&mut edges);
    Ok(edges)
  }
}
