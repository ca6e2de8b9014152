use crate::hdbscan::dendrogram::Dendrogram;
use crate::score::variance;
use crate::score::ClusterScore;
use ndarray::ArrayView2;
use std::collections::HashMap;
use std::collections::HashSet;

/// A candidate that survived antichain selection, with its final score.
#[derive(Debug, Clone)]
pub(crate) struct SelectedCluster {
  pub id: usize,
  pub score: f64,
  pub variance: f64,
}

/// Link ids eligible for selection: every link whose size reaches the
/// minimum cluster size. Ascending id, which is bottom-up in the tree
/// because ids are minted in merge order.
///
/// Sizes only grow toward the root, so the candidate set is closed under
/// taking parents: a candidate's parent link, when present, is always a
/// candidate too.
pub(crate) fn candidates(dendrogram: &Dendrogram, min_cluster_size: usize) -> Vec<usize> {
  dendrogram
    .links
    .iter()
    .filter(|l| l.size >= min_cluster_size)
    .map(|l| l.id)
    .collect()
}

/// Difference of two λ values that treats a pair of infinities as zero, so
/// datasets of duplicate points keep finite, NaN-free stabilities.
fn lambda_gap(death: f64, birth: f64) -> f64 {
  if death.is_infinite() && birth.is_infinite() {
    0.0
  } else {
    (death - birth).max(0.0)
  }
}

/// Persistence of a candidate in the dendrogram.
///
/// The candidate is born at the λ of its parent link (zero for a root) and
/// its points leave it one level at a time as λ rises. Walking down from
/// the candidate: when a merge dissolves, a side smaller than the minimum
/// cluster size falls out as noise, and a split into two full-size sides
/// ends the candidate entirely (both halves continue as new clusters).
/// A full-size side opposite a small one is the candidate itself
/// continuing, so the walk descends into it. Each departing point
/// contributes the λ span it spent inside the candidate; the sum over all
/// member points is the persistence.
pub(crate) fn stability(dendrogram: &Dendrogram, id: usize, min_cluster_size: usize) -> f64 {
  let birth = match dendrogram.link(id).parent {
    Some(parent) => dendrogram.link(parent).lambda_min,
    None => 0.0,
  };

  let mut total = 0.0;
  let mut stack = vec![id];
  while let Some(current) = stack.pop() {
    let link = dendrogram.link(current);
    let lambda = link.lambda_min;

    // sides of this merge: child links plus implicit leaf children
    let child_sizes: usize = link
      .children
      .iter()
      .map(|&c| dendrogram.link(c).size)
      .sum();
    let leaf_count = link.size - child_sizes;
    let true_split = link.children.len() == 2
      && link
        .children
        .iter()
        .all(|&c| dendrogram.link(c).size >= min_cluster_size);

    if leaf_count > 0 {
      total += leaf_count as f64 * lambda_gap(lambda, birth);
    }
    for &child in &link.children {
      let child_size = dendrogram.link(child).size;
      if true_split || child_size < min_cluster_size {
        total += child_size as f64 * lambda_gap(lambda, birth);
      } else {
        stack.push(child);
      }
    }
  }
  total
}

/// Score every candidate and select the optimal antichain, bottom-up.
///
/// Selection compares persistence: a candidate with no candidate
/// descendants is selected outright; a parent replaces its selected
/// descendants only when its persistence strictly exceeds their sum, so
/// ties keep the deeper candidates. The `delta` flag on each link records
/// the outcome.
///
/// The reported score of a surviving cluster is the score capability's
/// value for its member set, weighted by the same persistence.
pub(crate) fn select_optimal(
  dendrogram: &mut Dendrogram,
  min_cluster_size: usize,
  score: &dyn ClusterScore,
  points: ArrayView2<f64>,
) -> Vec<SelectedCluster> {
  let ids = candidates(dendrogram, min_cluster_size);
  let is_candidate: HashSet<usize> = ids.iter().copied().collect();

  let mut persistence: HashMap<usize, f64> = HashMap::with_capacity(ids.len());
  for &id in &ids {
    persistence.insert(id, stability(dendrogram, id, min_cluster_size));
  }

  // best antichain persistence found at or below each candidate
  let mut best_below: HashMap<usize, f64> = HashMap::with_capacity(ids.len());

  for &id in &ids {
    let own = persistence[&id];
    let candidate_children: Vec<usize> = dendrogram
      .link(id)
      .children
      .iter()
      .copied()
      .filter(|c| is_candidate.contains(c))
      .collect();

    if candidate_children.is_empty() {
      dendrogram.link_mut(id).delta = true;
      best_below.insert(id, own);
      continue;
    }

    let descendants: f64 = candidate_children.iter().map(|c| best_below[c]).sum();
    if own > descendants {
      dendrogram.link_mut(id).delta = true;
      unselect_descendants(dendrogram, &candidate_children, &is_candidate);
      best_below.insert(id, own);
    } else {
      best_below.insert(id, descendants);
    }
  }

  ids
    .iter()
    .filter(|&&id| dendrogram.link(id).delta)
    .map(|&id| {
      let members = &dendrogram.link(id).points;
      SelectedCluster {
        id,
        score: score.score(members, points) * persistence[&id],
        variance: variance(members, points),
      }
    })
    .collect()
}

/// Clear the `delta` flag on every candidate in the given subtrees.
fn unselect_descendants(
  dendrogram: &mut Dendrogram,
  roots: &[usize],
  is_candidate: &HashSet<usize>,
) {
  let mut stack: Vec<usize> = roots.to_vec();
  while let Some(id) = stack.pop() {
    dendrogram.link_mut(id).delta = false;
    stack.extend(
      dendrogram
        .link(id)
        .children
        .iter()
        .copied()
        .filter(|c| is_candidate.contains(c)),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hdbscan::dendrogram::DendrogramBuilder;
  use crate::hdbscan::Edge;
  use crate::score::VarianceScore;
  use ndarray::Array2;

  /// Two tight pairs of triples joined by a long bridge:
  /// 1-D points 0.0, 0.1, 0.2 and 100.0, 100.1, 100.2.
  fn two_groups() -> (Array2<f64>, Dendrogram) {
    let coords = [0.0, 0.1, 0.2, 100.0, 100.1, 100.2];
    let points = Array2::from_shape_vec((6, 1), coords.to_vec()).unwrap();
    let edges = vec![
      Edge::new(0, 1, 0.1),
      Edge::new(1, 2, 0.1),
      Edge::new(3, 4, 0.1),
      Edge::new(4, 5, 0.1),
      Edge::new(2, 3, 99.8),
    ];
    let dendrogram = DendrogramBuilder::builder()
      .n_points(6)
      .edges(&edges)
      .build()
      .exec()
      .unwrap();
    (points, dendrogram)
  }

  #[test]
  fn candidates_meet_the_size_threshold() {
    let (_, dendrogram) = two_groups();
    let ids = candidates(&dendrogram, 3);
    // the two triples and the root
    assert_eq!(ids, vec![7, 9, 10]);
    for id in ids {
      assert!(dendrogram.link(id).size >= 3);
    }
  }

  #[test]
  fn tight_groups_outlast_the_bridge_root() {
    let (_, dendrogram) = two_groups();
    let left = stability(&dendrogram, 7, 3);
    let right = stability(&dendrogram, 9, 3);
    let root = stability(&dendrogram, 10, 3);
    assert!(left > root);
    assert!(right > root);
    // the root is a true split into two full-size sides, so its
    // persistence covers only the bridge span
    assert!(root < 1.0);
  }

  #[test]
  fn selection_returns_an_antichain_of_the_two_groups() {
    let (points, mut dendrogram) = two_groups();
    let selected = select_optimal(&mut dendrogram, 3, &VarianceScore, points.view());
    let mut ids: Vec<usize> = selected.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![7, 9]);

    // no selected candidate is an ancestor of another, and memberships are
    // disjoint
    for a in &selected {
      for b in &selected {
        if a.id == b.id {
          continue;
        }
        let pa = &dendrogram.link(a.id).points;
        assert!(!dendrogram.link(b.id).points.iter().any(|p| pa.contains(p)));
      }
    }
    for c in &selected {
      assert!(c.score.is_finite());
      assert!(c.score > 0.0);
    }
  }

  #[test]
  fn duplicate_points_produce_finite_or_infinite_but_never_nan_scores() {
    let coords = vec![1.0; 5];
    let points = Array2::from_shape_vec((5, 1), coords).unwrap();
    let edges = vec![
      Edge::new(0, 1, 0.0),
      Edge::new(1, 2, 0.0),
      Edge::new(2, 3, 0.0),
      Edge::new(3, 4, 0.0),
    ];
    let mut dendrogram = DendrogramBuilder::builder()
      .n_points(5)
      .edges(&edges)
      .build()
      .exec()
      .unwrap();
    let selected = select_optimal(&mut dendrogram, 2, &VarianceScore, points.view());
    assert!(!selected.is_empty());
    for c in &selected {
      assert!(!c.score.is_nan());
    }
  }
}
