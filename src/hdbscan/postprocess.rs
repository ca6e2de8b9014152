use crate::cluster::Cluster;
use crate::cluster::Outlier;
use crate::config::AssignmentParams;
use crate::metric::Distance;
use crate::score::centroid;
use crate::score::variance;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use rayon::prelude::*;
use typed_builder::TypedBuilder;

/// Post-processing of the selected clusters, applied in a fixed order:
/// centroids, outlier attribution, outlier clustering, Voronoi fill.
/// Centroids are always computed; the remaining steps run only when their
/// option is set.
///
/// All indices here are rows of the training matrix; the driver translates
/// them back to dataset indices afterwards when the run was subsampled.
#[derive(TypedBuilder)]
pub(crate) struct Postprocess<'a, 'd, 'p> {
  points: ArrayView2<'a, f64>,
  distance: &'d dyn Distance,
  assignment: &'p AssignmentParams,
  min_cluster_size: usize,
}

impl Postprocess<'_, '_, '_> {
  pub fn exec(self, clusters: &mut Vec<Cluster>) {
    let Postprocess {
      points,
      distance,
      assignment,
      min_cluster_size,
    } = self;
    let n = points.nrows();

    for cluster in clusters.iter_mut() {
      cluster.centroid = centroid(&cluster.points, points);
    }

    if assignment.outlier_detection {
      let unassigned = unassigned_points(n, clusters, false);
      attach(
        &unassigned,
        clusters,
        points,
        points,
        distance,
        assignment.nearest_neighbor,
        Attachment::Outlier,
      );
      normalize_outliers(clusters);
    }

    if assignment.outlier_clustering {
      promote_outlier_clusters(clusters, points, min_cluster_size);
    }

    if assignment.voronoi {
      let unassigned = unassigned_points(n, clusters, true);
      attach(
        &unassigned,
        clusters,
        points,
        points,
        distance,
        assignment.nearest_neighbor,
        Attachment::Member,
      );
    }
  }
}

/// How `attach` records a point on its nearest cluster.
#[derive(Clone, Copy, PartialEq)]
pub(crate) enum Attachment {
  Member,
  Outlier,
}

/// Point indices covered by no cluster. `count_outliers` also treats a
/// cluster's outliers as covered, which is the rule for Voronoi fill.
pub(crate) fn unassigned_points(
  n: usize,
  clusters: &[Cluster],
  count_outliers: bool,
) -> Vec<usize> {
  let mut covered = vec![false; n];
  for cluster in clusters {
    for &p in &cluster.points {
      covered[p] = true;
    }
    if count_outliers {
      for o in &cluster.outliers {
        covered[o.index] = true;
      }
    }
  }
  (0..n).filter(|&p| !covered[p]).collect()
}

/// Nearness of a point to a cluster: distance to the centroid, or the
/// minimum distance to any member when `by_nearest_member` is set. Member
/// indices are rows of `member_points`.
fn nearness(
  point: ArrayView1<f64>,
  cluster: &Cluster,
  member_points: ArrayView2<f64>,
  distance: &dyn Distance,
  by_nearest_member: bool,
) -> f64 {
  if by_nearest_member {
    let mut best = f64::INFINITY;
    for &m in &cluster.points {
      let d = distance.distance(point, member_points.row(m));
      if d < best {
        best = d;
      }
    }
    best
  } else {
    distance.distance(point, cluster.centroid.view())
  }
}

/// Index of the nearest cluster and the nearness to it. Ties keep the
/// earliest cluster in the list.
pub(crate) fn nearest_cluster(
  point: ArrayView1<f64>,
  clusters: &[Cluster],
  member_points: ArrayView2<f64>,
  distance: &dyn Distance,
  by_nearest_member: bool,
) -> Option<(usize, f64)> {
  let mut best: Option<(usize, f64)> = None;
  for (at, cluster) in clusters.iter().enumerate() {
    let d = nearness(point, cluster, member_points, distance, by_nearest_member);
    if best.is_none() || d < best.map(|(_, b)| b).unwrap_or(f64::INFINITY) {
      best = Some((at, d));
    }
  }
  best
}

/// Attach each listed point to its nearest cluster, as a member or as an
/// outlier. The nearest-cluster searches run in parallel; the appends are
/// replayed in input order so the outcome is deterministic.
pub(crate) fn attach(
  indices: &[usize],
  clusters: &mut [Cluster],
  query_points: ArrayView2<f64>,
  member_points: ArrayView2<f64>,
  distance: &dyn Distance,
  by_nearest_member: bool,
  attachment: Attachment,
) {
  let snapshot: &[Cluster] = clusters;
  let targets: Vec<Option<(usize, f64)>> = indices
    .par_iter()
    .map(|&p| {
      nearest_cluster(
        query_points.row(p),
        snapshot,
        member_points,
        distance,
        by_nearest_member,
      )
    })
    .collect();

  for (&p, target) in indices.iter().zip(targets) {
    let Some((at, d)) = target else { continue };
    match attachment {
      Attachment::Member => clusters[at].points.push(p),
      Attachment::Outlier => clusters[at].outliers.push(Outlier {
        index: p,
        distance: d,
        normalized_distance: 0.0,
      }),
    }
  }
}

/// Scale each cluster's outlier distances by the largest one observed, so
/// the farthest outlier of a cluster sits at 1.0.
pub(crate) fn normalize_outliers(clusters: &mut [Cluster]) {
  for cluster in clusters.iter_mut() {
    let max = cluster
      .outliers
      .iter()
      .map(|o| o.distance)
      .fold(0.0, f64::max);
    for o in &mut cluster.outliers {
      o.normalized_distance = if max > 0.0 { o.distance / max } else { 0.0 };
    }
  }
}

/// Promote the outliers of any cluster that accumulated at least the
/// minimum cluster size of them into a standalone cluster of their own.
pub(crate) fn promote_outlier_clusters(
  clusters: &mut Vec<Cluster>,
  points: ArrayView2<f64>,
  min_cluster_size: usize,
) {
  let mut next_id = clusters.iter().map(|c| c.id).max().map_or(0, |id| id + 1);
  let mut promoted = Vec::new();

  for cluster in clusters.iter_mut() {
    if cluster.outliers.len() < min_cluster_size {
      continue;
    }
    let mut members: Vec<usize> = cluster.outliers.drain(..).map(|o| o.index).collect();
    members.sort_unstable();
    let centroid = centroid(&members, points);
    let variance = variance(&members, points);
    promoted.push(Cluster {
      id: next_id,
      points: members,
      outliers: Vec::new(),
      centroid,
      variance,
      score: 0.0,
    });
    next_id += 1;
  }

  clusters.extend(promoted);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::distances::EuclideanDistance;
  use ndarray::array;
  use ndarray::Array1;

  fn bare_cluster(id: usize, points: Vec<usize>) -> Cluster {
    Cluster {
      id,
      points,
      outliers: Vec::new(),
      centroid: Array1::zeros(1),
      variance: 0.0,
      score: 1.0,
    }
  }

  #[test]
  fn outliers_attach_to_the_nearest_centroid() {
    let points = array![[0.0], [1.0], [10.0], [11.0], [3.0]];
    let mut clusters = vec![bare_cluster(5, vec![0, 1]), bare_cluster(6, vec![2, 3])];
    Postprocess::builder()
      .points(points.view())
      .distance(&EuclideanDistance)
      .assignment(&AssignmentParams {
        outlier_detection: true,
        ..Default::default()
      })
      .min_cluster_size(2)
      .build()
      .exec(&mut clusters);

    assert!(clusters[1].outliers.is_empty());
    assert_eq!(clusters[0].outliers.len(), 1);
    let o = &clusters[0].outliers[0];
    assert_eq!(o.index, 4);
    assert_eq!(o.distance, 2.5);
    assert_eq!(o.normalized_distance, 1.0);
  }

  #[test]
  fn voronoi_fill_leaves_no_point_behind() {
    let points = array![[0.0], [1.0], [10.0], [11.0], [3.0], [8.0]];
    let mut clusters = vec![bare_cluster(6, vec![0, 1]), bare_cluster(7, vec![2, 3])];
    Postprocess::builder()
      .points(points.view())
      .distance(&EuclideanDistance)
      .assignment(&AssignmentParams {
        voronoi: true,
        ..Default::default()
      })
      .min_cluster_size(2)
      .build()
      .exec(&mut clusters);

    assert_eq!(clusters[0].points, vec![0, 1, 4]);
    assert_eq!(clusters[1].points, vec![2, 3, 5]);
    let assigned: usize = clusters.iter().map(|c| c.points.len()).sum();
    assert_eq!(assigned, 6);
  }

  #[test]
  fn nearest_member_rule_beats_centroid_when_requested() {
    // cluster 0 has a member at 4.0 even though its centroid is at 2.0;
    // the point at 4.5 is centroid-closer to cluster 1 but member-closer
    // to cluster 0
    let points = array![[0.0], [4.0], [6.0], [7.0], [4.5]];
    let mut clusters = vec![bare_cluster(5, vec![0, 1]), bare_cluster(6, vec![2, 3])];
    Postprocess::builder()
      .points(points.view())
      .distance(&EuclideanDistance)
      .assignment(&AssignmentParams {
        outlier_detection: true,
        nearest_neighbor: true,
        ..Default::default()
      })
      .min_cluster_size(2)
      .build()
      .exec(&mut clusters);

    assert_eq!(clusters[0].outliers.len(), 1);
    assert_eq!(clusters[0].outliers[0].index, 4);
  }

  #[test]
  fn enough_outliers_become_their_own_cluster() {
    let points = array![[0.0], [1.0], [20.0], [21.0], [22.0]];
    let mut clusters = vec![bare_cluster(5, vec![0, 1])];
    Postprocess::builder()
      .points(points.view())
      .distance(&EuclideanDistance)
      .assignment(&AssignmentParams {
        outlier_detection: true,
        outlier_clustering: true,
        ..Default::default()
      })
      .min_cluster_size(3)
      .build()
      .exec(&mut clusters);

    assert_eq!(clusters.len(), 2);
    assert!(clusters[0].outliers.is_empty());
    assert_eq!(clusters[1].points, vec![2, 3, 4]);
    assert_eq!(clusters[1].id, 6);
    assert!(clusters[1].outliers.is_empty());
    assert_eq!(clusters[1].centroid, array![21.0]);
  }
}
