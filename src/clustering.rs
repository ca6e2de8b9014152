use crate::cluster::Cluster;
use crate::config::ClusteringConfig;
use crate::error::ClusteringError;
use crate::hdbscan::core_distances::CoreDistances;
use crate::hdbscan::dendrogram::Dendrogram;
use crate::hdbscan::dendrogram::DendrogramBuilder;
use crate::hdbscan::mst::MinimumSpanningTree;
use crate::hdbscan::mutual_reachability::MutualReachabilityGraph;
use crate::hdbscan::postprocess;
use crate::hdbscan::postprocess::Attachment;
use crate::hdbscan::postprocess::Postprocess;
use crate::hdbscan::selection::select_optimal;
use crate::metric::Distance;
use crate::score::ClusterScore;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A density-based hierarchical clustering of a point set.
///
/// The lifecycle is: construct with [`Clustering::new`], adjust behavior
/// through the chainable option methods, execute the pipeline once with
/// [`run`](Clustering::run), then read the [`clusters`](Clustering::clusters)
/// or hand new points to [`assign`](Clustering::assign).
///
/// # Example
///
/// ```ignore
/// use hdbscan::{Clustering, EuclideanDistance, VarianceScore};
///
/// let mut clustering = Clustering::new(points, 3)?
///   .outlier_detection()
///   .nearest_neighbor();
/// clustering.run(EuclideanDistance, VarianceScore, true)?;
/// for cluster in clustering.clusters() {
///   println!("{}: {} members", cluster.id(), cluster.points().len());
/// }
/// ```
pub struct Clustering {
  points: Array2<f64>,
  min_cluster_size: usize,
  config: ClusteringConfig,
  /// Explicit training indices drawn by `subsample_with`, ascending.
  sampled: Option<Vec<usize>>,
  /// Distance used by the last run, retained for `assign`.
  distance: Option<Arc<dyn Distance>>,
  /// Link tree built by the last run.
  dendrogram: Option<Dendrogram>,
  clusters: Vec<Cluster>,
  ran: bool,
}

impl Clustering {
  /// Validating constructor.
  ///
  /// Requires a non-empty point set of uniform dimension at least 1, a
  /// minimum cluster size of at least 2, and at least twice the minimum
  /// cluster size worth of points. Violations are reported as
  /// [`ClusteringError::Configuration`].
  pub fn new(points: Vec<Vec<f64>>, min_cluster_size: usize) -> Result<Self, ClusteringError> {
    if min_cluster_size < 2 {
      return Err(ClusteringError::Configuration(format!(
        "minimum cluster size must be at least 2, got {min_cluster_size}"
      )));
    }
    let points = pack_points(points)?;
    if points.nrows() < 2 * min_cluster_size {
      return Err(ClusteringError::Configuration(format!(
        "{} points are too few for a minimum cluster size of {min_cluster_size}; need at least {}",
        points.nrows(),
        2 * min_cluster_size
      )));
    }
    Ok(Self {
      points,
      min_cluster_size,
      config: ClusteringConfig::default(),
      sampled: None,
      distance: None,
      dendrogram: None,
      clusters: Vec::new(),
      ran: false,
    })
  }

  /// Emit per-stage progress events through `tracing`.
  pub fn verbose(mut self) -> Self {
    self.config.verbose = true;
    self
  }

  /// Append every otherwise-unassigned point to its nearest cluster after
  /// selection.
  pub fn voronoi(mut self) -> Self {
    self.config.assignment.voronoi = true;
    self
  }

  /// Attach unassigned points to their nearest cluster as outliers.
  pub fn outlier_detection(mut self) -> Self {
    self.config.assignment.outlier_detection = true;
    self
  }

  /// Measure nearness by the closest member point instead of the centroid.
  pub fn nearest_neighbor(mut self) -> Self {
    self.config.assignment.nearest_neighbor = true;
    self
  }

  /// Promote a cluster's outliers to a standalone cluster once they reach
  /// the minimum cluster size.
  pub fn outlier_clustering(mut self) -> Self {
    self.config.assignment.outlier_clustering = true;
    self
  }

  /// Train on the first `m` points only. The remaining points can be
  /// attached afterwards with [`assign`](Clustering::assign).
  pub fn subsample(mut self, m: usize) -> Self {
    self.config.sampling.subsample = Some(m);
    self
  }

  /// Train on `m` points drawn uniformly from the caller's entropy source.
  pub fn subsample_with<R: Rng + ?Sized>(mut self, m: usize, rng: &mut R) -> Self {
    self.config.sampling.subsample = Some(m);
    if m <= self.points.nrows() {
      let mut indices = rand::seq::index::sample(rng, self.points.nrows(), m).into_vec();
      indices.sort_unstable();
      self.sampled = Some(indices);
    }
    self
  }

  /// The active configuration.
  pub fn config(&self) -> &ClusteringConfig {
    &self.config
  }

  /// The point matrix this clustering owns, one row per point.
  pub fn points(&self) -> ArrayView2<'_, f64> {
    self.points.view()
  }

  /// The minimum cluster size.
  pub fn min_cluster_size(&self) -> usize {
    self.min_cluster_size
  }

  /// The output clusters. Empty until [`run`](Clustering::run) completes.
  pub fn clusters(&self) -> &[Cluster] {
    &self.clusters
  }

  /// Execute the clustering pipeline.
  ///
  /// `distance` weighs point pairs, `score` rates candidate clusters, and
  /// `use_mst` selects between spanning-tree construction (the default
  /// path) and feeding every mutual-reachability edge to the
  /// agglomeration directly. Single-shot: a second invocation returns
  /// [`ClusteringError::State`].
  pub fn run<D, S>(&mut self, distance: D, score: S, use_mst: bool) -> Result<(), ClusteringError>
  where
    D: Distance + 'static,
    S: ClusterScore + 'static,
  {
    if self.ran {
      return Err(ClusteringError::State(
        "run may only be invoked once per clustering".to_string(),
      ));
    }
    let distance: Arc<dyn Distance> = Arc::new(distance);
    let sampled = self.resolve_sample()?;
    let training = self.points.select(Axis(0), &sampled);
    let n = training.nrows();

    let started = Instant::now();
    let core_distances = CoreDistances::builder()
      .points(training.view())
      .k(self.min_cluster_size)
      .distance(distance.as_ref())
      .build()
      .exec()?;
    if self.config.verbose {
      info!(
        points = n,
        duration_ms = started.elapsed().as_millis() as u64,
        "core distances computed"
      );
    }

    let started = Instant::now();
    let edges = if use_mst {
      MinimumSpanningTree::builder()
        .points(training.view())
        .core_distances(&core_distances)
        .distance(distance.as_ref())
        .build()
        .exec()?
    } else {
      MutualReachabilityGraph::builder()
        .points(training.view())
        .core_distances(&core_distances)
        .distance(distance.as_ref())
        .build()
        .exec()?
    };
    if self.config.verbose {
      info!(
        edges = edges.len(),
        spanning_tree = use_mst,
        duration_ms = started.elapsed().as_millis() as u64,
        "mutual reachability edges ready"
      );
    }

    let started = Instant::now();
    let mut dendrogram = DendrogramBuilder::builder()
      .n_points(n)
      .edges(&edges)
      .build()
      .exec()?;
    let selected = select_optimal(
      &mut dendrogram,
      self.min_cluster_size,
      &score,
      training.view(),
    );
    let mut clusters: Vec<Cluster> = selected
      .iter()
      .map(|s| Cluster {
        id: s.id,
        points: dendrogram.link(s.id).points.clone(),
        outliers: Vec::new(),
        centroid: Array1::zeros(training.ncols()),
        variance: s.variance,
        score: s.score,
      })
      .collect();
    if self.config.verbose {
      info!(
        links = dendrogram.links.len(),
        clusters = clusters.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "dendrogram condensed and clusters selected"
      );
    }

    let started = Instant::now();
    Postprocess::builder()
      .points(training.view())
      .distance(distance.as_ref())
      .assignment(&self.config.assignment)
      .min_cluster_size(self.min_cluster_size)
      .build()
      .exec(&mut clusters);
    if self.config.verbose {
      info!(
        duration_ms = started.elapsed().as_millis() as u64,
        "post-processing finished"
      );
    }

    // translate training-row indices back to dataset indices
    for cluster in &mut clusters {
      for p in &mut cluster.points {
        *p = sampled[*p];
      }
      for o in &mut cluster.outliers {
        o.index = sampled[o.index];
      }
    }

    self.clusters = clusters;
    self.dendrogram = Some(dendrogram);
    self.distance = Some(distance);
    self.ran = true;
    Ok(())
  }

  /// Attach a new point set to the trained clusters.
  ///
  /// Returns a fresh clustering over `points` whose clusters share the
  /// trained ids, centroids, scores, and variances but start with empty
  /// memberships. Every passed point is attached to its nearest cluster
  /// under the active nearness rule: as an outlier when outlier detection
  /// is on, as a member otherwise. The trained clustering is not mutated.
  pub fn assign(&self, points: Vec<Vec<f64>>) -> Result<Clustering, ClusteringError> {
    if !self.ran {
      return Err(ClusteringError::State(
        "assign requires a clustering that has completed a run".to_string(),
      ));
    }
    let distance = self.distance.clone().ok_or_else(|| {
      ClusteringError::State("assign requires the distance used by the run".to_string())
    })?;
    let points = pack_points(points)?;
    if points.ncols() != self.points.ncols() {
      return Err(ClusteringError::Configuration(format!(
        "assigned points have dimension {}, trained on {}",
        points.ncols(),
        self.points.ncols()
      )));
    }

    let mut clusters: Vec<Cluster> = self
      .clusters
      .iter()
      .map(|c| Cluster {
        id: c.id,
        points: Vec::new(),
        outliers: Vec::new(),
        centroid: c.centroid.clone(),
        variance: c.variance,
        score: c.score,
      })
      .collect();

    let indices: Vec<usize> = (0..points.nrows()).collect();
    let attachment = if self.config.assignment.outlier_detection {
      Attachment::Outlier
    } else {
      Attachment::Member
    };
    // nearest-member nearness is measured against the trained members,
    // whose indices refer to the trained point matrix
    postprocess::attach(
      &indices,
      &mut clusters,
      points.view(),
      self.points.view(),
      distance.as_ref(),
      self.config.assignment.nearest_neighbor,
      attachment,
    );
    if attachment == Attachment::Outlier {
      postprocess::normalize_outliers(&mut clusters);
    }
    if self.config.assignment.outlier_clustering {
      postprocess::promote_outlier_clusters(&mut clusters, points.view(), self.min_cluster_size);
    }

    Ok(Clustering {
      points,
      min_cluster_size: self.min_cluster_size,
      config: self.config.clone(),
      sampled: None,
      distance: Some(distance),
      dendrogram: None,
      clusters,
      ran: true,
    })
  }

  /// Training indices for this run: the drawn sample, the first `m`
  /// points, or everything.
  fn resolve_sample(&self) -> Result<Vec<usize>, ClusteringError> {
    let n = self.points.nrows();
    match self.config.sampling.subsample {
      None => Ok((0..n).collect()),
      Some(m) => {
        if m > n {
          return Err(ClusteringError::Configuration(format!(
            "subsample of {m} points exceeds the dataset of {n}"
          )));
        }
        if m < 2 * self.min_cluster_size {
          return Err(ClusteringError::Configuration(format!(
            "subsample of {m} points is too small for a minimum cluster size of {}",
            self.min_cluster_size
          )));
        }
        match &self.sampled {
          Some(indices) => Ok(indices.clone()),
          None => Ok((0..m).collect()),
        }
      }
    }
  }

  /// The link tree built by the last run, for in-crate inspection.
  #[allow(dead_code)]
  pub(crate) fn dendrogram(&self) -> Option<&Dendrogram> {
    self.dendrogram.as_ref()
  }
}

/// Pack row vectors into a matrix, rejecting empty or ragged input.
fn pack_points(points: Vec<Vec<f64>>) -> Result<Array2<f64>, ClusteringError> {
  if points.is_empty() {
    return Err(ClusteringError::Configuration(
      "point set is empty".to_string(),
    ));
  }
  let dim = points[0].len();
  if dim == 0 {
    return Err(ClusteringError::Configuration(
      "points must have at least one dimension".to_string(),
    ));
  }
  let n = points.len();
  let mut flat = Vec::with_capacity(n * dim);
  for (at, point) in points.into_iter().enumerate() {
    if point.len() != dim {
      return Err(ClusteringError::Configuration(format!(
        "point 0 has {dim} dimensions but point {at} has {}",
        point.len()
      )));
    }
    flat.extend(point);
  }
  Array2::from_shape_vec((n, dim), flat)
    .map_err(|e| ClusteringError::Configuration(e.to_string()))
}
