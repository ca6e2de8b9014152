use ndarray::Array1;
use ndarray::ArrayView1;
use serde::Deserialize;
use serde::Serialize;

/// A point attached to a cluster by proximity rather than by membership in
/// the selected dendrogram node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
  pub(crate) index: usize,
  pub(crate) distance: f64,
  pub(crate) normalized_distance: f64,
}

impl Outlier {
  /// Index of the point in the dataset the clustering was built over.
  pub fn index(&self) -> usize {
    self.index
  }

  /// Raw nearness to the host cluster, per the active nearness rule.
  pub fn distance(&self) -> f64 {
    self.distance
  }

  /// Nearness divided by the largest nearness among the host cluster's
  /// outliers, in [0, 1]. A lone outlier normalizes to 1.
  pub fn normalized_distance(&self) -> f64 {
    self.normalized_distance
  }
}

/// One cluster of a finished clustering.
///
/// Point and outlier indices refer to the dataset the clustering was
/// constructed over (for a subsampled run they are translated back to the
/// original dataset). The struct is a plain value: it can be cloned,
/// compared, and serialized for storage or transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
  pub(crate) id: usize,
  pub(crate) points: Vec<usize>,
  pub(crate) outliers: Vec<Outlier>,
  pub(crate) centroid: Array1<f64>,
  pub(crate) variance: f64,
  pub(crate) score: f64,
}

impl Cluster {
  /// Stable identifier of the dendrogram node this cluster was selected
  /// from. Opaque, unique within one clustering.
  pub fn id(&self) -> usize {
    self.id
  }

  /// Indices of the member points.
  pub fn points(&self) -> &[usize] {
    &self.points
  }

  /// Points attached by outlier attribution.
  pub fn outliers(&self) -> &[Outlier] {
    &self.outliers
  }

  /// Arithmetic mean of the member points.
  pub fn centroid(&self) -> ArrayView1<'_, f64> {
    self.centroid.view()
  }

  /// Mean squared deviation of the member points from the centroid.
  pub fn variance(&self) -> f64 {
    self.variance
  }

  /// Final cluster score: the score capability's value weighted by the
  /// cluster's persistence in the dendrogram.
  pub fn score(&self) -> f64 {
    self.score
  }

  /// Whether the given point index is a member or an outlier of this
  /// cluster.
  pub fn contains(&self, index: usize) -> bool {
    self.points.contains(&index) || self.outliers.iter().any(|o| o.index == index)
  }
}
