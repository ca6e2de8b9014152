//! Density-based hierarchical clustering in Rust, after the HDBSCAN family
//! of algorithms.
//!
//! Given a point set and a minimum cluster size, the engine builds the
//! mutual-reachability graph, collapses its minimum spanning tree into a
//! dendrogram, and selects the most persistent antichain of dendrogram
//! nodes as the flat clustering. Points outside every selected cluster can
//! be attached as outliers, promoted to clusters of their own, or swept in
//! Voronoi-style, depending on the active options.
//!
//! # Example
//!
//! ```ignore
//! use hdbscan::{Clustering, EuclideanDistance, VarianceScore};
//!
//! let mut clustering = Clustering::new(points, 3)?.outlier_detection();
//! clustering.run(EuclideanDistance, VarianceScore, true)?;
//!
//! for cluster in clustering.clusters() {
//!   println!(
//!     "cluster {} holds {} points and {} outliers",
//!     cluster.id(),
//!     cluster.points().len(),
//!     cluster.outliers().len(),
//!   );
//! }
//! ```
//!
//! # Features
//!
//! - **Pluggable capabilities**: distance and cluster-score functions are
//!   traits with blanket impls for plain closures
//! - **Parallel distance passes**: the O(n²) stages fan out over Rayon
//!   with index tie-breaks, so results stay deterministic
//! - **Subsampling**: train on a slice or a random sample of the data and
//!   attach the rest afterwards with `assign`
//!
//! # Limitations
//!
//! - Exact neighbor computation only, O(n²) in distance evaluations
//! - Batch clustering: no incremental or streaming updates
//! - Single machine, in memory
//!
//! # Public API
//!
//! * [`Clustering`] - lifecycle: construct, configure, run, assign
//! * [`Cluster`], [`Outlier`] - the output model
//! * [`ClusteringConfig`] - configuration record behind the options
//! * [`Distance`], [`EuclideanDistance`], [`ManhattanDistance`] - metrics
//! * [`ClusterScore`], [`VarianceScore`] - cluster scoring
//! * [`ClusteringError`] - typed failures

// Public modules
pub mod config;
pub mod metric;
pub mod score;

// Public re-exports (primary API)
pub use cluster::Cluster;
pub use cluster::Outlier;
pub use clustering::Clustering;
pub use config::ClusteringConfig;
pub use distances::EuclideanDistance;
pub use distances::ManhattanDistance;
pub use error::ClusteringError;
pub use metric::Distance;
pub use score::ClusterScore;
pub use score::VarianceScore;

// Internal modules (not exposed)
mod cluster;
mod clustering;
mod distances;
mod error;
mod hdbscan;
mod utils;
