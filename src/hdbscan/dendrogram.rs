use crate::error::ClusteringError;
use crate::hdbscan::Edge;
use crate::utils::union_find::UnionFind;
use typed_builder::TypedBuilder;

/// One node of the link tree: the merge of two components at a given
/// mutual-reachability weight.
///
/// Leaves (individual points) are implicit; `children` only holds link
/// ids. Parent and child references are arena ids, never owning pointers.
#[derive(Debug, Clone)]
pub(crate) struct Link {
  pub id: usize,
  pub weight: f64,
  /// 1/weight at which this link was born; infinite for zero-weight merges.
  pub lambda_min: f64,
  pub size: usize,
  /// Point indices under this link, kept sorted.
  pub points: Vec<usize>,
  pub parent: Option<usize>,
  pub children: Vec<usize>,
  /// Whether this link survived antichain selection.
  pub delta: bool,
}

/// The forest of agglomerated merges, stored as an indexed arena.
///
/// Link ids start at `n_points`; `link(id)` resolves an id to its arena
/// slot.
#[derive(Debug)]
pub(crate) struct Dendrogram {
  pub n_points: usize,
  pub links: Vec<Link>,
}

impl Dendrogram {
  pub fn link(&self, id: usize) -> &Link {
    &self.links[id - self.n_points]
  }

  pub fn link_mut(&mut self, id: usize) -> &mut Link {
    let at = id - self.n_points;
    &mut self.links[at]
  }
}

/// Single-linkage agglomeration over an ascending-weight edge sequence,
/// backed by a disjoint set over point indices.
///
/// Each component root maps to the link currently representing it (the
/// point index itself for singletons). An edge whose endpoints already
/// share a component would form a cycle and is skipped, so the same
/// builder serves both the spanning-tree path and the all-pairs path.
#[derive(TypedBuilder)]
pub(crate) struct DendrogramBuilder<'e> {
  n_points: usize,
  edges: &'e [Edge],
}

impl DendrogramBuilder<'_> {
  pub fn exec(self) -> Result<Dendrogram, ClusteringError> {
    let n = self.n_points;
    let mut sets = UnionFind::new(n);
    // component root -> representative link id (or leaf point index)
    let mut representative: Vec<usize> = (0..n).collect();
    let mut links: Vec<Link> = Vec::with_capacity(n.saturating_sub(1));
    let mut merges = 0usize;

    for edge in self.edges {
      let ri = sets.find(edge.i);
      let rj = sets.find(edge.j);
      if ri == rj {
        continue;
      }
      let li = representative[ri];
      let lj = representative[rj];
      let id = n + links.len();
      let lambda = if edge.weight > 0.0 {
        1.0 / edge.weight
      } else {
        f64::INFINITY
      };

      let points = {
        let pi: &[usize] = if li < n {
          std::slice::from_ref(&li)
        } else {
          &links[li - n].points
        };
        let pj: &[usize] = if lj < n {
          std::slice::from_ref(&lj)
        } else {
          &links[lj - n].points
        };
        merge_sorted(pi, pj)
      };

      let mut children = Vec::with_capacity(2);
      for child in [li, lj] {
        if child >= n {
          links[child - n].parent = Some(id);
          children.push(child);
        }
      }

      links.push(Link {
        id,
        weight: edge.weight,
        lambda_min: lambda,
        size: points.len(),
        points,
        parent: None,
        children,
        delta: false,
      });

      let root = sets.union(ri, rj);
      representative[root] = id;
      merges += 1;
    }

    if merges + 1 < n {
      let components = n - merges;
      return Err(ClusteringError::Graph(format!(
        "{components} components remain after exhausting all finite edges"
      )));
    }

    Ok(Dendrogram { n_points: n, links })
  }
}

/// Union of two sorted, disjoint index slices.
fn merge_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
  let mut out = Vec::with_capacity(a.len() + b.len());
  let mut ia = 0;
  let mut ib = 0;
  while ia < a.len() && ib < b.len() {
    if a[ia] < b[ib] {
      out.push(a[ia]);
      ia += 1;
    } else {
      out.push(b[ib]);
      ib += 1;
    }
  }
  out.extend_from_slice(&a[ia..]);
  out.extend_from_slice(&b[ib..]);
  out
}
