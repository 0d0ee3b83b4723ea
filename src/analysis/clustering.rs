//! Agglomerative single-linkage clustering for the clustergram

/// One merge step. Ids below `n_leaves` are leaves; id `n_leaves + k` is the
/// cluster created by merge `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

/// Drawing segment of one merge, in leaf-slot coordinates: a "⊓" joining the
/// two children at `height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub left_pos: f64,
    pub left_height: f64,
    pub right_pos: f64,
    pub right_height: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    pub n_leaves: usize,
    pub merges: Vec<Merge>,
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Single linkage over Euclidean distance
pub fn single_linkage(points: &[Vec<f64>]) -> Dendrogram {
    let n = points.len();
    if n < 2 {
        return Dendrogram {
            n_leaves: n,
            merges: Vec::new(),
        };
    }
    let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            condensed.push(euclidean(&points[i], &points[j]));
        }
    }
    let merges = kodama::linkage(&mut condensed, n, kodama::Method::Single)
        .steps()
        .iter()
        .map(|step| Merge {
            left: step.cluster1.min(step.cluster2),
            right: step.cluster1.max(step.cluster2),
            distance: step.dissimilarity,
            size: step.size,
        })
        .collect();
    Dendrogram { n_leaves: n, merges }
}

impl Dendrogram {
    /// Leaves in dendrogram order (left subtree first)
    pub fn leaf_order(&self) -> Vec<usize> {
        if self.n_leaves == 0 {
            return Vec::new();
        }
        let Some(root) = self.merges.len().checked_sub(1).map(|k| self.n_leaves + k) else {
            return vec![0];
        };
        let mut order = Vec::with_capacity(self.n_leaves);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id < self.n_leaves {
                order.push(id);
            } else {
                let m = &self.merges[id - self.n_leaves];
                stack.push(m.right);
                stack.push(m.left);
            }
        }
        order
    }

    /// One link per merge; leaf `k` of `leaf_order()` sits at position `k + 0.5`
    pub fn links(&self) -> Vec<Link> {
        let order = self.leaf_order();
        let mut pos = vec![0.0; self.n_leaves + self.merges.len()];
        let mut height = vec![0.0; self.n_leaves + self.merges.len()];
        for (slot, leaf) in order.iter().enumerate() {
            pos[*leaf] = slot as f64 + 0.5;
        }
        self.merges
            .iter()
            .enumerate()
            .map(|(k, m)| {
                let id = self.n_leaves + k;
                pos[id] = (pos[m.left] + pos[m.right]) / 2.0;
                height[id] = m.distance;
                Link {
                    left_pos: pos[m.left],
                    left_height: height[m.left],
                    right_pos: pos[m.right],
                    right_height: height[m.right],
                    height: m.distance,
                }
            })
            .collect()
    }

    pub fn max_height(&self) -> f64 {
        self.merges.iter().map(|m| m.distance).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_linkage_merges_nearest_first() {
        let points = vec![vec![0.0], vec![10.0], vec![1.0], vec![11.5]];
        let d = single_linkage(&points);
        assert_eq!(d.merges.len(), 3);
        assert_eq!((d.merges[0].left, d.merges[0].right), (0, 2));
        assert_eq!(d.merges[0].distance, 1.0);
        assert_eq!((d.merges[1].left, d.merges[1].right), (1, 3));
        // single linkage: clusters join at their closest members (1 and 10)
        assert_eq!(d.merges[2].distance, 9.0);
        assert_eq!(d.merges[2].size, 4);
    }

    #[test]
    fn test_leaf_order_keeps_clusters_together() {
        let points = vec![vec![0.0], vec![10.0], vec![1.0], vec![11.5]];
        let d = single_linkage(&points);
        assert_eq!(d.leaf_order(), vec![0, 2, 1, 3]);
        let links = d.links();
        assert_eq!(links[0].left_pos, 0.5);
        assert_eq!(links[0].right_pos, 1.5);
        assert_eq!(links[2].height, d.max_height());
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(single_linkage(&[]).leaf_order().is_empty());
        assert_eq!(single_linkage(&[vec![1.0]]).leaf_order(), vec![0]);
    }
}
