//! Static 2-D k-d tree
//!
//! Built once over the full set of projected points, then queried read-only.
//! Construction splits on the median of alternating axes, giving a balanced
//! tree in O(N log N); k-nearest queries prune subtrees with the distance to
//! the splitting line.

use super::common::{Neighbor, PointIndex, ProjectedPoint};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct KdNode {
    /// Position of the splitting point in `KdTree::points`
    point: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Candidate kept in the bounded max-heap during a query
#[derive(Copy, Clone, PartialEq)]
struct Candidate {
    distance_sq: f64,
    index: PointIndex,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on distance; the larger index loses ties
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Balanced k-d tree over projected points
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<ProjectedPoint>,
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl KdTree {
    /// Build the tree over `points`. Point indices are kept as given.
    pub fn build(points: &[ProjectedPoint]) -> Self {
        let mut tree = KdTree {
            points: points.to_vec(),
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };

        let mut order: Vec<usize> = (0..points.len()).collect();
        tree.root = tree.build_recursive(&mut order, 0);
        tree
    }

    fn build_recursive(&mut self, slots: &mut [usize], depth: usize) -> Option<usize> {
        if slots.is_empty() {
            return None;
        }

        let axis = depth % 2;
        let median = slots.len() / 2;
        let points = &self.points;
        slots.select_nth_unstable_by(median, |&a, &b| {
            points[a]
                .coord(axis)
                .total_cmp(&points[b].coord(axis))
                .then(points[a].index.cmp(&points[b].index))
        });

        let node_idx = self.nodes.len();
        self.nodes.push(KdNode {
            point: slots[median],
            axis,
            left: None,
            right: None,
        });

        let (lower, upper) = slots.split_at_mut(median);
        let left = self.build_recursive(lower, depth + 1);
        let right = self.build_recursive(&mut upper[1..], depth + 1);

        self.nodes[node_idx].left = left;
        self.nodes[node_idx].right = right;
        Some(node_idx)
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The `k` points nearest to `query`, ordered by ascending distance
    /// (ties by ascending index).
    ///
    /// A point at the query location is returned like any other, so querying
    /// with an indexed point yields that point first at distance 0. Asking for
    /// more points than the tree holds returns every point.
    pub fn nearest(&self, query: &ProjectedPoint, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.points.len());
        if k == 0 {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = self.root {
            self.search(root, query, k, &mut heap);
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.distance_sq.sqrt(),
            })
            .collect()
    }

    fn search(
        &self,
        node_idx: usize,
        query: &ProjectedPoint,
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let node = &self.nodes[node_idx];
        let point = &self.points[node.point];

        let candidate = Candidate {
            distance_sq: point.distance_sq(query),
            index: point.index,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let diff = query.coord(node.axis) - point.coord(node.axis);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search(near, query, k, heap);
        }

        if let Some(far) = far {
            // Points exactly on the splitting line can still tie the worst candidate
            let must_visit = heap.len() < k
                || heap
                    .peek()
                    .is_some_and(|worst| diff * diff <= worst.distance_sq);
            if must_visit {
                self.search(far, query, k, heap);
            }
        }
    }
}
