//! Two-tier adaptive neighbor search
//!
//! Every projected point first looks for `primary_k` neighbors inside a tight
//! radius. Points in sparse regions that come up short discard that result and
//! search again with a wider radius. The two result sets are never merged.

use super::common::{Neighbor, NeighborLink, PointIndex, ProjectedPoint};
use super::kdtree::KdTree;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distances at or below this value map to the maximum weight
pub const MIN_WEIGHT_DISTANCE: f64 = 0.01;
/// Distances at or above this value map to the minimum weight
pub const MAX_WEIGHT_DISTANCE: f64 = 0.99;

/// Radii and neighbor counts of the two search tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborPolicy {
    pub primary_radius: f64,
    pub primary_k: usize,
    pub fallback_radius: f64,
    pub fallback_k: usize,
}

impl NeighborPolicy {
    /// The fixed policy used for every graph build
    pub const STANDARD: NeighborPolicy = NeighborPolicy {
        primary_radius: 0.3,
        primary_k: 3,
        fallback_radius: 1.1,
        fallback_k: 3,
    };
}

impl Default for NeighborPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Which search tier produced a point's final neighbor set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Primary,
    Fallback,
}

/// Final neighbor set of one point
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub source: PointIndex,
    pub tier: Tier,
    /// Accepted neighbors, ascending by distance
    pub neighbors: Vec<Neighbor>,
}

/// Run-wide statistics of a neighbor graph build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    /// Points that ended with no neighbors at all
    pub isolated_nodes: usize,
    /// Points that ended with exactly one neighbor
    pub single_neighbor_nodes: usize,
    /// Points whose primary tier came up short
    pub fallback_activations: usize,
    /// Edges produced by the fallback tier
    pub fallback_edges: usize,
    /// Fallback edges longer than [`MAX_WEIGHT_DISTANCE`], all at the weight floor
    pub distant_fallback_edges: usize,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    /// (min, max) neighbor count over points accepted by the primary tier
    pub primary_count_range: Option<(usize, usize)>,
    /// (min, max) neighbor count over points that fell back
    pub fallback_count_range: Option<(usize, usize)>,
}

/// Neighbor selections for every point plus their summary
#[derive(Debug, Clone)]
pub struct AdaptiveNeighbors {
    /// One selection per point, ordered by source index
    pub selections: Vec<Selection>,
    pub summary: GraphSummary,
}

impl AdaptiveNeighbors {
    /// Weighted links grouped by ascending source, ascending distance within a source
    pub fn links(&self) -> impl Iterator<Item = NeighborLink> + '_ {
        self.selections.iter().flat_map(|selection| {
            selection.neighbors.iter().map(move |n| NeighborLink {
                source: selection.source,
                target: n.index,
                distance: n.distance,
                weight: similarity_weight(n.distance),
            })
        })
    }
}

/// Map a raw distance to a similarity weight in [0.01, 0.99]
///
/// `1 - d` with `d` clamped to [0.01, 0.99].
pub fn similarity_weight(distance: f64) -> f64 {
    1.0 - distance.clamp(MIN_WEIGHT_DISTANCE, MAX_WEIGHT_DISTANCE)
}

fn query_tier(
    tree: &KdTree,
    point: &ProjectedPoint,
    k: usize,
    radius: f64,
) -> Vec<Neighbor> {
    // k + 1: the point itself comes back at distance 0
    tree.nearest(point, k + 1)
        .into_iter()
        .filter(|n| n.index != point.index && n.distance > 0.0 && n.distance < radius)
        .collect()
}

/// Select the neighbors of one point under `policy`
pub fn select_neighbors(
    tree: &KdTree,
    point: &ProjectedPoint,
    policy: &NeighborPolicy,
) -> Selection {
    let primary = query_tier(tree, point, policy.primary_k, policy.primary_radius);

    if primary.len() >= policy.primary_k {
        return Selection {
            source: point.index,
            tier: Tier::Primary,
            neighbors: primary,
        };
    }

    Selection {
        source: point.index,
        tier: Tier::Fallback,
        neighbors: query_tier(tree, point, policy.fallback_k, policy.fallback_radius),
    }
}

/// Build the adaptive neighbor sets of all `points` with [`NeighborPolicy::STANDARD`]
///
/// Links are labelled with each point's `index`. The per-point searches
/// share the read-only tree and run in parallel; results keep point order.
pub fn adaptive_neighbors(points: &[ProjectedPoint]) -> AdaptiveNeighbors {
    build_with_policy(points, &NeighborPolicy::STANDARD)
}

pub(crate) fn build_with_policy(points: &[ProjectedPoint], policy: &NeighborPolicy) -> AdaptiveNeighbors {
    let tree = KdTree::build(points);

    let selections: Vec<Selection> = points
        .par_iter()
        .map(|point| select_neighbors(&tree, point, policy))
        .collect();

    let summary = summarize(&selections);
    debug!(
        nodes = summary.node_count,
        edges = summary.edge_count,
        fallbacks = summary.fallback_activations,
        isolated = summary.isolated_nodes,
        "built adaptive neighbor sets"
    );

    AdaptiveNeighbors { selections, summary }
}

fn widen(range: Option<(usize, usize)>, value: usize) -> Option<(usize, usize)> {
    match range {
        Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        None => Some((value, value)),
    }
}

fn summarize(selections: &[Selection]) -> GraphSummary {
    let mut summary = GraphSummary {
        node_count: selections.len(),
        ..GraphSummary::default()
    };

    for selection in selections {
        let count = selection.neighbors.len();
        summary.edge_count += count;

        match count {
            0 => summary.isolated_nodes += 1,
            1 => summary.single_neighbor_nodes += 1,
            _ => {}
        }

        match selection.tier {
            Tier::Primary => {
                summary.primary_count_range = widen(summary.primary_count_range, count);
            }
            Tier::Fallback => {
                summary.fallback_activations += 1;
                summary.fallback_edges += count;
                summary.distant_fallback_edges += selection
                    .neighbors
                    .iter()
                    .filter(|n| n.distance > MAX_WEIGHT_DISTANCE)
                    .count();
                summary.fallback_count_range = widen(summary.fallback_count_range, count);
            }
        }

        for n in &selection.neighbors {
            summary.min_distance = Some(summary.min_distance.map_or(n.distance, |d| d.min(n.distance)));
            summary.max_distance = Some(summary.max_distance.map_or(n.distance, |d| d.max(n.distance)));
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn points(coords: &[(f64, f64)]) -> Vec<ProjectedPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| ProjectedPoint::new(i, x, y))
            .collect()
    }

    fn targets(selection: &Selection) -> Vec<PointIndex> {
        selection.neighbors.iter().map(|n| n.index).collect()
    }

    #[test]
    fn test_weight_transform() {
        assert_eq!(similarity_weight(0.0), 0.99);
        assert_eq!(similarity_weight(0.005), 0.99);
        assert_eq!(similarity_weight(0.99), 1.0 - 0.99);
        assert_eq!(similarity_weight(2.0), 1.0 - 0.99);
        assert!((similarity_weight(0.25) - 0.75).abs() < 1e-12);

        let mut previous = similarity_weight(0.011);
        let mut d = 0.02;
        while d < 0.99 {
            let w = similarity_weight(d);
            assert!(w < previous);
            previous = w;
            d += 0.01;
        }
    }

    #[test]
    fn test_tight_cluster_uses_primary_tier() {
        let cloud = points(&[(0.0, 0.0), (0.05, 0.0), (0.0, 0.05), (0.05, 0.05), (0.025, 0.03)]);
        let result = adaptive_neighbors(&cloud);

        for selection in &result.selections {
            assert_eq!(selection.tier, Tier::Primary);
            assert_eq!(selection.neighbors.len(), 3);
        }
        for link in result.links() {
            assert!(link.weight >= 0.9);
        }
        assert_eq!(result.summary.edge_count, 15);
        assert_eq!(result.summary.fallback_activations, 0);
        assert_eq!(result.summary.primary_count_range, Some((3, 3)));
    }

    #[test]
    fn test_far_point_is_isolated() {
        let cloud = points(&[(0.0, 0.0), (0.05, 0.0), (0.0, 0.05), (0.05, 0.05), (2.0, 2.0)]);
        let result = adaptive_neighbors(&cloud);

        let lonely = &result.selections[4];
        assert_eq!(lonely.tier, Tier::Fallback);
        assert!(lonely.neighbors.is_empty());
        assert!(result.links().all(|l| l.source != 4 && l.target != 4));
        assert_eq!(result.summary.isolated_nodes, 1);
    }

    #[test]
    fn test_fallback_replaces_primary() {
        let cloud = points(&[
            (0.0, 0.0),
            (0.1, 0.0),
            (0.0, 0.1),
            (0.5, 0.0),
            (5.0, 5.0),
            (5.05, 5.0),
            (5.0, 5.05),
            (5.05, 5.05),
        ]);
        let result = adaptive_neighbors(&cloud);

        let first = &result.selections[0];
        assert_eq!(first.tier, Tier::Fallback);
        assert_eq!(targets(first), vec![1, 2, 3]);
        assert!((first.neighbors[2].distance - 0.5).abs() < 1e-12);

        let weights: Vec<f64> = result.links().filter(|l| l.source == 0).map(|l| l.weight).collect();
        assert_eq!(weights.len(), 3);
        assert!((weights[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_keeps_what_it_finds() {
        // One neighbor within the tight radius, one more within the wide radius
        let cloud = points(&[(0.0, 0.0), (0.2, 0.0), (0.0, 1.0), (4.0, 4.0)]);
        let result = adaptive_neighbors(&cloud);

        let first = &result.selections[0];
        assert_eq!(first.tier, Tier::Fallback);
        assert_eq!(targets(first), vec![1, 2]);
        assert_eq!(result.summary.fallback_count_range.map(|r| r.1), Some(2));
    }

    #[test]
    fn test_small_dataset_caps_query() {
        let cloud = points(&[(0.0, 0.0), (0.1, 0.0), (0.0, 0.1)]);
        let result = adaptive_neighbors(&cloud);

        for selection in &result.selections {
            assert_eq!(selection.tier, Tier::Fallback);
            assert_eq!(selection.neighbors.len(), 2);
        }
    }

    #[test]
    fn test_duplicates_are_not_neighbors() {
        let cloud = points(&[(1.0, 1.0), (1.0, 1.0), (1.2, 1.0), (1.0, 1.2)]);
        let result = adaptive_neighbors(&cloud);

        assert!(result.links().all(|l| l.distance > 0.0));
        assert!(!targets(&result.selections[0]).contains(&1));
    }

    #[test]
    fn test_random_cloud_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let coords: Vec<(f64, f64)> = (0..400)
            .map(|i| {
                // Dense core plus a sparse halo
                let spread = if i % 5 == 0 { 6.0 } else { 1.0 };
                (rng.gen_range(-spread..spread), rng.gen_range(-spread..spread))
            })
            .collect();
        let cloud = points(&coords);
        let policy = NeighborPolicy::STANDARD;
        let result = adaptive_neighbors(&cloud);

        assert_eq!(result.selections.len(), cloud.len());
        let mut previous_source = 0;
        for link in result.links() {
            assert_ne!(link.source, link.target);
            assert!((0.01..=0.99).contains(&link.weight));
            assert!(link.source >= previous_source);
            previous_source = link.source;
        }

        for (i, selection) in result.selections.iter().enumerate() {
            assert_eq!(selection.source, i);
            assert!(selection.neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));

            let mut by_distance: Vec<(f64, usize)> = cloud
                .iter()
                .filter(|p| p.index != i)
                .map(|p| (p.distance_sq(&cloud[i]), p.index))
                .collect();
            by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            match selection.tier {
                Tier::Primary => {
                    assert!(selection.neighbors.len() <= policy.primary_k);
                    assert!(selection.neighbors.iter().all(|n| n.distance < policy.primary_radius));
                }
                Tier::Fallback => {
                    assert!(selection.neighbors.len() <= policy.fallback_k);
                    let expected: Vec<usize> = by_distance
                        .iter()
                        .take(policy.fallback_k)
                        .filter(|(d, _)| d.sqrt() < policy.fallback_radius)
                        .map(|&(_, idx)| idx)
                        .collect();
                    assert_eq!(targets(selection), expected);
                }
            }
        }

        let summary = &result.summary;
        assert_eq!(summary.edge_count, result.links().count());
        assert!(summary.fallback_activations > 0);
        assert!(summary.min_distance.unwrap() <= summary.max_distance.unwrap());
    }

    #[test]
    fn test_summary_counts() {
        let cloud = points(&[
            // Tight square, all primary
            (0.0, 0.0),
            (0.125, 0.0),
            (0.0, 0.125),
            (0.125, 0.125),
            // Reaches only the square's corner, beyond the weight clamp
            (-0.75, -0.75),
            // Nothing within the wide radius
            (10.0, 10.0),
            // Loose triangle, every point falls back with two neighbors
            (20.0, 0.0),
            (20.5, 0.0),
            (20.0, 0.5),
        ]);
        let result = adaptive_neighbors(&cloud);

        let corner = &result.selections[4];
        assert_eq!(corner.tier, Tier::Fallback);
        assert_eq!(targets(corner), vec![0]);
        let corner_link = result.links().find(|l| l.source == 4).unwrap();
        assert!((corner_link.weight - 0.01).abs() < 1e-12);

        let summary = &result.summary;
        assert_eq!(summary.node_count, 9);
        assert_eq!(summary.edge_count, 19);
        assert_eq!(summary.isolated_nodes, 1);
        assert_eq!(summary.single_neighbor_nodes, 1);
        assert_eq!(summary.fallback_activations, 5);
        assert_eq!(summary.fallback_edges, 7);
        assert_eq!(summary.distant_fallback_edges, 1);
        assert_eq!(summary.min_distance, Some(0.125));
        assert!((summary.max_distance.unwrap() - 1.125_f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.primary_count_range, Some((3, 3)));
        assert_eq!(summary.fallback_count_range, Some((0, 2)));
    }

    #[test]
    fn test_links_carry_point_labels() {
        let cloud = vec![
            ProjectedPoint::new(10, 0.0, 0.0),
            ProjectedPoint::new(11, 0.1, 0.0),
            ProjectedPoint::new(12, 0.0, 0.1),
        ];
        let result = adaptive_neighbors(&cloud);

        let sources: Vec<PointIndex> = result.selections.iter().map(|s| s.source).collect();
        assert_eq!(sources, vec![10, 11, 12]);
        assert!(result.links().all(|l| (10..=12).contains(&l.target) && l.source != l.target));
    }

    #[test]
    fn test_custom_policy_widens_primary() {
        let cloud = points(&[(0.0, 0.0), (0.4, 0.0), (0.0, 0.4), (0.4, 0.4)]);
        let wide = NeighborPolicy { primary_radius: 1.0, ..NeighborPolicy::STANDARD };

        let result = build_with_policy(&cloud, &wide);
        assert!(result.selections.iter().all(|s| s.tier == Tier::Primary));
        assert_eq!(result.summary.fallback_activations, 0);
    }
}
