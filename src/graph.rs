//! Occupation neighbor graph
//!
//! Adapter between the feature table and `skillmap-algorithms`: sanitizes and
//! projects the table, runs the adaptive neighbor search, and labels every
//! link with the titles of the two occupations it connects.

use crate::error::{DataError, DataResult};
use crate::matrix::{DenseMatrix, FeatureTable, OccupationRow};
use serde::{Deserialize, Serialize};
use skillmap_algorithms::{adaptive_neighbors, project_2d, ProjectedPoint, Projection};
use tracing::{info, warn};

// Re-export the algorithm types callers need alongside the graph
pub use skillmap_algorithms::{similarity_weight, GraphSummary, NeighborPolicy, Tier};

/// A directed similarity edge between two occupations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborEdge {
    /// "<source title> -- <target title>"
    pub desc: String,
    pub source: usize,
    pub target: usize,
    /// Similarity in [0.01, 0.99]
    pub weight: f64,
}

/// Edges of every occupation, grouped by ascending source index
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    pub edges: Vec<NeighborEdge>,
    /// Search tier that produced each occupation's edges, by occupation index
    pub tiers: Vec<Tier>,
    pub summary: GraphSummary,
}

impl NeighborGraph {
    /// Outgoing edges of occupation `source`
    pub fn edges_from(&self, source: usize) -> impl Iterator<Item = &NeighborEdge> + '_ {
        self.edges.iter().filter(move |e| e.source == source)
    }
}

/// Describe an edge by the titles it joins
pub fn edge_description(source: &OccupationRow, target: &OccupationRow) -> String {
    format!("{} -- {}", source.title, target.title)
}

/// Build the neighbor graph over projected points aligned with `rows`
pub fn build_neighbor_graph(
    rows: &[OccupationRow],
    points: &[ProjectedPoint],
) -> DataResult<NeighborGraph> {
    if rows.len() != points.len() {
        return Err(DataError::RowCountMismatch {
            rows: rows.len(),
            points: points.len(),
        });
    }

    if let Some((position, point)) = points.iter().enumerate().find(|(i, p)| p.index != *i) {
        return Err(DataError::MisindexedPoint {
            position,
            index: point.index,
        });
    }

    let neighbors = adaptive_neighbors(points);

    let edges = neighbors
        .links()
        .map(|link| NeighborEdge {
            desc: edge_description(&rows[link.source], &rows[link.target]),
            source: link.source,
            target: link.target,
            weight: link.weight,
        })
        .collect();
    let tiers = neighbors.selections.iter().map(|s| s.tier).collect();

    let summary = neighbors.summary;
    info!(
        nodes = summary.node_count,
        edges = summary.edge_count,
        fallbacks = summary.fallback_activations,
        isolated = summary.isolated_nodes,
        single = summary.single_neighbor_nodes,
        "built neighbor graph"
    );
    if summary.isolated_nodes > 0 {
        warn!(
            isolated = summary.isolated_nodes,
            "occupations without any neighbor within the fallback radius"
        );
    }

    Ok(NeighborGraph { edges, tiers, summary })
}

/// Sanitize `table` and project it to two dimensions
pub fn project_table(table: &FeatureTable) -> DataResult<(DenseMatrix, Projection)> {
    let matrix = table.sanitize()?;
    let projection = project_2d(matrix.values())?;

    info!(
        rows = matrix.nrows(),
        columns = matrix.ncols(),
        retained_variance = projection.retained_variance(),
        "projected occupations"
    );

    Ok((matrix, projection))
}

/// Everything derived from one feature table
#[derive(Debug, Clone)]
pub struct OccupationGraph {
    pub matrix: DenseMatrix,
    pub projection: Projection,
    pub graph: NeighborGraph,
}

impl OccupationGraph {
    /// Sanitize, project and link every occupation in `table`
    pub fn build(table: &FeatureTable) -> DataResult<Self> {
        let (matrix, projection) = project_table(table)?;
        let graph = build_neighbor_graph(table.rows(), &projection.points)?;

        Ok(Self {
            matrix,
            projection,
            graph,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Cell;

    fn rows(n: usize) -> Vec<OccupationRow> {
        (0..n)
            .map(|i| OccupationRow {
                index: i,
                code: format!("{}", i),
                title: format!("Job {}", i),
                cells: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_edges_are_labelled() {
        let points = vec![
            ProjectedPoint::new(0, 0.0, 0.0),
            ProjectedPoint::new(1, 0.1, 0.0),
            ProjectedPoint::new(2, 0.0, 0.1),
            ProjectedPoint::new(3, 0.1, 0.1),
        ];
        let graph = build_neighbor_graph(&rows(4), &points).unwrap();

        assert_eq!(graph.edges.len(), 12);
        let first = &graph.edges[0];
        assert_eq!(first.source, 0);
        assert_eq!(first.target, 1);
        assert_eq!(first.desc, "Job 0 -- Job 1");
        assert!((first.weight - 0.9).abs() < 1e-12);
        assert_eq!(graph.edges_from(3).count(), 3);
        assert!(graph.tiers.iter().all(|t| *t == Tier::Primary));
    }

    #[test]
    fn test_misaligned_inputs() {
        let points = vec![ProjectedPoint::new(0, 0.0, 0.0)];
        let err = build_neighbor_graph(&rows(2), &points).unwrap_err();
        assert_eq!(err, DataError::RowCountMismatch { rows: 2, points: 1 });
    }

    #[test]
    fn test_points_must_be_indexed_by_position() {
        let points = vec![
            ProjectedPoint::new(10, 0.0, 0.0),
            ProjectedPoint::new(11, 0.1, 0.0),
            ProjectedPoint::new(12, 0.0, 0.1),
        ];
        let err = build_neighbor_graph(&rows(3), &points).unwrap_err();
        assert_eq!(err, DataError::MisindexedPoint { position: 0, index: 10 });

        let swapped = vec![
            ProjectedPoint::new(0, 0.0, 0.0),
            ProjectedPoint::new(2, 0.1, 0.0),
            ProjectedPoint::new(1, 0.0, 0.1),
        ];
        let err = build_neighbor_graph(&rows(3), &swapped).unwrap_err();
        assert_eq!(err, DataError::MisindexedPoint { position: 1, index: 2 });
    }

    #[test]
    fn test_too_few_rows_is_data_error() {
        let table = FeatureTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![
                OccupationRow {
                    index: 0,
                    code: "0".to_string(),
                    title: "A".to_string(),
                    cells: vec![Cell::Number(0.1), Cell::Number(0.2)],
                },
                OccupationRow {
                    index: 1,
                    code: "1".to_string(),
                    title: "B".to_string(),
                    cells: vec![Cell::Number(0.3), Cell::Number(0.4)],
                },
            ],
        )
        .unwrap();

        let err = OccupationGraph::build(&table).unwrap_err();
        assert!(matches!(err, DataError::Projection(_)));
    }
}
