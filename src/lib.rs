//! Skillmap
//!
//! Turns a table of occupations, each described by knowledge, skill and
//! ability ratings, into a sparse similarity graph for force-directed
//! visualization.
//!
//! # Pipeline
//!
//! 1. [`FeatureTable`]: typed occupation × feature table read from CSV
//!    (or assembled from the O*NET dumps by [`onet`])
//! 2. [`FeatureTable::sanitize`]: keeps numeric, fully populated columns
//! 3. [`graph::project_table`]: 2-D principal component projection
//! 4. [`graph::build_neighbor_graph`]: k-d tree + two-tier adaptive
//!    neighbor search, one weighted edge per accepted neighbor
//! 5. [`export`]: JavaScript / JSON / CSV writers
//!
//! ## Example Usage
//!
//! ```rust
//! use skillmap::{FeatureTable, OccupationGraph, TableLayout};
//!
//! let csv = "\
//! O*NET-SOC Code,Title,Math,Writing,Design
//! 1,Actuaries,0.9,0.5,0.2
//! 2,Statisticians,0.85,0.55,0.25
//! 3,Editors,0.3,0.95,0.4
//! 4,Graphic Designers,0.2,0.5,0.95
//! ";
//!
//! let table = FeatureTable::from_reader(csv.as_bytes(), &TableLayout::default()).unwrap();
//! let built = OccupationGraph::build(&table).unwrap();
//!
//! assert_eq!(built.projection.points.len(), 4);
//! assert!(built.graph.edges.iter().all(|e| e.source != e.target));
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod export;
pub mod graph;
pub mod matrix;
pub mod onet;

// Re-export main types for convenience
pub use error::{DataError, DataResult, PipelineError, PipelineResult};
pub use graph::{
    build_neighbor_graph, project_table, GraphSummary, NeighborEdge, NeighborGraph,
    NeighborPolicy, OccupationGraph, Tier,
};
pub use matrix::{Cell, DenseMatrix, DropReason, FeatureTable, OccupationRow, TableLayout};
pub use skillmap_algorithms::{ProjectedPoint, Projection};

/// Get the version of Skillmap
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
