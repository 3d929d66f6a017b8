pub mod common;
pub mod error;
pub mod pca;
pub mod kdtree;
pub mod neighbors;

pub use common::{Neighbor, NeighborLink, PointIndex, ProjectedPoint};
pub use error::{ProjectionError, ProjectionResult};
pub use pca::{project_2d, Projection};
pub use kdtree::KdTree;
pub use neighbors::{
    adaptive_neighbors, select_neighbors, similarity_weight, AdaptiveNeighbors, GraphSummary,
    NeighborPolicy, Selection, Tier,
};
