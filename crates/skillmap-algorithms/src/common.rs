//! Shared types for the projection and neighbor algorithms
//!
//! Every value carries the dense occupation index (0..N) it was derived from,
//! so alignment with the input rows never depends on iteration order.

use serde::{Deserialize, Serialize};

/// Dense occupation index (row position in the input table)
pub type PointIndex = usize;

/// 2-D embedding of one occupation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Index of the source row
    pub index: PointIndex,
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(index: PointIndex, x: f64, y: f64) -> Self {
        Self { index, x, y }
    }

    /// Coordinate along `axis` (0 = x, 1 = y)
    pub fn coord(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }

    /// Squared Euclidean distance to another point
    pub fn distance_sq(&self, other: &ProjectedPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &ProjectedPoint) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

/// A point returned by a nearest-neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: PointIndex,
    pub distance: f64,
}

/// A directed similarity relation between two projected points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborLink {
    pub source: PointIndex,
    pub target: PointIndex,
    /// Raw Euclidean distance in the projected plane
    pub distance: f64,
    /// Similarity weight in [0.01, 0.99]
    pub weight: f64,
}
