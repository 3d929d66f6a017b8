//! Principal component projection
//!
//! Reduces a dense N×M feature matrix to one 2-D point per row by projecting
//! the centered data onto the two eigenvectors of its covariance matrix with
//! the largest eigenvalues. Columns are centered but not scaled.

use super::common::ProjectedPoint;
use super::error::{ProjectionError, ProjectionResult};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

/// Minimum number of rows accepted by [`project_2d`]
pub const MIN_ROWS: usize = 3;
/// Minimum number of feature columns accepted by [`project_2d`]
pub const MIN_COLUMNS: usize = 2;

const EIGEN_EPSILON: f64 = 1.0e-12;
const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Result of a 2-D principal component projection
#[derive(Debug, Clone)]
pub struct Projection {
    /// One point per input row, `points[i].index == i`
    pub points: Vec<ProjectedPoint>,
    /// Variance captured by each of the two axes
    pub explained_variance: [f64; 2],
    /// Share of the total variance captured by each axis
    pub explained_variance_ratio: [f64; 2],
}

impl Projection {
    /// Total share of variance kept by the projection
    pub fn retained_variance(&self) -> f64 {
        self.explained_variance_ratio[0] + self.explained_variance_ratio[1]
    }
}

/// Project `data` (rows = occupations, columns = features) onto its top two
/// principal directions.
///
/// Eigenpairs are ranked by eigenvalue with a stable sort, and every axis is
/// oriented so that its largest-magnitude loading is positive. Repeated runs
/// on the same matrix therefore give identical coordinates, although callers
/// should only rely on them up to a sign flip per axis.
pub fn project_2d(data: ArrayView2<f64>) -> ProjectionResult<Projection> {
    let (rows, columns) = data.dim();

    if rows < MIN_ROWS {
        return Err(ProjectionError::TooFewRows { rows, required: MIN_ROWS });
    }
    if columns < MIN_COLUMNS {
        return Err(ProjectionError::TooFewColumns { columns, required: MIN_COLUMNS });
    }
    if let Some(((row, column), _)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ProjectionError::NonFiniteInput { row, column });
    }

    let mean = data
        .mean_axis(Axis(0))
        .ok_or(ProjectionError::TooFewRows { rows, required: MIN_ROWS })?;
    let centered = &data - &mean;

    // Sample covariance (feature x feature)
    let covariance = centered.t().dot(&centered) / (rows - 1) as f64;
    let covariance = DMatrix::from_fn(columns, columns, |i, j| covariance[[i, j]]);

    let eigen = SymmetricEigen::try_new(covariance, EIGEN_EPSILON, EIGEN_MAX_ITERATIONS)
        .ok_or(ProjectionError::NoConvergence)?;

    let mut order: Vec<usize> = (0..columns).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let total_variance: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();

    let mut components = Array2::<f64>::zeros((columns, 2));
    let mut explained_variance = [0.0; 2];
    let mut explained_variance_ratio = [0.0; 2];

    for (axis, &k) in order.iter().take(2).enumerate() {
        let vector = eigen.eigenvectors.column(k);

        let pivot = vector
            .iter()
            .fold(0.0_f64, |acc, &v| if v.abs() > acc.abs() { v } else { acc });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };

        for j in 0..columns {
            components[[j, axis]] = vector[j] * sign;
        }

        let variance = eigen.eigenvalues[k].max(0.0);
        explained_variance[axis] = variance;
        explained_variance_ratio[axis] = if total_variance > 0.0 {
            variance / total_variance
        } else {
            0.0
        };
    }

    let scores = centered.dot(&components);

    let mut points = Vec::with_capacity(rows);
    for (index, row) in scores.outer_iter().enumerate() {
        let (x, y) = (row[0], row[1]);
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFiniteProjection { index });
        }
        points.push(ProjectedPoint::new(index, x, y));
    }

    debug!(
        rows,
        columns,
        pc1 = explained_variance_ratio[0],
        pc2 = explained_variance_ratio[1],
        "projected feature matrix to 2 dimensions"
    );

    Ok(Projection {
        points,
        explained_variance,
        explained_variance_ratio,
    })
}
