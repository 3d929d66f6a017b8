//! Error types for the projection algorithms

use thiserror::Error;

/// Errors raised while reducing a feature matrix to two dimensions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("at least {required} rows are required for projection, got {rows}")]
    TooFewRows { rows: usize, required: usize },

    #[error("at least {required} feature columns are required for projection, got {columns}")]
    TooFewColumns { columns: usize, required: usize },

    #[error("non-finite feature value at row {row}, column {column}")]
    NonFiniteInput { row: usize, column: usize },

    #[error("covariance eigendecomposition did not converge")]
    NoConvergence,

    #[error("projected point for row {index} is not finite")]
    NonFiniteProjection { index: usize },
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
