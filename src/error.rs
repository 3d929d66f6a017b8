//! Error types for loading, reducing and exporting occupation data

use skillmap_algorithms::ProjectionError;
use std::path::PathBuf;
use thiserror::Error;

/// The input table cannot produce a neighbor graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row at position {row} is labelled with index {index}")]
    MisindexedRow { row: usize, index: usize },

    #[error("projected point at position {position} is labelled with index {index}")]
    MisindexedPoint { position: usize, index: usize },

    #[error("no numeric, fully populated feature column among {candidates} candidates")]
    NoUsableColumns { candidates: usize },

    #[error("{rows} occupation rows but {points} projected points")]
    RowCountMismatch { rows: usize, points: usize },

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

pub type DataResult<T> = Result<T, DataError>;

/// Errors of a full load → build → write run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file {0} does not exist")]
    MissingInput(PathBuf),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
