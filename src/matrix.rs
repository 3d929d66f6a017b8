//! Occupation feature table and column sanitizer
//!
//! The table is read once from CSV into explicitly typed cells. Every row
//! keeps the index it had in the input, and sanitization only ever drops
//! columns, so row `i` of the dense matrix is always occupation `i`.

use crate::error::{DataError, DataResult, PipelineError, PipelineResult};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header of the O*NET occupation code column
pub const ONET_CODE_COLUMN: &str = "O*NET-SOC Code";
/// Header of the O*NET occupation title column
pub const ONET_TITLE_COLUMN: &str = "Title";

/// Cell values read as missing
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A",
    "#N/A N/A", "#NA", "<NA>",
];

/// Where the identifying columns live and how fields are delimited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub code_column: String,
    pub title_column: String,
    pub delimiter: u8,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            code_column: ONET_CODE_COLUMN.to_string(),
            title_column: ONET_TITLE_COLUMN.to_string(),
            delimiter: b',',
        }
    }
}

/// One typed table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Classify a raw field. Non-finite numbers count as missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            Ok(_) => Cell::Missing,
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// One input occupation
#[derive(Debug, Clone, PartialEq)]
pub struct OccupationRow {
    /// Position in the input table (0..N)
    pub index: usize,
    pub code: String,
    pub title: String,
    /// Candidate feature cells, aligned with `FeatureTable::feature_names`
    pub cells: Vec<Cell>,
}

/// Why a candidate column was left out of the dense matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// At least one cell holds text
    NotNumeric,
    /// Numeric, but at least one cell is missing
    Incomplete,
}

/// Immutable occupation × feature table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    feature_names: Vec<String>,
    rows: Vec<OccupationRow>,
}

impl FeatureTable {
    /// Assemble a table, checking that rows are indexed 0..N and as wide as the header
    pub fn new(feature_names: Vec<String>, rows: Vec<OccupationRow>) -> DataResult<Self> {
        for (position, row) in rows.iter().enumerate() {
            if row.cells.len() != feature_names.len() {
                return Err(DataError::RaggedRow {
                    row: position,
                    expected: feature_names.len(),
                    found: row.cells.len(),
                });
            }
            if row.index != position {
                return Err(DataError::MisindexedRow {
                    row: position,
                    index: row.index,
                });
            }
        }
        Ok(Self { feature_names, rows })
    }

    /// Read a table from CSV. Columns other than the code and title columns
    /// become feature candidates, in header order.
    pub fn from_reader<R: Read>(reader: R, layout: &TableLayout) -> PipelineResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(layout.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };
        let code_idx = position(&layout.code_column)?;
        let title_idx = position(&layout.title_column)?;

        let feature_columns: Vec<usize> = (0..headers.len())
            .filter(|&i| i != code_idx && i != title_idx)
            .collect();
        let feature_names = feature_columns
            .iter()
            .map(|&i| headers[i].to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(PipelineError::Data(DataError::RaggedRow {
                    row: index,
                    expected: headers.len(),
                    found: record.len(),
                }));
            }

            rows.push(OccupationRow {
                index,
                code: record[code_idx].to_string(),
                title: record[title_idx].to_string(),
                cells: feature_columns.iter().map(|&i| Cell::parse(&record[i])).collect(),
            });
        }

        info!(rows = rows.len(), candidates = feature_columns.len(), "loaded feature table");
        Ok(Self::new(feature_names, rows)?)
    }

    pub fn from_path(path: impl AsRef<Path>, layout: &TableLayout) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        Self::from_reader(File::open(path)?, layout)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[OccupationRow] {
        &self.rows
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Why column `column` cannot be used, or `None` if it survives sanitization
    /// or is out of range
    pub fn drop_reason(&self, column: usize) -> Option<DropReason> {
        let mut reason = None;
        for row in &self.rows {
            match row.cells.get(column)? {
                Cell::Text(_) => return Some(DropReason::NotNumeric),
                Cell::Missing => reason = Some(DropReason::Incomplete),
                Cell::Number(_) => {}
            }
        }
        reason
    }

    /// Keep the numeric, fully populated columns, in their original order
    pub fn sanitize(&self) -> DataResult<DenseMatrix> {
        let mut kept = Vec::new();
        let mut dropped = Vec::new();

        for (column, name) in self.feature_names.iter().enumerate() {
            match self.drop_reason(column) {
                None => kept.push(column),
                Some(reason) => {
                    debug!(column = %name, ?reason, "dropping feature column");
                    dropped.push((name.clone(), reason));
                }
            }
        }

        if kept.is_empty() {
            return Err(DataError::NoUsableColumns {
                candidates: self.feature_names.len(),
            });
        }

        let values = Array2::from_shape_fn((self.rows.len(), kept.len()), |(i, j)| {
            self.rows[i].cells[kept[j]].as_number().unwrap_or(f64::NAN)
        });

        info!(kept = kept.len(), dropped = dropped.len(), "sanitized feature matrix");

        Ok(DenseMatrix {
            columns: kept.iter().map(|&j| self.feature_names[j].clone()).collect(),
            values,
            dropped,
        })
    }
}

/// Dense, fully numeric N×M matrix, row `i` = occupation `i`
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
    dropped: Vec<(String, DropReason)>,
}

impl DenseMatrix {
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Names of the surviving columns
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Names of the dropped columns with the reason each was dropped
    pub fn dropped(&self) -> &[(String, DropReason)] {
        &self.dropped
    }
}
