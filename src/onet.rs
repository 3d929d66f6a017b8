//! O*NET ingestion
//!
//! Builds the occupation feature table from the O*NET database TSV dumps:
//! *Occupation Data* plus the *Knowledge*, *Skills* and *Abilities* files.
//! Each (element, scale) pair becomes one feature column, with values
//! rescaled from the scale's native range to [0, 1].

use crate::error::{DataError, PipelineError, PipelineResult};
use crate::matrix::{ONET_CODE_COLUMN, ONET_TITLE_COLUMN};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DESCRIPTION_COLUMN: &str = "Description";
const ELEMENT_COLUMN: &str = "Element Name";
const SCALE_COLUMN: &str = "Scale ID";
const VALUE_COLUMN: &str = "Data Value";

/// Scale id of importance ratings (1–5); every other scale is a 0–7 level
pub const IMPORTANCE_SCALE: &str = "IM";

/// Feature group a TSV file contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Knowledge,
    Skills,
    Abilities,
}

/// One rated element on one scale, e.g. "Oral Comprehension (IM)"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub element: String,
    pub scale: String,
}

impl Dimension {
    pub fn column_name(&self) -> String {
        format!("{} ({})", self.element, self.scale)
    }
}

/// Rescale a raw rating to [0, 1] according to its scale
pub fn normalize_rating(scale: &str, value: f64) -> f64 {
    let (low, high) = if scale == IMPORTANCE_SCALE { (1.0, 5.0) } else { (0.0, 7.0) };
    (value - low) / (high - low)
}

/// Normalized cell text; values that are not numbers are kept verbatim
fn rating_cell(scale: &str, raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(value) => normalize_rating(scale, value).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// One row of the Occupation Data file
#[derive(Debug, Clone, PartialEq)]
pub struct OccupationInfo {
    pub code: String,
    pub title: String,
    pub description: String,
}

/// Ratings of one domain, keyed by occupation code
#[derive(Debug, Clone)]
pub struct DomainRatings {
    pub domain: Domain,
    /// Column order: as listed for the first occupation in the file
    pub dimensions: IndexSet<Dimension>,
    ratings: HashMap<String, Vec<Option<String>>>,
}

impl DomainRatings {
    /// Cells of `code` aligned with `dimensions`, if the occupation is rated at all
    pub fn cells(&self, code: &str) -> Option<&[Option<String>]> {
        self.ratings.get(code).map(|v| v.as_slice())
    }
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader)
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

/// Read the Occupation Data TSV
pub fn read_occupations<R: Read>(reader: R) -> PipelineResult<Vec<OccupationInfo>> {
    let mut tsv = tsv_reader(reader);
    let headers = tsv.headers()?.clone();
    let code = column(&headers, ONET_CODE_COLUMN)?;
    let title = column(&headers, ONET_TITLE_COLUMN)?;
    let description = column(&headers, DESCRIPTION_COLUMN)?;

    let mut occupations = Vec::new();
    for record in tsv.records() {
        let record = record?;
        occupations.push(OccupationInfo {
            code: record.get(code).unwrap_or_default().to_string(),
            title: record.get(title).unwrap_or_default().to_string(),
            description: record.get(description).unwrap_or_default().to_string(),
        });
    }
    Ok(occupations)
}

/// Read one Knowledge / Skills / Abilities TSV
pub fn read_domain<R: Read>(reader: R, domain: Domain) -> PipelineResult<DomainRatings> {
    let mut tsv = tsv_reader(reader);
    let headers = tsv.headers()?.clone();
    let code_idx = column(&headers, ONET_CODE_COLUMN)?;
    let element_idx = column(&headers, ELEMENT_COLUMN)?;
    let scale_idx = column(&headers, SCALE_COLUMN)?;
    let value_idx = column(&headers, VALUE_COLUMN)?;

    let mut first_code: Option<String> = None;
    let mut dimensions = IndexSet::new();
    let mut raw: Vec<(String, Dimension, String)> = Vec::new();

    for record in tsv.records() {
        let record = record?;
        let code = record.get(code_idx).unwrap_or_default().to_string();
        let dimension = Dimension {
            element: record.get(element_idx).unwrap_or_default().to_string(),
            scale: record.get(scale_idx).unwrap_or_default().to_string(),
        };
        let value = record.get(value_idx).unwrap_or_default().to_string();

        let first = first_code.get_or_insert_with(|| code.clone());
        if *first == code {
            dimensions.insert(dimension.clone());
        }
        raw.push((code, dimension, value));
    }

    let mut ratings: HashMap<String, Vec<Option<String>>> = HashMap::new();
    let mut skipped = 0usize;
    for (code, dimension, value) in raw {
        let Some(slot) = dimensions.get_index_of(&dimension) else {
            skipped += 1;
            continue;
        };
        let cells = ratings
            .entry(code)
            .or_insert_with(|| vec![None; dimensions.len()]);
        cells[slot] = Some(rating_cell(&dimension.scale, &value));
    }

    if skipped > 0 {
        warn!(?domain, skipped, "ratings on dimensions the first occupation lacks were ignored");
    }
    debug!(
        ?domain,
        dimensions = dimensions.len(),
        occupations = ratings.len(),
        skipped,
        "read O*NET domain file"
    );

    Ok(DomainRatings {
        domain,
        dimensions,
        ratings,
    })
}

/// The assembled occupation × feature table, as text cells
#[derive(Debug, Clone, PartialEq)]
pub struct OccupationMatrix {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OccupationMatrix {
    /// Join occupations with their domain ratings.
    ///
    /// Occupations rated in none of the domains are left out. Dimensions an
    /// occupation is not rated on become empty cells.
    pub fn assemble(occupations: &[OccupationInfo], domains: &[DomainRatings]) -> Self {
        let mut header = vec![
            ONET_CODE_COLUMN.to_string(),
            ONET_TITLE_COLUMN.to_string(),
            DESCRIPTION_COLUMN.to_string(),
        ];
        for domain in domains {
            header.extend(domain.dimensions.iter().map(Dimension::column_name));
        }

        let mut rows = Vec::with_capacity(occupations.len());
        for occupation in occupations {
            let mut rated = false;
            let mut row = vec![
                occupation.code.clone(),
                occupation.title.clone(),
                occupation.description.clone(),
            ];

            for domain in domains {
                match domain.cells(&occupation.code) {
                    Some(cells) => {
                        rated = true;
                        row.extend(cells.iter().map(|c| c.clone().unwrap_or_default()));
                    }
                    None => row.extend(std::iter::repeat(String::new()).take(domain.dimensions.len())),
                }
            }

            if rated {
                rows.push(row);
            }
        }

        Self { header, rows }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> PipelineResult<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.header)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Locations of the four O*NET TSV dumps
#[derive(Debug, Clone)]
pub struct OnetPaths {
    pub occupations: PathBuf,
    pub knowledge: PathBuf,
    pub skills: PathBuf,
    pub abilities: PathBuf,
}

fn open(path: &Path) -> PipelineResult<File> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    Ok(File::open(path)?)
}

/// Read all four dumps and assemble the occupation matrix
pub fn build_occupation_matrix(paths: &OnetPaths) -> PipelineResult<OccupationMatrix> {
    let occupations = read_occupations(open(&paths.occupations)?)?;
    let domains = [
        read_domain(open(&paths.knowledge)?, Domain::Knowledge)?,
        read_domain(open(&paths.skills)?, Domain::Skills)?,
        read_domain(open(&paths.abilities)?, Domain::Abilities)?,
    ];

    let matrix = OccupationMatrix::assemble(&occupations, &domains);
    info!(
        occupations = matrix.rows.len(),
        columns = matrix.header.len(),
        "assembled O*NET occupation matrix"
    );
    Ok(matrix)
}
