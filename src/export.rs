//! Output writers
//!
//! Renders nodes and edges as JavaScript array literals for the force-directed
//! front end, the edge list as JSON, and projected coordinates as CSV.
//! Files are rendered fully in memory and moved into place in one rename.

use crate::error::PipelineResult;
use crate::graph::NeighborEdge;
use crate::matrix::OccupationRow;
use skillmap_algorithms::ProjectedPoint;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

fn separator(position: usize, total: usize) -> &'static str {
    if position + 1 < total {
        ","
    } else {
        ""
    }
}

/// Write `var linksArray = [...]` with one record per edge
pub fn write_links_js<W: Write>(edges: &[NeighborEdge], mut out: W) -> PipelineResult<()> {
    writeln!(out, "var linksArray = [")?;
    for (i, edge) in edges.iter().enumerate() {
        writeln!(
            out,
            "  {{desc: {}, source: {}, target: {}, weight: {}}}{}",
            serde_json::to_string(&edge.desc)?,
            edge.source,
            edge.target,
            edge.weight,
            separator(i, edges.len())
        )?;
    }
    writeln!(out, "];")?;
    Ok(())
}

/// Write `var nodesArray = [...]` and the code → index `var nodesHash = {...}`
pub fn write_nodes_js<W: Write>(rows: &[OccupationRow], mut out: W) -> PipelineResult<()> {
    writeln!(out, "var nodesArray = [")?;
    for (i, row) in rows.iter().enumerate() {
        writeln!(
            out,
            "  {{label: {}, id: {}}}{}",
            serde_json::to_string(&row.title)?,
            serde_json::to_string(&row.code)?,
            separator(i, rows.len())
        )?;
    }
    writeln!(out, "];")?;
    writeln!(out)?;

    writeln!(out, "var nodesHash = {{")?;
    for (i, row) in rows.iter().enumerate() {
        writeln!(
            out,
            "  {}: {}{}",
            serde_json::to_string(&row.code)?,
            row.index,
            separator(i, rows.len())
        )?;
    }
    writeln!(out, "}};")?;
    Ok(())
}

/// Write the edge list as a JSON array
pub fn write_links_json<W: Write>(edges: &[NeighborEdge], mut out: W) -> PipelineResult<()> {
    serde_json::to_writer_pretty(&mut out, edges)?;
    writeln!(out)?;
    Ok(())
}

/// Write `index,code,title,x,y` for every projected occupation
pub fn write_projection_csv<W: Write>(
    rows: &[OccupationRow],
    points: &[ProjectedPoint],
    out: W,
) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["index", "code", "title", "x", "y"])?;
    for (row, point) in rows.iter().zip(points) {
        writer.write_record([
            point.index.to_string(),
            row.code.clone(),
            row.title.clone(),
            point.x.to_string(),
            point.y.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

/// Render with `render`, then replace `path` in a single rename.
///
/// Nothing is written at `path` if rendering fails.
pub fn write_atomically<F>(path: impl AsRef<Path>, render: F) -> PipelineResult<()>
where
    F: FnOnce(&mut Vec<u8>) -> PipelineResult<()>,
{
    let path = path.as_ref();
    let mut buffer = Vec::new();
    render(&mut buffer)?;

    let staging = staging_path(path);
    if let Err(e) = fs::write(&staging, &buffer).and_then(|_| fs::rename(&staging, path)) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = buffer.len(), "wrote output file");
    Ok(())
}
