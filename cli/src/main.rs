//! Skillmap CLI: builds occupation similarity graphs from O*NET data
//!
//! Every subcommand reads its inputs completely and renders its output in
//! memory before anything is written, so a failed run leaves no partial file.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use skillmap::export::{
    write_atomically, write_links_js, write_links_json, write_nodes_js, write_projection_csv,
};
use skillmap::graph::project_table;
use skillmap::onet::{build_occupation_matrix, OnetPaths};
use skillmap::{FeatureTable, GraphSummary, NeighborPolicy, OccupationGraph, TableLayout};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "skillmap", version, about = "Occupation similarity graph builder")]
struct Cli {
    /// Header of the occupation code column
    #[arg(long, default_value = skillmap::matrix::ONET_CODE_COLUMN, global = true)]
    code_column: String,

    /// Header of the occupation title column
    #[arg(long, default_value = skillmap::matrix::ONET_TITLE_COLUMN, global = true)]
    title_column: String,

    /// Log pipeline details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LinksFormat {
    Js,
    Json,
}

#[derive(Clone, clap::ValueEnum)]
enum SummaryFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the occupation matrix CSV from O*NET TSV dumps
    Matrix {
        /// Path to the Occupation Data TSV file
        #[arg(long)]
        occupation_tsv: PathBuf,
        /// Path to the Knowledge TSV file
        #[arg(long)]
        knowledge_tsv: PathBuf,
        /// Path to the Skills TSV file
        #[arg(long)]
        skills_tsv: PathBuf,
        /// Path to the Abilities TSV file
        #[arg(long)]
        abilities_tsv: PathBuf,
        /// Path the occupation matrix CSV will be written to
        #[arg(long)]
        output_csv: PathBuf,
    },
    /// Write the occupation node list as JavaScript
    Nodes {
        /// Path to the occupation matrix CSV
        #[arg(long)]
        input_csv: PathBuf,
        /// Path the JavaScript will be written to
        #[arg(long)]
        output_js: PathBuf,
    },
    /// Write the neighbor edge list
    Links {
        /// Path to the occupation matrix CSV
        #[arg(long)]
        input_csv: PathBuf,
        /// Path the edge list will be written to
        #[arg(long)]
        output: PathBuf,
        /// Output format
        #[arg(long, default_value = "js")]
        format: LinksFormat,
    },
    /// Write the 2-D projection of every occupation as CSV
    Project {
        /// Path to the occupation matrix CSV
        #[arg(long)]
        input_csv: PathBuf,
        /// Path the coordinates will be written to
        #[arg(long)]
        output_csv: PathBuf,
    },
    /// Print neighbor graph statistics
    Summary {
        /// Path to the occupation matrix CSV
        #[arg(long)]
        input_csv: PathBuf,
        /// Output format
        #[arg(long, default_value = "table")]
        format: SummaryFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let layout = TableLayout {
        code_column: cli.code_column.clone(),
        title_column: cli.title_column.clone(),
        ..TableLayout::default()
    };

    let result = match cli.command {
        Commands::Matrix {
            occupation_tsv,
            knowledge_tsv,
            skills_tsv,
            abilities_tsv,
            output_csv,
        } => run_matrix(
            OnetPaths {
                occupations: occupation_tsv,
                knowledge: knowledge_tsv,
                skills: skills_tsv,
                abilities: abilities_tsv,
            },
            &output_csv,
        ),
        Commands::Nodes { input_csv, output_js } => run_nodes(&input_csv, &output_js, &layout),
        Commands::Links { input_csv, output, format } => {
            run_links(&input_csv, &output, &format, &layout)
        }
        Commands::Project { input_csv, output_csv } => {
            run_project(&input_csv, &output_csv, &layout)
        }
        Commands::Summary { input_csv, format } => run_summary(&input_csv, &format, &layout),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn require_input(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("path {} does not exist", path.display());
    }
    Ok(())
}

fn load_table(input_csv: &Path, layout: &TableLayout) -> anyhow::Result<FeatureTable> {
    FeatureTable::from_path(input_csv, layout)
        .with_context(|| format!("failed to read {}", input_csv.display()))
}

fn run_matrix(paths: OnetPaths, output_csv: &Path) -> anyhow::Result<()> {
    for path in [&paths.occupations, &paths.knowledge, &paths.skills, &paths.abilities] {
        require_input(path)?;
    }

    let matrix = build_occupation_matrix(&paths)?;
    write_atomically(output_csv, |buf| matrix.write_csv(buf))?;

    info!(rows = matrix.rows.len(), path = %output_csv.display(), "wrote occupation matrix");
    Ok(())
}

fn run_nodes(input_csv: &Path, output_js: &Path, layout: &TableLayout) -> anyhow::Result<()> {
    let table = load_table(input_csv, layout)?;
    write_atomically(output_js, |buf| write_nodes_js(table.rows(), buf))?;

    info!(nodes = table.len(), path = %output_js.display(), "wrote node list");
    Ok(())
}

fn run_links(
    input_csv: &Path,
    output: &Path,
    format: &LinksFormat,
    layout: &TableLayout,
) -> anyhow::Result<()> {
    let table = load_table(input_csv, layout)?;
    let built = OccupationGraph::build(&table)?;
    let edges = &built.graph.edges;

    match format {
        LinksFormat::Js => write_atomically(output, |buf| write_links_js(edges, buf))?,
        LinksFormat::Json => write_atomically(output, |buf| write_links_json(edges, buf))?,
    }

    info!(edges = edges.len(), path = %output.display(), "wrote edge list");
    Ok(())
}

fn run_project(input_csv: &Path, output_csv: &Path, layout: &TableLayout) -> anyhow::Result<()> {
    let table = load_table(input_csv, layout)?;
    let (_, projection) = project_table(&table)?;

    write_atomically(output_csv, |buf| {
        write_projection_csv(table.rows(), &projection.points, buf)
    })?;

    info!(points = projection.points.len(), path = %output_csv.display(), "wrote projection");
    Ok(())
}

fn run_summary(input_csv: &Path, format: &SummaryFormat, layout: &TableLayout) -> anyhow::Result<()> {
    let table = load_table(input_csv, layout)?;
    let built = OccupationGraph::build(&table)?;
    let summary = &built.graph.summary;

    match format {
        SummaryFormat::Json => {
            let report = serde_json::json!({
                "policy": NeighborPolicy::STANDARD,
                "columns_kept": built.matrix.ncols(),
                "columns_dropped": built.matrix.dropped().len(),
                "explained_variance_ratio": built.projection.explained_variance_ratio,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SummaryFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Metric", "Value"]);

            table.add_row(vec!["Columns kept".to_string(), built.matrix.ncols().to_string()]);
            table.add_row(vec![
                "Columns dropped".to_string(),
                built.matrix.dropped().len().to_string(),
            ]);
            table.add_row(vec![
                "Explained variance (PC1, PC2)".to_string(),
                format!(
                    "{:.3}, {:.3}",
                    built.projection.explained_variance_ratio[0],
                    built.projection.explained_variance_ratio[1]
                ),
            ]);
            for (metric, value) in summary_rows(summary) {
                table.add_row(vec![metric.to_string(), value]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}

fn format_distance(d: Option<f64>) -> String {
    d.map(|d| format!("{:.3}", d)).unwrap_or_else(|| "-".to_string())
}

fn format_range(r: Option<(usize, usize)>) -> String {
    r.map(|(lo, hi)| format!("{}..={}", lo, hi))
        .unwrap_or_else(|| "-".to_string())
}

fn summary_rows(summary: &GraphSummary) -> Vec<(&'static str, String)> {
    vec![
        ("Nodes", summary.node_count.to_string()),
        ("Edges", summary.edge_count.to_string()),
        ("Isolated nodes", summary.isolated_nodes.to_string()),
        ("Single-neighbor nodes", summary.single_neighbor_nodes.to_string()),
        ("Fallback activations", summary.fallback_activations.to_string()),
        ("Fallback edges", summary.fallback_edges.to_string()),
        ("Fallback edges beyond 0.99", summary.distant_fallback_edges.to_string()),
        ("Min distance", format_distance(summary.min_distance)),
        ("Max distance", format_distance(summary.max_distance)),
        ("Primary neighbor count", format_range(summary.primary_count_range)),
        ("Fallback neighbor count", format_range(summary.fallback_count_range)),
    ]
}
