//! Optional edge-table export next to the rendered image.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::graph::EdgeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// Neutralize cells that spreadsheet programs would evaluate as formulas.
///
/// # Example
/// ```
/// use cooccurrence_network::csv_safe_cell;
/// assert_eq!(csv_safe_cell("=SUM(A1)"), "'=SUM(A1)");
/// assert_eq!(csv_safe_cell("plain"), "plain");
/// ```
pub fn csv_safe_cell(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

/// Write `edges` as `<stem>_edges.<ext>` into `dir` and return the path.
pub fn export_edges(
    edges: &[EdgeRecord],
    dir: &Path,
    stem: &str,
    format: ExportFormat,
) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}_edges.{}", format.extension()));
    let file = File::create(&path)?;
    let mut out = BufWriter::new(file);

    match format {
        ExportFormat::Txt => {
            for e in edges {
                writeln!(out, "{} -- {}: {}", e.source, e.target, e.weight)?;
            }
        }
        ExportFormat::Csv | ExportFormat::Tsv => {
            let delimiter = if format == ExportFormat::Csv { b',' } else { b'\t' };
            let mut writer = WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(&mut out);
            writer.write_record(["source", "target", "weight"])?;
            for e in edges {
                writer.write_record([
                    csv_safe_cell(&e.source),
                    csv_safe_cell(&e.target),
                    e.weight.to_string(),
                ])?;
            }
            writer
                .flush()
                .map_err(|e| NetworkError::Export(e.to_string()))?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, edges)?;
        }
    }
    out.flush()?;
    Ok(path)
}
