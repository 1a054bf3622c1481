//! Loading schedule rows from a CSV export of the group's sheet.

use std::path::Path;

use anyhow::{Context, Result};

use runcal_core::schedule::Record;

/// Read a CSV file into header → cell records, in file order.
pub fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open schedule file {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row from {}", path.display()))?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("Failed to read row from {}", path.display()))?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()))
            .collect();
        records.push(record);
    }

    log::debug!("loaded {} schedule rows from {}", records.len(), path.display());
    Ok(records)
}
