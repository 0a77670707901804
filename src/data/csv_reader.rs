use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::error;

use crate::data::{CellValue, Column, Dataset};

/// Reads a transaction CSV into a [`Dataset`], keeping every column found in
/// the header. Cells that fail numeric parsing stay as text, empty cells
/// become missing. Malformed rows are logged and skipped rather than failing
/// the whole ingestion.
pub fn read_csv_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let file = File::open(path)?;

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|name| Column {
            name: name.to_string(),
            cells: Vec::new(),
        })
        .collect();

    let mut row_count = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                error!("CSV deserialization error: {error}");
                continue;
            }
        };

        for (index, column) in columns.iter_mut().enumerate() {
            let cell = record
                .get(index)
                .map(CellValue::from_raw)
                .unwrap_or(CellValue::Missing);
            column.cells.push(cell);
        }

        row_count += 1;
    }

    tracing::debug!("Loaded {row_count} rows from {}", path.display());

    Ok(Dataset::from_columns(columns))
}
