use std::collections::HashMap;

use serde_json::Value;

use crate::data::LABEL_COLUMN;

/// A single cell of a tabular dataset.
///
/// Input data arrives with mixed types per column (CSV text, JSON payloads), so
/// cells keep their observed type until the preprocessor coerces them.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Parses raw CSV text into a cell, preferring a numeric interpretation.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return CellValue::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => CellValue::Number(value),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// A named column of cells.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

/// A minimal named-column tabular frame.
///
/// The pipeline needs to distinguish a column that is absent from the input
/// (a schema failure) from a column whose cells happen to be empty, and must
/// tolerate any number of extra columns it never reads. Row-typed structs
/// cannot express that, so records are held column-wise.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self { columns: Vec::new() }
    }

    /// Builds a dataset from named columns. Ragged columns are padded with
    /// missing cells so every column reports the same row count.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|column| column.cells.len()).max().unwrap_or(0);
        let mut columns = columns;

        for column in &mut columns {
            column.cells.resize(rows, CellValue::Missing);
        }

        Self { columns }
    }

    /// Builds a dataset from an array of JSON objects, one object per row.
    ///
    /// This is the shape a web caller posts for prediction: each record maps
    /// column names to scalar values. Columns are created in first-seen order
    /// and rows that lack a column get a missing cell.
    ///
    /// First-seen order needs serde_json's `preserve_order` feature; without
    /// it object keys iterate alphabetically.
    pub fn from_json_records(records: &[Value]) -> Self {
        let mut dataset = Dataset::new();
        let mut index = HashMap::<String, usize>::new();

        for (row, record) in records.iter().enumerate() {
            let Value::Object(fields) = record else {
                continue;
            };

            for (name, value) in fields {
                let cell = match value {
                    Value::Number(number) => number
                        .as_f64()
                        .map(CellValue::Number)
                        .unwrap_or(CellValue::Missing),
                    Value::String(text) => CellValue::from_raw(text),
                    Value::Bool(flag) => CellValue::Number(if *flag { 1.0 } else { 0.0 }),
                    Value::Null => CellValue::Missing,
                    _ => CellValue::Missing,
                };

                let position = *index.entry(name.clone()).or_insert_with(|| {
                    dataset.columns.push(Column {
                        name: name.clone(),
                        cells: vec![CellValue::Missing; row],
                    });
                    dataset.columns.len() - 1
                });

                let column = &mut dataset.columns[position];
                column.cells.resize(row, CellValue::Missing);
                column.cells.push(cell);
            }
        }

        let rows = records.len();

        for column in &mut dataset.columns {
            column.cells.resize(rows, CellValue::Missing);
        }

        dataset
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map(|column| column.cells.len()).unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Number of rows whose label cell is a nonzero value.
    pub fn fraud_count(&self) -> usize {
        let Some(column) = self.column(LABEL_COLUMN) else {
            return 0;
        };

        column
            .cells
            .iter()
            .filter(|cell| matches!(cell, CellValue::Number(value) if *value != 0.0))
            .count()
    }

    /// Share of labeled rows flagged as fraud, as a percentage of all rows.
    pub fn fraud_percentage(&self) -> f64 {
        if self.rows() == 0 {
            return 0.0;
        }

        self.fraud_count() as f64 / self.rows() as f64 * 100.0
    }
}
