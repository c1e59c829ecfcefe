use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn read_csv<R: Read>(input: R) -> Result<CsvData> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        rows.push(row);
    }

    Ok(CsvData { headers, rows })
}

pub fn read_csv_from_stdin() -> Result<CsvData> {
    read_csv(io::stdin())
}

pub fn read_csv_from_path(path: &Path) -> Result<CsvData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file '{}'", path.display()))?;
    read_csv(file)
}

impl CsvData {
    /// One JSON object per row. Dotted headers nest (`approval.buyerApprovalDate`),
    /// numeric cells become numbers and empty cells are left out.
    pub fn into_records(self) -> Result<Value> {
        let paths: Vec<Vec<&str>> = self
            .headers
            .iter()
            .map(|h| h.split('.').collect())
            .collect();

        let mut records = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut record = Map::new();
            for (path, cell) in paths.iter().zip(row) {
                if cell.is_empty() {
                    continue;
                }
                insert_path(&mut record, path, parse_cell(cell)).with_context(|| {
                    format!("Failed to place column '{}' at row {}", path.join("."), row_idx + 1)
                })?;
            }
            records.push(Value::Object(record));
        }
        Ok(Value::Array(records))
    }
}

fn insert_path(record: &mut Map<String, Value>, path: &[&str], value: Value) -> Result<()> {
    let (last, parents) = path
        .split_last()
        .ok_or_else(|| anyhow!("Empty column name"))?;
    let mut current = record;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = entry
            .as_object_mut()
            .ok_or_else(|| anyhow!("'{}' is both a value and a parent column", segment))?;
    }
    if current.contains_key(*last) {
        return Err(anyhow!("Duplicate column '{}'", path.join(".")));
    }
    current.insert(last.to_string(), value);
    Ok(())
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(cell.to_string()),
    }
}
