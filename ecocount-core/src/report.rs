// Rendering datasets for output

use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Some(OutputFormat::Table),
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

pub fn render(dataset: &Dataset, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => render_table(dataset),
        OutputFormat::Csv => render_csv(dataset),
        OutputFormat::Json => render_json(dataset),
    }
}

/// Header `timestamp,<columns>`; null cells are left empty.
pub fn render_csv(dataset: &Dataset) -> String {
    let mut out = String::from("timestamp");
    for column in dataset.columns() {
        out.push(',');
        out.push_str(column);
    }
    out.push('\n');

    for (timestamp, cells) in dataset.rows() {
        out.push_str(&timestamp.to_rfc3339());
        for cell in cells {
            out.push(',');
            if let Some(value) = cell {
                out.push_str(&value.to_string());
            }
        }
        out.push('\n');
    }
    out
}

/// One object per row, nulls kept explicit.
pub fn to_json_rows(dataset: &Dataset) -> Value {
    let rows = dataset
        .rows()
        .map(|(timestamp, cells)| {
            let mut row = Map::new();
            row.insert("timestamp".to_string(), Value::String(timestamp.to_rfc3339()));
            for (column, cell) in dataset.columns().iter().zip(cells) {
                row.insert(column.clone(), cell.map_or(Value::Null, Value::from));
            }
            Value::Object(row)
        })
        .collect();
    Value::Array(rows)
}

pub fn render_json(dataset: &Dataset) -> String {
    let mut out = serde_json::to_string_pretty(&to_json_rows(dataset))
        .unwrap_or_else(|_| "[]".to_string());
    out.push('\n');
    out
}

/// Fixed-width table; null cells show as `-`.
pub fn render_table(dataset: &Dataset) -> String {
    let mut header = vec!["timestamp".to_string()];
    header.extend(dataset.columns().iter().cloned());

    let body: Vec<Vec<String>> = dataset
        .rows()
        .map(|(timestamp, cells)| {
            let mut line = vec![timestamp.format("%Y-%m-%d %H:%M %:z").to_string()];
            line.extend(
                cells
                    .iter()
                    .map(|cell| cell.map_or_else(|| "-".to_string(), |v| v.to_string())),
            );
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|line| line[i].len())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in std::iter::once(&header).chain(body.iter()) {
        let cells: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == 0 {
                    format!("{:<width$}", cell, width = widths[i])
                } else {
                    format!("{:>width$}", cell, width = widths[i])
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn save_report(dataset: &Dataset, format: OutputFormat, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(render(dataset, format).as_bytes())?;
    Ok(())
}
