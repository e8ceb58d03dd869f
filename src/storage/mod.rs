use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ScrapeResult;
use crate::models::Book;

/// Writes the scraped books to CSV and JSON files in one output directory.
///
/// Each save overwrites the previous file of the same name.
#[derive(Debug, Clone)]
pub struct Storage {
    output_dir: PathBuf,
    csv_name: String,
    json_name: String,
}

impl Storage {
    pub fn new(output_dir: impl Into<PathBuf>, csv_name: &str, json_name: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            csv_name: csv_name.to_string(),
            json_name: json_name.to_string(),
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_name)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(&self.json_name)
    }

    /// Save books as CSV. Nothing is written for an empty set.
    ///
    /// The header is the union of every record's keys in first-seen order,
    /// so detail columns survive even when the first book has none.
    pub fn save_csv(&self, books: &[Book]) -> ScrapeResult<()> {
        if books.is_empty() {
            warn!("No data to save to CSV");
            return Ok(());
        }

        let rows = books
            .iter()
            .map(|book| -> ScrapeResult<Map<String, Value>> {
                match serde_json::to_value(book)? {
                    Value::Object(map) => Ok(map),
                    _ => Ok(Map::new()),
                }
            })
            .collect::<ScrapeResult<Vec<Map<String, Value>>>>()?;

        let mut header: Vec<&str> = Vec::new();
        for key in rows.iter().flat_map(Map::keys) {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }

        let path = self.csv_path();
        ensure_dir(&self.output_dir)?;
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&header)?;
        for row in &rows {
            writer.write_record(header.iter().map(|key| cell(row.get(*key))))?;
        }
        writer.flush()?;

        info!("Data successfully saved to {}", path.display());
        Ok(())
    }

    /// Save books as a JSON array indented by four spaces, non-ASCII kept as is
    pub fn save_json(&self, books: &[Book]) -> ScrapeResult<()> {
        let path = self.json_path();
        ensure_dir(&self.output_dir)?;

        let mut writer = BufWriter::new(File::create(&path)?);
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        books.serialize(&mut serializer)?;
        writer.flush()?;

        info!("Data successfully saved to {}", path.display());
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> ScrapeResult<()> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
