//! Source file decoding: JSON arrays and CSV exports into ordered field-maps.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// One raw record from a source file: string keys mapped to raw values.
///
/// JSON sources keep their native value types (numbers, booleans, arrays);
/// CSV rows arrive as strings. Accessors bridge the two so validators do not
/// care which format a file used.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    fields: Map<String, Value>,
}

impl SourceRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The field is present in the record, even if empty or null.
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Non-empty trimmed text value. Numbers are rendered as text so keys
    /// like uin survive being exported as JSON numbers.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Integer value, accepting both JSON numbers and numeric strings.
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value, accepting JSON booleans and "true"/"false" strings.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.fields.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_text(&mut self, key: &str, value: &str) {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    #[cfg(test)]
    pub(crate) fn remove(&mut self, key: &str) {
        self.fields.remove(key);
    }

    /// Array of text values; missing or non-array fields yield an empty list.
    pub fn text_list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => {
                        let trimmed = s.trim();
                        if trimmed.is_empty() {
                            None
                        } else {
                            Some(trimmed.to_string())
                        }
                    }
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Failure reading or decoding a source file. Always fatal for the importer
/// that owns the file; no records are processed from a broken source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: {detail}")]
    Malformed { path: PathBuf, detail: String },
}

/// Load a JSON source file holding an array of objects.
pub fn load_json(path: &Path) -> Result<Vec<SourceRecord>, SourceError> {
    let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(SourceError::Malformed {
                path: path.to_path_buf(),
                detail: "expected a top-level JSON array of records".to_string(),
            })
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(fields) => records.push(SourceRecord::new(fields)),
            _ => {
                return Err(SourceError::Malformed {
                    path: path.to_path_buf(),
                    detail: "expected every array element to be an object".to_string(),
                })
            }
        }
    }
    Ok(records)
}

/// Load a headered CSV source file, one record per data row.
pub fn load_csv(path: &Path) -> Result<Vec<SourceRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let mut fields = Map::new();
        for (key, value) in headers.iter().zip(row.iter()) {
            fields.insert(key.to_string(), Value::String(value.to_string()));
        }
        records.push(SourceRecord::new(fields));
    }
    Ok(records)
}
