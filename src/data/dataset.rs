//! Tabular survey dataset: loading, selection and record-level operations.

use crate::data::value::{infer_type, Value};
use crate::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// An ordered collection of records sharing a set of named fields.
///
/// Records are stored row-major, each row aligned with `columns`. An optional
/// key field (the index column of the source file) identifies each record;
/// the key column stays a regular column as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetRecords")]
pub struct Dataset {
    columns: Vec<String>,
    key_field: Option<String>,
    rows: Vec<Vec<Value>>,
}

/// Unchecked serialized form, validated on the way into a [`Dataset`].
#[derive(Deserialize)]
struct DatasetRecords {
    columns: Vec<String>,
    #[serde(default)]
    key_field: Option<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<DatasetRecords> for Dataset {
    type Error = SurveyError;

    fn try_from(records: DatasetRecords) -> Result<Self> {
        let mut dataset = Dataset::new(records.columns)?;
        for row in records.rows {
            dataset.push(row)?;
        }
        match records.key_field {
            Some(field) => dataset.with_key_field(&field),
            None => Ok(dataset),
        }
    }
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(SurveyError::InvalidParameter(format!(
                    "Duplicate column '{}'",
                    col
                )));
            }
        }
        Ok(Self {
            columns,
            key_field: None,
            rows: Vec::new(),
        })
    }

    /// Build a dataset from column names and rows of values.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut dataset = Self::new(columns.iter().map(|c| c.to_string()).collect())?;
        for row in rows {
            dataset.push(row)?;
        }
        Ok(dataset)
    }

    /// Append a record.
    pub fn push(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SurveyError::InvalidParameter(format!(
                "Record has {} values, dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        if let Some(key_idx) = self.key_index() {
            if row[key_idx].is_missing() {
                return Err(SurveyError::InvalidParameter(
                    "Record has a missing key".to_string(),
                ));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Use `field` as the record key.
    pub fn with_key_field(mut self, field: &str) -> Result<Self> {
        let idx = self.column_index(field)?;
        if let Some(line) = self.rows.iter().position(|r| r[idx].is_missing()) {
            return Err(SurveyError::Parse {
                line: line + 2,
                reason: format!("missing value in key field '{}'", field),
            });
        }
        self.key_field = Some(field.to_string());
        Ok(self)
    }

    /// Load a dataset from a CSV file with a header row.
    ///
    /// Column types are inferred per column: integer, float, boolean, or
    /// categorical when the cells are mixed. Empty cells and `NA`/`NaN`
    /// load as missing values.
    pub fn from_csv<P: AsRef<Path>>(path: P, key_field: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SurveyError::FileNotFound(path.to_path_buf()),
            _ => SurveyError::Io(e),
        })?;
        Self::from_reader(file, key_field)
    }

    /// Load a dataset from any CSV reader.
    pub fn from_reader<R: Read>(reader: R, key_field: Option<&str>) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if columns.iter().all(String::is_empty) {
            return Err(SurveyError::EmptyData("CSV has no header row".to_string()));
        }

        let mut raw: Vec<Vec<String>> = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| SurveyError::Parse {
                line: e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2),
                reason: e.to_string(),
            })?;
            raw.push(record.iter().map(String::from).collect());
        }
        if raw.is_empty() {
            return Err(SurveyError::EmptyData("No records in CSV".to_string()));
        }

        let types: Vec<_> = (0..columns.len())
            .map(|col| infer_type(raw.iter().map(move |row| row[col].as_str())))
            .collect();

        let mut dataset = Self::new(columns)?;
        dataset.rows = raw
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&types)
                    .map(|(cell, ty)| Value::parse(cell, *ty))
                    .collect()
            })
            .collect();

        match key_field {
            Some(field) => dataset.with_key_field(field),
            None => Ok(dataset),
        }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name of the key field, if any.
    pub fn key_field(&self) -> Option<&str> {
        self.key_field.as_deref()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if a column exists.
    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    /// Position of a column, or `InvalidField`.
    pub fn column_index(&self, field: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == field)
            .ok_or_else(|| SurveyError::InvalidField(field.to_string()))
    }

    fn key_index(&self) -> Option<usize> {
        self.key_field
            .as_deref()
            .and_then(|k| self.columns.iter().position(|c| c == k))
    }

    /// All values of a column, in record order.
    pub fn column(&self, field: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(field)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// A single record.
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// A single cell.
    pub fn get(&self, index: usize, field: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == field)?;
        self.rows.get(index).map(|r| &r[col])
    }

    /// Record keys in order, when a key field is set.
    pub fn keys(&self) -> Option<Vec<String>> {
        let idx = self.key_index()?;
        Some(self.rows.iter().map(|r| r[idx].label()).collect())
    }

    /// Keep only the named columns, in the given order.
    ///
    /// The key column is always retained so records stay identifiable.
    pub fn select(&self, fields: &[&str]) -> Result<Self> {
        let mut indices = fields
            .iter()
            .map(|f| self.column_index(f))
            .collect::<Result<Vec<_>>>()?;
        if let Some(key_idx) = self.key_index() {
            if !indices.contains(&key_idx) {
                indices.insert(0, key_idx);
            }
        }

        let mut selected = Self::new(indices.iter().map(|&i| self.columns[i].clone()).collect())?;
        selected.key_field = self.key_field.clone();
        selected.rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(selected)
    }

    /// Keep records whose numeric value in `field` is strictly greater than
    /// `threshold`. Non-numeric and missing values are dropped.
    pub fn filter_greater_than(&self, field: &str, threshold: f64) -> Result<Self> {
        let idx = self.column_index(field)?;
        Ok(self.filter_rows(|row| row[idx].as_f64().is_some_and(|v| v > threshold)))
    }

    fn filter_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&[Value]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            key_field: self.key_field.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Stable sort by a column in natural level order. Missing values sort
    /// last in both directions.
    pub fn sort_by(&self, field: &str, descending: bool) -> Result<Self> {
        let idx = self.column_index(field)?;
        let mut sorted = self.clone();
        sorted.rows.sort_by(|a, b| {
            let (a, b) = (&a[idx], &b[idx]);
            match (a.is_missing(), b.is_missing()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) if descending => b.cmp_level(a),
                (false, false) => a.cmp_level(b),
            }
        });
        Ok(sorted)
    }

    /// First `n` records.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            key_field: self.key_field.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Add a boolean column marking records whose key is in `members`.
    pub fn with_membership(&self, output_field: &str, members: &[String]) -> Result<Self> {
        let key_idx = self.key_index().ok_or_else(|| {
            SurveyError::InvalidParameter(
                "Membership flags need a dataset with a key field".to_string(),
            )
        })?;
        if self.has_column(output_field) {
            return Err(SurveyError::InvalidParameter(format!(
                "Column '{}' already exists",
                output_field
            )));
        }

        let members: HashSet<&str> = members.iter().map(String::as_str).collect();
        let mut flagged = self.clone();
        flagged.columns.push(output_field.to_string());
        for row in &mut flagged.rows {
            let is_member = members.contains(row[key_idx].label().as_str());
            row.push(Value::Boolean(is_member));
        }
        Ok(flagged)
    }
}
