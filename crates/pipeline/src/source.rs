//! Record sources: JSON arrays of objects and spreadsheet workbooks.
//!
//! Sources only turn files into ordered [`RawRecord`]s; every coercion rule
//! lives in the field mapper. Reading a source twice yields the same records.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use serde_json::Value;
use tsu_core::value::{RawRecord, RawValue};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed source {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Sheet not found: {0}")]
    SheetMissing(String),
}

impl SourceError {
    fn malformed(path: &Path, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// A JSON file holding an array of objects, one record per object.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file.
    pub fn read(&self) -> Result<Vec<RawRecord>, SourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(self.path.clone()),
            _ => SourceError::malformed(&self.path, e),
        })?;
        parse_json_records(&self.path, &contents)
    }
}

fn parse_json_records(path: &Path, contents: &str) -> Result<Vec<RawRecord>, SourceError> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| SourceError::malformed(path, e))?;
    let Value::Array(entries) = value else {
        return Err(SourceError::malformed(path, "expected a JSON array of objects"));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| match entry {
            Value::Object(object) => Ok(RawRecord::from_json_object(idx + 1, object)),
            other => Err(SourceError::malformed(
                path,
                format!("entry {} is not an object: {other}", idx + 1),
            )),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

/// An open spreadsheet workbook (xlsx, xls, ods).
///
/// Each sheet has a header row of labels followed by one record per row.
pub struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Workbook {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        if !path.exists() {
            return Err(SourceError::NotFound(path));
        }
        let sheets = open_workbook_auto(&path).map_err(|e| SourceError::malformed(&path, e))?;
        Ok(Self { path, sheets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Read every data row of `name`.
    pub fn sheet(&mut self, name: &str) -> Result<Vec<RawRecord>, SourceError> {
        if !self.sheets.sheet_names().iter().any(|s| s == name) {
            return Err(SourceError::SheetMissing(name.to_string()));
        }
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| SourceError::malformed(&self.path, e))?;
        Ok(range_records(&range))
    }
}

/// Convert a worksheet range to records keyed by the header row.
///
/// Positions are worksheet row numbers, so the first data row of a sheet
/// starting at A1 is row 2. Columns with a blank header are ignored.
fn range_records(range: &Range<Data>) -> Vec<RawRecord> {
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let labels: Vec<Option<String>> = header
        .iter()
        .map(|cell| {
            let label = cell.to_string();
            let label = label.trim();
            (!label.is_empty()).then(|| label.to_string())
        })
        .collect();

    rows.enumerate()
        .map(|(idx, row)| {
            let mut record = RawRecord::new(first_row + idx + 2);
            for (label, cell) in labels.iter().zip(row) {
                if let Some(label) = label {
                    record.fields.insert(label.clone(), cell_value(cell));
                }
            }
            record
        })
        .collect()
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Null,
        Data::Bool(b) => RawValue::Bool(*b),
        Data::Int(i) => RawValue::Integer(*i),
        Data::Float(f) => RawValue::Number(*f),
        Data::String(s) => RawValue::Text(s.clone()),
        other => RawValue::Text(other.to_string()),
    }
}
