// crates/types/src/dataset.rs
//! Dataset upload, preview and cleaning payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder shown for absent cell values.
pub const MISSING_CELL: &str = "N/D";

/// One table row. `None` marks an absent (null) cell.
pub type Row = Vec<Option<Value>>;

/// Result of a successful CSV upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub dataset_id: String,
    pub row_count: u64,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Preview payload as it comes off the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewPayload {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub preview: PreviewRows,
}

/// Preview rows are either positional arrays or records keyed by column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviewRows {
    Rows(Vec<Row>),
    Records(Vec<Map<String, Value>>),
}

impl Default for PreviewRows {
    fn default() -> Self {
        Self::Rows(Vec::new())
    }
}

/// Rectangular preview sample, rows ordered to match `columns`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewData {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl PreviewData {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<PreviewPayload> for PreviewData {
    fn from(payload: PreviewPayload) -> Self {
        let PreviewPayload { mut columns, preview } = payload;
        let rows = match preview {
            PreviewRows::Rows(rows) => rows,
            PreviewRows::Records(records) => {
                if columns.is_empty() {
                    if let Some(first) = records.first() {
                        columns = first.keys().cloned().collect();
                    }
                }
                records
                    .into_iter()
                    .map(|mut record| {
                        columns
                            .iter()
                            .map(|col| record.remove(col).filter(|v| !v.is_null()))
                            .collect()
                    })
                    .collect()
            }
        };
        // JSON null inside positional rows already decodes to None.
        Self { columns, rows }
    }
}

/// Display text for a cell, `None` when the cell is absent.
///
/// Strings are shown without quotes; numbers, booleans and nested values use
/// their JSON form.
pub fn cell_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Counts reported by a cleaning run.
///
/// Decodes either the flat `{cleaned_rows, original_rows}` shape or the
/// pipeline report, whose counts sit under `metrics.rows_after` and
/// `metrics.rows_before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CleaningWire")]
pub struct CleaningResult {
    pub cleaned_rows: u64,
    pub original_rows: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CleaningWire {
    Flat {
        cleaned_rows: u64,
        original_rows: u64,
    },
    Report {
        metrics: CleaningMetrics,
    },
}

#[derive(Deserialize)]
struct CleaningMetrics {
    rows_before: u64,
    rows_after: u64,
}

impl From<CleaningWire> for CleaningResult {
    fn from(wire: CleaningWire) -> Self {
        match wire {
            CleaningWire::Flat {
                cleaned_rows,
                original_rows,
            } => Self {
                cleaned_rows,
                original_rows,
            },
            CleaningWire::Report { metrics } => Self {
                cleaned_rows: metrics.rows_after,
                original_rows: metrics.rows_before,
            },
        }
    }
}

/// Entry from `GET /datasets/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// Body of `GET /datasets/`. Not wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetList {
    #[serde(default)]
    pub datasets: Vec<DatasetSummary>,
}
