//! Grid model - columns and typed rows extracted from an assistant answer

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Sort direction hint for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// A single column of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Header label shown to the user
    pub display_name: String,
    /// Key into each `RowRecord`
    pub field_key: String,
    pub sortable: bool,
    pub resizable: bool,
    /// Whether the column grows to fill remaining width
    pub flexible: bool,
    pub sort_direction: Option<SortDirection>,
}

impl ColumnDefinition {
    pub fn new(display_name: impl Into<String>, field_key: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            field_key: field_key.into(),
            sortable: true,
            resizable: true,
            flexible: false,
            sort_direction: None,
        }
    }
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Map a JSON payload value onto a cell without any coercion
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Null => CellValue::empty(),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Ordering used by the grid view: numbers before booleans before text
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,
            (CellValue::Bool(_), _) => Ordering::Less,
            (_, CellValue::Bool(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the grid, keyed by column field key
pub type RowRecord = HashMap<String, CellValue>;

/// Columns plus rows, built fresh for every response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridModel {
    pub columns: Vec<ColumnDefinition>,
    pub rows: Vec<RowRecord>,
}

impl GridModel {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_rows(&self) -> bool {
        !self.columns.is_empty() && !self.rows.is_empty()
    }

    pub fn column(&self, field_key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.field_key == field_key)
    }

    /// Value of a column in a row; missing keys read as empty text
    pub fn value(&self, row: usize, field_key: &str) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(field_key))
    }
}
