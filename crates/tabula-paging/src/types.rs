use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single scalar value as returned by the underlying data source.
///
/// The variants mirror SQLite's storage classes; no schema is enforced by this
/// layer, so a column may yield different variants across rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Return the integer payload, if this value is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Return the text payload, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// An ordered sequence of scalar values, exactly as the data source returned
/// them.
pub type Row = Vec<Value>;

/// One fetched page of a relation.
///
/// `rows` is shared with the paginator's internal cache, so cloning a `Page`
/// never copies row data.
#[derive(Debug, Clone)]
pub struct Page {
    pub relation: String,
    pub page_index: u64,
    pub rows: Arc<Vec<Row>>,
}

/// Derived pagination state for display ("rows 201-250 of 250").
///
/// `start_row` and `end_row` are 1-based inclusive bounds of the current page;
/// both are zero when the relation is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub page_size: u64,
    pub total_rows: u64,
    pub start_row: u64,
    pub end_row: u64,
}

/// Column metadata for a relation, as reported by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, verbatim (e.g. `INTEGER`, `VARCHAR(50)`); empty when the
    /// source declares none.
    pub decl_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}
