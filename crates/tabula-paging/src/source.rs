use crate::types::{ColumnInfo, Row, Value};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("data source error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// A queryable tabular backend.
///
/// Relation names are opaque to this layer and passed through unvalidated.
/// Implementations must be callable from both the UI thread and the
/// paginator's background prefetch thread; if the underlying handle is not
/// safe for that, the caller must supply a serialized or per-thread handle.
pub trait DataSource {
    /// Total number of rows in `relation`.
    fn row_count(&self, relation: &str) -> Result<u64>;

    /// Fetch at most `limit` rows of `relation` starting at `offset`.
    ///
    /// When `columns` is given, implementations must prepend a stable
    /// row-identity column to the projection so edited rows can be mapped back
    /// to their source rows.
    fn fetch_range(
        &self,
        relation: &str,
        offset: u64,
        limit: u64,
        columns: Option<&[String]>,
    ) -> Result<Vec<Row>>;

    /// Execute an arbitrary statement and return any rows it yields (empty
    /// for statements that produce no data). This layer itself only issues
    /// read statements through this.
    fn execute(&self, query: &str) -> Result<Vec<Row>>;

    /// Column metadata for `relation`.
    fn columns(&self, relation: &str) -> Result<Vec<ColumnInfo>>;

    /// Names of the indexes already defined on `relation`.
    fn index_names(&self, relation: &str) -> Result<Vec<String>>;
}

/// Quote an identifier for interpolation into SQL text.
///
/// Bound parameters cannot stand in for table/column names, so identifiers are
/// double-quoted with embedded quotes doubled.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite-backed [`DataSource`].
///
/// The connection lives behind a mutex, so a clone handed to the background
/// prefetch thread serializes against the UI thread's queries.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSource {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_uri(uri: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(uri, flags)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn query_rows(conn: &Connection, sql: &str, limits: Option<(u64, u64)>) -> Result<Vec<Row>> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = match limits {
            Some((limit, offset)) => stmt.query(params![limit, offset])?,
            None => stmt.query([])?,
        };
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row_values(row)?);
        }
        Ok(out)
    }
}

impl DataSource for SqliteSource {
    fn row_count(&self, relation: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(relation));
        let conn = self.conn.lock().expect("sqlite source mutex poisoned");
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn fetch_range(
        &self,
        relation: &str,
        offset: u64,
        limit: u64,
        columns: Option<&[String]>,
    ) -> Result<Vec<Row>> {
        let table = quote_identifier(relation);
        let sql = match columns {
            Some(cols) => {
                let projected = cols
                    .iter()
                    .map(|col| quote_identifier(col))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("SELECT rowid, {projected} FROM {table} LIMIT ?1 OFFSET ?2")
            }
            None => format!("SELECT rowid, * FROM {table} LIMIT ?1 OFFSET ?2"),
        };
        let conn = self.conn.lock().expect("sqlite source mutex poisoned");
        Self::query_rows(&conn, &sql, Some((limit, offset)))
    }

    fn execute(&self, query: &str) -> Result<Vec<Row>> {
        let conn = self.conn.lock().expect("sqlite source mutex poisoned");
        Self::query_rows(&conn, query, None)
    }

    fn columns(&self, relation: &str) -> Result<Vec<ColumnInfo>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(relation));
        let conn = self.conn.lock().expect("sqlite source mutex poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ColumnInfo {
                name: row.get(1)?,
                decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                not_null: row.get::<_, i64>(3)? != 0,
                primary_key: row.get::<_, i64>(5)? != 0,
            });
        }
        Ok(out)
    }

    fn index_names(&self, relation: &str) -> Result<Vec<String>> {
        let sql = format!("PRAGMA index_list({})", quote_identifier(relation));
        let conn = self.conn.lock().expect("sqlite source mutex poisoned");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.get(1)?);
        }
        Ok(out)
    }
}

fn row_values(row: &rusqlite::Row<'_>) -> Result<Row> {
    let count = row.as_ref().column_count();
    let mut values = Vec::with_capacity(count);
    for idx in 0..count {
        values.push(value_from_ref(row.get_ref(idx)?));
    }
    Ok(values)
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteSource {
        let source = SqliteSource::open_in_memory().expect("open in-memory source");
        source
            .execute("CREATE TABLE people (name TEXT, age INTEGER)")
            .expect("create table");
        source
            .execute("INSERT INTO people VALUES ('ada', 36), ('grace', 45), ('edsger', 72)")
            .expect("seed rows");
        source
    }

    #[test]
    fn row_count_counts_all_rows() {
        let source = seeded();
        assert_eq!(source.row_count("people").expect("count"), 3);
    }

    #[test]
    fn fetch_range_prepends_rowid_for_projections() {
        let source = seeded();
        let rows = source
            .fetch_range("people", 0, 2, Some(&["name".to_string()]))
            .expect("fetch projected range");
        assert_eq!(rows.len(), 2);
        // rowid first, then the requested column.
        assert_eq!(rows[0][0], Value::Integer(1));
        assert_eq!(rows[0][1], Value::Text("ada".to_string()));
    }

    #[test]
    fn fetch_range_is_offset_anchored() {
        let source = seeded();
        let rows = source.fetch_range("people", 2, 10, None).expect("fetch tail");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], Value::Text("edsger".to_string()));
    }

    #[test]
    fn missing_relation_is_an_error() {
        let source = seeded();
        assert!(source.row_count("nope").is_err());
        assert!(source.fetch_range("nope", 0, 10, None).is_err());
    }

    #[test]
    fn quoted_identifiers_handle_awkward_names() {
        let source = SqliteSource::open_in_memory().expect("open in-memory source");
        source
            .execute("CREATE TABLE \"odd \"\"name\"\"\" (x INTEGER)")
            .expect("create table");
        source
            .execute("INSERT INTO \"odd \"\"name\"\"\" VALUES (7)")
            .expect("seed row");
        assert_eq!(source.row_count("odd \"name\"").expect("count"), 1);
    }
}
