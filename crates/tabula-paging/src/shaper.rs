//! Best-effort query shaping.
//!
//! Everything here works on query text, not a parse tree. The checks are
//! deliberately the same cheap heuristics the browser has always shipped:
//! they can misfire on subqueries, CTEs, or `LIMIT` appearing inside string
//! literals or comments. Callers treat the results as advisory.

use crate::source::{quote_identifier, DataSource};
use crate::types::Value;
use std::collections::HashSet;

/// Declared types the index advisor considers worth indexing.
const INDEXABLE_TYPES: [&str; 4] = ["INTEGER", "TEXT", "VARCHAR", "CHAR"];

/// Append `LIMIT {limit}` to an unbounded `SELECT`.
///
/// Returns the (possibly rewritten) query and whether it was changed.
/// Statements that already contain `LIMIT` anywhere, and statements that are
/// not `SELECT`s, come back unchanged. A trailing statement terminator is
/// preserved, with the clause inserted before it.
pub fn add_limit_if_missing(query: &str, limit: u64) -> (String, bool) {
    let upper = query.trim().to_uppercase();
    if upper.contains("LIMIT") || !upper.starts_with("SELECT") {
        return (query.to_string(), false);
    }

    let trimmed = query.trim_end();
    match trimmed.strip_suffix(';') {
        Some(stripped) => (format!("{stripped} LIMIT {limit};"), true),
        None => (format!("{query} LIMIT {limit}"), true),
    }
}

/// Estimate how many rows `query` would return by running it as a counting
/// subquery.
///
/// Diagnostic only: any failure (non-`SELECT` input, malformed query,
/// data-source error, non-integer count) yields `None` rather than an error.
pub fn estimate_result_size<S: DataSource>(source: &S, query: &str) -> Option<u64> {
    if !query.to_uppercase().contains("SELECT") {
        return None;
    }
    let inner = query.trim().trim_end_matches(';');
    let count_query = format!("SELECT COUNT(*) FROM ({inner}) AS count_subquery");
    let rows = source.execute(&count_query).ok()?;
    match rows.first()?.first()? {
        Value::Integer(count) => u64::try_from(*count).ok(),
        _ => None,
    }
}

/// Propose one `CREATE INDEX` statement per indexable column of `relation`
/// that lacks an `idx_{relation}_{column}` index.
///
/// Purely advisory text; nothing is executed. Introspection failures yield an
/// empty list.
pub fn suggest_indexes<S: DataSource>(source: &S, relation: &str) -> Vec<String> {
    let Ok(index_names) = source.index_names(relation) else {
        return Vec::new();
    };
    let existing: HashSet<String> = index_names.into_iter().collect();
    let Ok(columns) = source.columns(relation) else {
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    for column in columns {
        let index_name = format!("idx_{relation}_{}", column.name);
        if existing.contains(&index_name) {
            continue;
        }
        let decl_type = column.decl_type.to_uppercase();
        if INDEXABLE_TYPES.contains(&decl_type.as_str()) {
            suggestions.push(format!(
                "CREATE INDEX {index_name} ON {}({});",
                quote_identifier(relation),
                quote_identifier(&column.name),
            ));
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_limit_to_unbounded_select() {
        let (rewritten, changed) = add_limit_if_missing("SELECT * FROM t", 100);
        assert!(changed);
        assert_eq!(rewritten, "SELECT * FROM t LIMIT 100");
    }

    #[test]
    fn preserves_statement_terminator() {
        let (rewritten, changed) = add_limit_if_missing("SELECT * FROM t;", 100);
        assert!(changed);
        assert_eq!(rewritten, "SELECT * FROM t LIMIT 100;");
    }

    #[test]
    fn leaves_bounded_queries_alone() {
        let (rewritten, changed) = add_limit_if_missing("SELECT * FROM t LIMIT 10", 100);
        assert!(!changed);
        assert_eq!(rewritten, "SELECT * FROM t LIMIT 10");

        let (_, changed) = add_limit_if_missing("select * from t limit 10", 100);
        assert!(!changed, "detection must be case-insensitive");
    }

    #[test]
    fn leaves_non_select_statements_alone() {
        let (rewritten, changed) = add_limit_if_missing("DELETE FROM t", 100);
        assert!(!changed);
        assert_eq!(rewritten, "DELETE FROM t");
    }

    #[test]
    fn rewriting_is_idempotent() {
        let (once, changed) = add_limit_if_missing("select name from people", 50);
        assert!(changed);
        let (twice, changed_again) = add_limit_if_missing(&once, 50);
        assert!(!changed_again);
        assert_eq!(once, twice);
    }
}
