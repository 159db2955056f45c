use tabula_paging::shaper;
use tabula_paging::{DataSource, SqliteSource};

fn seeded() -> SqliteSource {
    let source = SqliteSource::open_in_memory().expect("open source");
    source
        .execute(
            "CREATE TABLE people (
                id INTEGER PRIMARY KEY,
                name TEXT,
                nickname VARCHAR,
                age INTEGER,
                score REAL,
                portrait BLOB
            )",
        )
        .expect("create table");
    source
        .execute(
            "INSERT INTO people (name, nickname, age, score, portrait)
             VALUES ('ada', 'al', 36, 9.5, x'00'),
                    ('grace', 'gh', 45, 9.9, x'01'),
                    ('edsger', 'ed', 72, 9.1, x'02')",
        )
        .expect("seed rows");
    source
}

#[test]
fn estimates_result_size_with_a_counting_subquery() {
    let source = seeded();
    assert_eq!(
        shaper::estimate_result_size(&source, "SELECT * FROM people"),
        Some(3)
    );
    assert_eq!(
        shaper::estimate_result_size(&source, "SELECT name FROM people WHERE age > 40;"),
        Some(2)
    );
}

#[test]
fn estimate_failures_are_swallowed() {
    let source = seeded();
    assert_eq!(
        shaper::estimate_result_size(&source, "SELECT * FROM no_such_table"),
        None
    );
    assert_eq!(shaper::estimate_result_size(&source, "PRAGMA page_size"), None);
}

#[test]
fn suggests_indexes_for_unindexed_indexable_columns() {
    let source = seeded();
    source
        .execute("CREATE INDEX idx_people_name ON people(name)")
        .expect("create index");

    let suggestions = shaper::suggest_indexes(&source, "people");

    assert!(
        suggestions
            .iter()
            .any(|ddl| ddl.contains("idx_people_age")),
        "unindexed INTEGER column should be suggested: {suggestions:?}"
    );
    assert!(
        suggestions
            .iter()
            .any(|ddl| ddl.contains("idx_people_nickname")),
        "unindexed VARCHAR column should be suggested: {suggestions:?}"
    );
    assert!(
        !suggestions.iter().any(|ddl| ddl.contains("idx_people_name")),
        "already-indexed column must be skipped: {suggestions:?}"
    );
    assert!(
        !suggestions
            .iter()
            .any(|ddl| ddl.contains("score") || ddl.contains("portrait")),
        "REAL/BLOB columns are not index candidates: {suggestions:?}"
    );
}

#[test]
fn suggestions_are_valid_ddl() {
    let source = seeded();
    for ddl in shaper::suggest_indexes(&source, "people") {
        source
            .execute(&ddl)
            .unwrap_or_else(|err| panic!("suggested DDL {ddl:?} failed: {err}"));
    }
    // Every candidate is now covered, so the advisor has nothing left.
    assert!(shaper::suggest_indexes(&source, "people").is_empty());
}

#[test]
fn unknown_relations_yield_no_suggestions() {
    let source = seeded();
    assert!(shaper::suggest_indexes(&source, "no_such_table").is_empty());
}
