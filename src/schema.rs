// schema.rs - Preflight check that the fixture tables exist
//
// The checks never create tables. Before the runner starts it asks
// information_schema whether every required column is present, so a missing
// schema shows up as one clear error instead of sixteen statement failures.

use sqlx::postgres::PgConnection;
use std::collections::BTreeSet;

/// Columns every fixture table must have.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Index", "Name", "DateOfBirth"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("could not inspect information_schema")]
    Query(#[from] sqlx::Error),

    #[error("schema is incomplete, missing: {}; apply sql/schema.sql first", .0.join(", "))]
    Missing(Vec<String>),
}

/// Report every `table.column` in `tables` x `REQUIRED_COLUMNS` absent from
/// `found` (pairs of table and column name).
pub fn missing_columns(tables: &[&str], found: &[(String, String)]) -> Vec<String> {
    let found: BTreeSet<(&str, &str)> = found
        .iter()
        .map(|(table, column)| (table.as_str(), column.as_str()))
        .collect();

    tables
        .iter()
        .flat_map(|table| REQUIRED_COLUMNS.iter().map(move |column| (*table, *column)))
        .filter(|pair| !found.contains(pair))
        .map(|(table, column)| format!("public.\"{}\".\"{}\"", table, column))
        .collect()
}

pub async fn verify(conn: &mut PgConnection, tables: &[&str]) -> Result<(), SchemaError> {
    let table_names: Vec<String> = tables.iter().map(|t| t.to_string()).collect();

    let found: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT table_name::text, column_name::text
        FROM information_schema.columns
        WHERE table_schema = 'public' AND table_name = ANY($1)
        "#,
    )
    .bind(table_names)
    .fetch_all(conn)
    .await?;

    let missing = missing_columns(tables, &found);
    if missing.is_empty() {
        tracing::info!("Schema preflight passed for {}", tables.join(", "));
        Ok(())
    } else {
        Err(SchemaError::Missing(missing))
    }
}
