// flatten.rs - Result sets and their flattened text form
//
// Checks compare query output against literal strings such as
// "['5', 'Peter', '1934-07-09']". A result set is flattened row-major
// (database row order, then column order) and every cell is rendered as
// its display string. Nothing is sorted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgRow, PgValueFormat};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::fmt;

/// One column value of a fetched row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("None"),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Int(v) => write!(f, "{}", v),
            // Whole floats keep a trailing ".0" so 1.0 is not confused with 1
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Numeric(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
            Cell::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Cell::Timestamp(v) => write!(f, "{}", v),
            Cell::TimestampTz(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f%:z")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot decode column '{column}' of type {type_name}")]
pub struct DecodeError {
    pub column: String,
    pub type_name: String,
    #[source]
    pub source: sqlx::Error,
}

impl Cell {
    /// Decode column `idx` of a row into a `Cell`, choosing the Rust type from
    /// the column's PostgreSQL type.
    pub fn from_row(row: &PgRow, idx: usize) -> Result<Cell, DecodeError> {
        let column = &row.columns()[idx];
        let type_name = column.type_info().name().to_string();

        let wrap = |source: sqlx::Error| DecodeError {
            column: column.name().to_string(),
            type_name: type_name.clone(),
            source,
        };

        if row.try_get_raw(idx).map_err(wrap)?.is_null() {
            return Ok(Cell::Null);
        }

        let cell = match type_name.as_str() {
            "BOOL" => Cell::Bool(row.try_get(idx).map_err(wrap)?),
            "INT2" => Cell::Int(row.try_get::<i16, _>(idx).map_err(wrap)?.into()),
            "INT4" => Cell::Int(row.try_get::<i32, _>(idx).map_err(wrap)?.into()),
            "INT8" => Cell::Int(row.try_get(idx).map_err(wrap)?),
            "FLOAT4" => Cell::Float(row.try_get::<f32, _>(idx).map_err(wrap)?.into()),
            "FLOAT8" => Cell::Float(row.try_get(idx).map_err(wrap)?),
            "NUMERIC" => Cell::Numeric(row.try_get(idx).map_err(wrap)?),
            "DATE" => Cell::Date(row.try_get(idx).map_err(wrap)?),
            "TIMESTAMP" => Cell::Timestamp(row.try_get(idx).map_err(wrap)?),
            "TIMESTAMPTZ" => Cell::TimestampTz(row.try_get(idx).map_err(wrap)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Cell::Text(row.try_get(idx).map_err(wrap)?),
            // Other types are only readable when the server sent them as text
            // (simple-protocol results); binary payloads have no generic form.
            _ => match row.try_get_raw(idx).map_err(wrap)?.format() {
                PgValueFormat::Text => Cell::Text(row.try_get_unchecked(idx).map_err(wrap)?),
                PgValueFormat::Binary => return Err(wrap(unsupported(&type_name))),
            },
        };
        Ok(cell)
    }
}

fn unsupported(type_name: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unsupported binary column type {}", type_name).into())
}

/// A fetched, fully decoded result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn from_pg_rows(pg_rows: &[PgRow]) -> Result<Self, DecodeError> {
        let columns = pg_rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = pg_rows
            .iter()
            .map(|row| (0..row.len()).map(|idx| Cell::from_row(row, idx)).collect())
            .collect::<Result<Vec<Vec<Cell>>, DecodeError>>()?;

        Ok(Self { columns, rows })
    }

    pub fn flatten(&self) -> FlatRows {
        flatten(&self.rows)
    }
}

/// Row-major concatenation of every cell's display string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRows(Vec<String>);

impl FlatRows {
    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn flatten<R, C>(rows: R) -> FlatRows
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: fmt::Display,
{
    FlatRows(
        rows.into_iter()
            .flat_map(|row| row.into_iter().map(|cell| cell.to_string()))
            .collect(),
    )
}

impl fmt::Display for FlatRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, value)?;
        }
        f.write_str("]")
    }
}

/// Quote a value the way list literals in the expectations are written:
/// single quotes unless the value holds a single quote and no double quote.
fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    write!(f, "{}", quote)?;
    for ch in value.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}
