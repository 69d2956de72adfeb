// fixtures/tables/people.rs
//
// `People` backs the positive and negative groups, `Test_Table` the
// additional group. Both are expected to exist already:
//
//   "Index"       integer PRIMARY KEY NOT NULL
//   "Name"        text NOT NULL
//   "DateOfBirth" date
//
// (see sql/schema.sql)

use crate::fixtures::{SeedRow, TestTable};
use chrono::NaiveDate;
use sqlx::FromRow;

/// A typed row of either fixture table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Person {
    #[sqlx(rename = "Index")]
    pub index: i32,
    #[sqlx(rename = "Name")]
    pub name: String,
    #[sqlx(rename = "DateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
}

impl Person {
    /// The typed form of a seed row. `None` if the fixture date is malformed.
    pub fn from_seed(row: &SeedRow) -> Option<Self> {
        let date_of_birth = NaiveDate::parse_from_str(row.date_of_birth, "%Y-%m-%d").ok()?;
        Some(Self {
            index: row.index,
            name: row.name.to_string(),
            date_of_birth: Some(date_of_birth),
        })
    }
}

pub struct People;

impl TestTable for People {
    fn table_name(&self) -> &'static str {
        "People"
    }
}

pub struct AdditionalTable;

impl TestTable for AdditionalTable {
    fn table_name(&self) -> &'static str {
        "Test_Table"
    }
}
