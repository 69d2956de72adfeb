// fixtures/mod.rs - Seed rows and per-case setup / teardown
//
// Every case starts from the same five rows and ends with those five index
// values deleted, whatever the case did in between. A case that inserts other
// indexes (or renumbers a seeded row) undoes that itself before it asserts.

pub mod tables;

use crate::exec::{ExecError, Session, Statement};
use crate::suite::CaseFn;

/// A seeded row, as written in the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRow {
    pub index: i32,
    pub name: &'static str,
    pub date_of_birth: &'static str,
}

pub const SEED_ROWS: [SeedRow; 5] = [
    SeedRow { index: 1, name: "Andrey", date_of_birth: "1984-01-07" },
    SeedRow { index: 2, name: "Ivan", date_of_birth: "1990-11-17" },
    SeedRow { index: 3, name: "John Doe", date_of_birth: "2015-04-12" },
    SeedRow { index: 4, name: "Jane Doe", date_of_birth: "2000-01-25" },
    SeedRow { index: 5, name: "Peter", date_of_birth: "1934-07-09" },
];

/// A table the checks seed and clean up.
///
/// Both fixture tables share the `"Index"`, `"Name"`, `"DateOfBirth"` layout.
pub trait TestTable: Sync {
    /// Unquoted table name inside the `public` schema.
    fn table_name(&self) -> &'static str;

    fn seed_rows(&self) -> &'static [SeedRow] {
        &SEED_ROWS
    }

    /// Schema-qualified, quoted name ready to splice into SQL.
    fn qualified_name(&self) -> String {
        format!("public.{}", quote_ident(self.table_name()))
    }

    /// One multi-row INSERT for all seed rows.
    fn seed_statement(&self) -> Statement {
        let rows = self.seed_rows();
        let values = (0..rows.len())
            .map(|i| format!("(${}, ${}, ${}::date)", i * 3 + 1, i * 3 + 2, i * 3 + 3))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"INSERT INTO {}("Index", "Name", "DateOfBirth") VALUES {}"#,
            self.qualified_name(),
            values
        );

        rows.iter().fold(Statement::new(sql), |stmt, row| {
            stmt.bind(row.index).bind(row.name).bind(row.date_of_birth)
        })
    }

    /// DELETE of every seeded index.
    fn cleanup_statement(&self) -> Statement {
        let indexes: Vec<i32> = self.seed_rows().iter().map(|row| row.index).collect();
        Statement::new(format!(
            r#"DELETE FROM {} WHERE "Index" = ANY($1)"#,
            self.qualified_name()
        ))
        .bind(indexes)
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub async fn seed(session: &mut Session, table: &dyn TestTable) -> Result<(), ExecError> {
    session.execute_with(&table.seed_statement()).await?;
    Ok(())
}

pub async fn cleanup(session: &mut Session, table: &dyn TestTable) -> Result<(), ExecError> {
    session.execute_with(&table.cleanup_statement()).await?;
    Ok(())
}

/// Result of running one case between fixture setup and teardown.
#[derive(Debug)]
pub struct CaseRun {
    pub setup: Result<(), ExecError>,
    /// `None` when setup failed and the body never ran.
    pub body: Option<anyhow::Result<()>>,
    pub teardown: Result<(), ExecError>,
}

impl CaseRun {
    /// Collapse into one result, reporting the earliest failure.
    pub fn into_result(self) -> anyhow::Result<()> {
        use anyhow::Context;

        self.setup.context("fixture setup failed")?;
        if let Some(body) = self.body {
            body?;
        }
        self.teardown.context("fixture teardown failed")?;
        Ok(())
    }
}

/// Seed `table`, run `body`, then clean up whether or not the body passed.
pub async fn with_fixture(session: &mut Session, table: &dyn TestTable, body: CaseFn) -> CaseRun {
    let setup = seed(session, table).await;
    let body = match setup {
        Ok(()) => Some(body(session).await),
        Err(_) => None,
    };
    let teardown = cleanup(session, table).await;

    CaseRun { setup, body, teardown }
}
