// suite/positive.rs - Well-formed CRUD on "People" succeeds and returns the
// expected rows.

use anyhow::Context;

use super::{Case, CaseFuture};
use crate::checks::{expect_rows, CheckFailed};
use crate::exec::{Session, Statement};
use crate::fixtures::tables::Person;
use crate::fixtures::SEED_ROWS;

pub const CASES: &[Case] = &[
    Case { name: "select_query", run: select_query },
    Case { name: "insert_query", run: insert_query },
    Case { name: "update_query", run: update_query },
    Case { name: "delete_query", run: delete_query },
    Case { name: "seeded_rows_decode", run: seeded_rows_decode },
];

const SELECT_BY_INDEX: &str =
    r#"SELECT "Index", "Name", "DateOfBirth" FROM public."People" WHERE "Index" = $1"#;

fn insert_person(index: i32, name: &str, date_of_birth: &str) -> Statement {
    Statement::new(
        r#"INSERT INTO public."People"("Index", "Name", "DateOfBirth") VALUES ($1, $2, $3::date)"#,
    )
    .bind(index)
    .bind(name)
    .bind(date_of_birth)
}

fn delete_person(index: i32) -> Statement {
    Statement::new(r#"DELETE FROM public."People" WHERE "Index" = $1"#).bind(index)
}

fn rename_person(from: i32, to: i32, name: &str) -> Statement {
    Statement::new(r#"UPDATE public."People" SET "Index" = $1, "Name" = $2 WHERE "Index" = $3"#)
        .bind(to)
        .bind(name)
        .bind(from)
}

/// Equality plus range filter picks out exactly one seeded row.
pub fn select_query(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let rows = session
            .execute_with(
                &Statement::new(
                    r#"SELECT "Index", "Name", "DateOfBirth"
                       FROM public."People"
                       WHERE "Index" > $1 AND "DateOfBirth" = $2::date"#,
                )
                .bind(4)
                .bind("1934-07-09"),
            )
            .await
            .context("select by index and date")?;

        expect_rows("select_query", &rows, "['5', 'Peter', '1934-07-09']")?;
        Ok(())
    })
}

/// Insert a row, read it back, delete it, and confirm it is gone.
pub fn insert_query(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        session
            .execute_with(&insert_person(6, "test_data", "2000-02-02"))
            .await
            .context("insert row 6")?;
        let inserted = session
            .execute_with(&Statement::new(SELECT_BY_INDEX).bind(6))
            .await
            .context("select row 6")?;

        session
            .execute_with(&delete_person(6))
            .await
            .context("delete row 6")?;
        let after_delete = session
            .execute_with(&Statement::new(SELECT_BY_INDEX).bind(6))
            .await
            .context("select row 6 after delete")?;

        expect_rows("inserted row", &inserted, "['6', 'test_data', '2000-02-02']")?;
        expect_rows("row after delete", &after_delete, "[]")?;
        Ok(())
    })
}

/// Renumber and rename row 1; the date must be untouched.
pub fn update_query(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        session
            .execute_with(&rename_person(1, 101, "New Name"))
            .await
            .context("update row 1 to 101")?;
        let updated = session
            .execute_with(&Statement::new(SELECT_BY_INDEX).bind(101))
            .await
            .context("select row 101")?;

        // Undo before asserting so the fixture teardown still finds index 1
        session
            .execute_with(&rename_person(101, 1, "Andrey"))
            .await
            .context("revert row 101 to 1")?;

        expect_rows("updated row", &updated, "['101', 'New Name', '1984-01-07']")?;
        Ok(())
    })
}

pub fn delete_query(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        session
            .execute_with(&insert_person(6, "test_data", "2000-02-02"))
            .await
            .context("insert row 6")?;
        session
            .execute_with(&delete_person(6))
            .await
            .context("delete row 6")?;

        let rows = session
            .execute_with(&Statement::new(SELECT_BY_INDEX).bind(6))
            .await
            .context("select row 6")?;

        expect_rows("deleted row", &rows, "[]")?;
        Ok(())
    })
}

/// The seeded rows read back as typed values equal to the fixture.
pub fn seeded_rows_decode(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let people: Vec<Person> = sqlx::query_as(
            r#"SELECT "Index", "Name", "DateOfBirth"
               FROM public."People"
               WHERE "Index" = ANY($1)
               ORDER BY "Index""#,
        )
        .bind(SEED_ROWS.iter().map(|row| row.index).collect::<Vec<i32>>())
        .fetch_all(session.connection())
        .await
        .context("select seeded rows")?;

        let expected: Vec<Person> = SEED_ROWS.iter().filter_map(Person::from_seed).collect();
        if people != expected {
            return Err(CheckFailed::Mismatch {
                what: "seeded rows".to_string(),
                expected: format!("{:?}", expected),
                actual: format!("{:?}", people),
            }
            .into());
        }
        Ok(())
    })
}
