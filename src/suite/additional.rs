// suite/additional.rs - Compound and pattern-matching predicates on
// "Test_Table".

use anyhow::Context;

use super::{Case, CaseFuture};
use crate::checks::expect_rows;
use crate::exec::{Session, Statement};

pub const CASES: &[Case] = &[
    Case { name: "select_with_multiple_conditions", run: select_with_multiple_conditions },
    Case { name: "update_with_like_condition", run: update_with_like_condition },
    Case { name: "delete_with_like_condition", run: delete_with_like_condition },
];

// No ORDER BY: the expectations are written in the order the server returns
// rows, which is what these cases pin down.
const SELECT_ALL: &str = r#"SELECT "Index", "Name", "DateOfBirth" FROM public."Test_Table""#;

pub fn select_with_multiple_conditions(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(
            r#"SELECT "Index", "Name", "DateOfBirth"
               FROM public."Test_Table"
               WHERE "Index" > $1 AND "DateOfBirth" > $2::date"#,
        )
        .bind(2)
        .bind("1970-01-01");

        let rows = session
            .execute_with(&stmt)
            .await
            .context("select with two conditions")?;

        expect_rows(
            "select_with_multiple_conditions",
            &rows,
            "['3', 'John Doe', '2015-04-12', '4', 'Jane Doe', '2000-01-25']",
        )?;
        Ok(())
    })
}

/// Every name containing "e" is replaced; "Ivan" is left alone.
pub fn update_with_like_condition(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(
            r#"UPDATE public."Test_Table" SET "Name" = $1 WHERE "Test_Table"."Name" LIKE $2"#,
        )
        .bind("New Name")
        .bind("%e%");

        session
            .execute_with(&stmt)
            .await
            .context("update names matching %e%")?;
        let rows = session
            .execute(SELECT_ALL)
            .await
            .context("select all after update")?;

        // Updated tuples are rewritten after the untouched row
        expect_rows(
            "update_with_like_condition",
            &rows,
            "['2', 'Ivan', '1990-11-17', '1', 'New Name', '1984-01-07', \
             '3', 'New Name', '2015-04-12', '4', 'New Name', '2000-01-25', \
             '5', 'New Name', '1934-07-09']",
        )?;
        Ok(())
    })
}

/// Only "John Doe" and "Jane Doe" contain a capital J.
pub fn delete_with_like_condition(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(
            r#"DELETE FROM public."Test_Table" WHERE "Test_Table"."Name" LIKE $1"#,
        )
        .bind("%J%");

        session
            .execute_with(&stmt)
            .await
            .context("delete names matching %J%")?;
        let rows = session
            .execute(SELECT_ALL)
            .await
            .context("select all after delete")?;

        expect_rows(
            "delete_with_like_condition",
            &rows,
            "['1', 'Andrey', '1984-01-07', '2', 'Ivan', '1990-11-17', '5', 'Peter', '1934-07-09']",
        )?;
        Ok(())
    })
}
