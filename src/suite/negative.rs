// suite/negative.rs - Malformed or constraint-violating statements on "People"
// must be rejected.
//
// Faults in identifiers (unknown column or table) and wrongly typed values
// are written literally, so the server's own parser and type check reject
// them. NULLs and surplus values go through bound parameters. Each case also
// pins the SQLSTATE it expects.

use super::{Case, CaseFuture};
use crate::checks::expect_rejected_as;
use crate::exec::{Session, SqlValue, Statement};

pub const CASES: &[Case] = &[
    Case { name: "select_nonexisting_column", run: select_nonexisting_column },
    Case { name: "insert_with_excess_number_of_fields", run: insert_with_excess_number_of_fields },
    Case { name: "insert_with_null_to_not_null_field", run: insert_with_null_to_not_null_field },
    Case { name: "insert_with_incorrect_data_type", run: insert_with_incorrect_data_type },
    Case { name: "update_with_incorrect_data_type", run: update_with_incorrect_data_type },
    Case { name: "update_with_null_to_not_null_field", run: update_with_null_to_not_null_field },
    Case { name: "update_with_excess_number_of_fields", run: update_with_excess_number_of_fields },
    Case { name: "delete_from_nonexisting_table", run: delete_from_nonexisting_table },
];

const INSERT_PERSON: &str =
    r#"INSERT INTO public."People"("Index", "Name", "DateOfBirth") VALUES ($1, $2, $3::date)"#;

const UNDEFINED_COLUMN: &str = "42703";
const UNDEFINED_TABLE: &str = "42P01";
const SYNTAX_ERROR: &str = "42601";
const NOT_NULL_VIOLATION: &str = "23502";
// invalid_text_representation, datatype_mismatch
const WRONG_TYPE: [&str; 2] = ["22P02", "42804"];

const SET_INDEX_OF_ROW_1: &str = r#"UPDATE public."People" SET "Index" = $1 WHERE "Index" = 1"#;

pub fn select_nonexisting_column(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let outcome = session.execute(r#"SELECT "Index1" FROM public."People""#).await;
        expect_rejected_as("select unknown column", outcome, &[UNDEFINED_COLUMN])?;
        Ok(())
    })
}

pub fn insert_with_excess_number_of_fields(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(
            r#"INSERT INTO public."People"("Index", "Name", "DateOfBirth") VALUES ($1, $2, $3::date, $4)"#,
        )
        .bind(10)
        .bind("Андрей")
        .bind("1984-01-07")
        .bind("surplus");

        let outcome = session.execute_with(&stmt).await;
        expect_rejected_as("insert with more values than columns", outcome, &[SYNTAX_ERROR])?;
        Ok(())
    })
}

pub fn insert_with_null_to_not_null_field(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(INSERT_PERSON)
            .bind(SqlValue::Int(None))
            .bind("Андрей")
            .bind("1984-01-07");

        let outcome = session.execute_with(&stmt).await;
        expect_rejected_as("insert NULL index", outcome, &[NOT_NULL_VIOLATION])?;
        Ok(())
    })
}

pub fn insert_with_incorrect_data_type(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(
            r#"INSERT INTO public."People"("Index", "Name", "DateOfBirth") VALUES ('1984-01-07', $1, $2::date)"#,
        )
        .bind("Андрей")
        .bind("1984-01-07");

        let outcome = session.execute_with(&stmt).await;
        expect_rejected_as("insert date text into integer index", outcome, &WRONG_TYPE)?;
        Ok(())
    })
}

pub fn update_with_incorrect_data_type(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let outcome = session
            .execute(r#"UPDATE public."People" SET "Index" = 'a1' WHERE "Index" = 1"#)
            .await;
        expect_rejected_as("update index to text", outcome, &WRONG_TYPE)?;
        Ok(())
    })
}

pub fn update_with_null_to_not_null_field(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(SET_INDEX_OF_ROW_1).bind(SqlValue::Int(None));

        let outcome = session.execute_with(&stmt).await;
        expect_rejected_as("update index to NULL", outcome, &[NOT_NULL_VIOLATION])?;
        Ok(())
    })
}

pub fn update_with_excess_number_of_fields(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let stmt = Statement::new(
            r#"UPDATE public."People"
               SET "Index" = $1, "Name" = $2, "DateOfBirth" = $3::date, "FakeColumn" = $4
               WHERE "Index" = 1"#,
        )
        .bind(101)
        .bind("Andrey")
        .bind("1984-01-07")
        .bind("123");

        let outcome = session.execute_with(&stmt).await;
        expect_rejected_as("update unknown column", outcome, &[UNDEFINED_COLUMN])?;
        Ok(())
    })
}

pub fn delete_from_nonexisting_table(session: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let outcome = session
            .execute(r#"DELETE FROM public."1DateOfBirth" WHERE "Index" IN (1, 2, 3, 4, 5, 6)"#)
            .await;
        expect_rejected_as("delete from unknown table", outcome, &[UNDEFINED_TABLE])?;
        Ok(())
    })
}
