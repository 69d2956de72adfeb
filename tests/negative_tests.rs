// tests/negative_tests.rs
// Statements that break the People schema must be rejected (needs a live database).

mod common;

use anyhow::Result;
use common::{open_session, run_case, serial};
use pg_crud_tests::checks::expect_rejected;
use pg_crud_tests::exec::CommitPolicy;
use pg_crud_tests::fixtures::{cleanup, seed};
use pg_crud_tests::runner::Suite;
use pg_crud_tests::suite::{negative, Group};
use pg_crud_tests::{DatabaseConfig, SqlValue, Statement};

// invalid_text_representation, datatype_mismatch
const WRONG_TYPE: [&str; 2] = ["22P02", "42804"];

#[tokio::test]
async fn test_select_nonexisting_column() -> Result<()> {
    run_case(Group::Negative, negative::select_nonexisting_column).await
}

#[tokio::test]
async fn test_insert_with_excess_number_of_fields() -> Result<()> {
    run_case(Group::Negative, negative::insert_with_excess_number_of_fields).await
}

#[tokio::test]
async fn test_insert_with_null_to_not_null_field() -> Result<()> {
    run_case(Group::Negative, negative::insert_with_null_to_not_null_field).await
}

#[tokio::test]
async fn test_insert_with_incorrect_data_type() -> Result<()> {
    run_case(Group::Negative, negative::insert_with_incorrect_data_type).await
}

#[tokio::test]
async fn test_update_with_incorrect_data_type() -> Result<()> {
    run_case(Group::Negative, negative::update_with_incorrect_data_type).await
}

#[tokio::test]
async fn test_update_with_null_to_not_null_field() -> Result<()> {
    run_case(Group::Negative, negative::update_with_null_to_not_null_field).await
}

#[tokio::test]
async fn test_update_with_excess_number_of_fields() -> Result<()> {
    run_case(Group::Negative, negative::update_with_excess_number_of_fields).await
}

#[tokio::test]
async fn test_delete_from_nonexisting_table() -> Result<()> {
    run_case(Group::Negative, negative::delete_from_nonexisting_table).await
}

/// A rejected statement leaves the seeded rows as they were, under either
/// commit policy, and the connection stays usable.
#[tokio::test]
async fn test_rejected_update_leaves_rows_intact() -> Result<()> {
    let _guard = serial().await;

    for policy in [CommitPolicy::RollbackOnError, CommitPolicy::CommitOnError] {
        let mut session = open_session("rejected-update").await?.with_policy(policy);
        let table = Group::Negative.table();
        seed(&mut session, table).await?;

        let outcome = session
            .execute_with(
                &Statement::new(r#"UPDATE public."People" SET "Index" = $1 WHERE "Index" = 1"#)
                    .bind(SqlValue::Int(None)),
            )
            .await;
        let rejected = expect_rejected("update index to NULL", outcome);

        let rows = session
            .execute(r#"SELECT "Index", "Name" FROM public."People" WHERE "Index" = 1"#)
            .await;

        cleanup(&mut session, table).await?;
        session.close().await?;

        let err = rejected?;
        // not_null_violation
        assert_eq!(err.sqlstate().as_deref(), Some("23502"));
        assert_eq!(rows?.flatten().to_string(), "['1', 'Andrey']");
    }
    Ok(())
}

/// The whole group in order on one connection, as the runner drives it.
/// Earlier cases must not change how later ones are rejected.
#[tokio::test]
async fn test_negative_group_passes_on_one_session() -> Result<()> {
    let _guard = serial().await;
    let config = DatabaseConfig::from_env()?;

    let mut out = Vec::new();
    let report = Suite::new(vec![Group::Negative])
        .run(&config, CommitPolicy::default(), &mut out)
        .await?;

    assert_eq!(report.cases.len(), 8);
    assert!(report.success(), "{}", String::from_utf8_lossy(&out));
    Ok(())
}

/// Wrongly typed values are refused by the server's type check even after a
/// bound NULL went through the same statement shape on this connection.
#[tokio::test]
async fn test_wrong_type_rejected_after_null_insert() -> Result<()> {
    let _guard = serial().await;
    let mut session = open_session("wrong-type").await?;
    let table = Group::Negative.table();
    seed(&mut session, table).await?;

    let null_insert = session
        .execute_with(
            &Statement::new(
                r#"INSERT INTO public."People"("Index", "Name", "DateOfBirth") VALUES ($1, $2, $3::date)"#,
            )
            .bind(SqlValue::Int(None))
            .bind("Андрей")
            .bind("1984-01-07"),
        )
        .await;
    let null_insert = expect_rejected("insert NULL index", null_insert);

    let text_insert = session
        .execute_with(
            &Statement::new(
                r#"INSERT INTO public."People"("Index", "Name", "DateOfBirth") VALUES ('1984-01-07', $1, $2::date)"#,
            )
            .bind("Андрей")
            .bind("1984-01-07"),
        )
        .await;
    let text_insert = expect_rejected("insert date text into integer index", text_insert);

    let text_update = session
        .execute(r#"UPDATE public."People" SET "Index" = 'a1' WHERE "Index" = 1"#)
        .await;
    let text_update = expect_rejected("update index to text", text_update);

    cleanup(&mut session, table).await?;
    session.close().await?;

    assert_eq!(null_insert?.sqlstate().as_deref(), Some("23502"));
    for err in [text_insert?, text_update?] {
        let code = err.sqlstate().unwrap_or_default();
        assert!(WRONG_TYPE.iter().any(|c| *c == code), "unexpected sqlstate {}", code);
    }
    Ok(())
}
