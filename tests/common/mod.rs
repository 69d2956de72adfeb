// common/mod.rs - Shared helpers for the live-database tests
//
// These tests need a PostgreSQL with public."People" and public."Test_Table"
// (see sql/schema.sql), reached through DATABASE_URL or the DB_* variables.
//
// Cases inside one test binary touch the same rows, so they run one at a time
// behind a process-wide lock. Each case gets its own session, wrapped in the
// same seed / teardown fixture the runner uses.

#![allow(dead_code)]

use pg_crud_tests::exec::Session;
use pg_crud_tests::fixtures::with_fixture;
use pg_crud_tests::logging::{self, LogTarget};
use pg_crud_tests::suite::{CaseFn, Group};
use pg_crud_tests::DatabaseConfig;
use tokio::sync::{Mutex, MutexGuard};

static SERIAL: Mutex<()> = Mutex::const_new(());

/// Serialize cases that share fixture rows. The guard is held across awaits;
/// a panicking case releases it without poisoning.
pub async fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().await
}

/// Open a session against the configured test database.
pub async fn open_session(label: &str) -> anyhow::Result<Session> {
    logging::init(&LogTarget::Stdout)?;
    let config = DatabaseConfig::from_env()?;
    Ok(Session::connect(&config, label).await?)
}

/// Full setup and teardown wrapper for a single case of `group`.
pub async fn run_case(group: Group, case: CaseFn) -> anyhow::Result<()> {
    let _guard = serial().await;

    let mut session = open_session(group.name()).await?;
    let result = with_fixture(&mut session, group.table(), case)
        .await
        .into_result();
    session.close().await?;

    result
}

/// Row count of a fixture table, outside any fixture.
pub async fn row_count(session: &mut Session, table: &str) -> anyhow::Result<i64> {
    let query = format!(r#"SELECT COUNT(*) FROM public."{}""#, table);
    let count: (i64,) = sqlx::query_as(&query)
        .fetch_one(session.connection())
        .await?;
    Ok(count.0)
}
