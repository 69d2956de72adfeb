// exec.rs - Statement execution over a single connection
//
// A `Session` owns exactly one PostgreSQL connection. Every statement runs in
// its own transaction: begin, run, then commit on success. What happens to a
// failed statement's transaction is decided by the session's `CommitPolicy`.
// Either way the transaction is finished (and its locks released) before the
// error is handed back, with the driver error attached.

use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Connection, Postgres};
use std::borrow::Cow;

use crate::config::DatabaseConfig;
use crate::flatten::{DecodeError, ResultSet};

/// What to do with the transaction of a statement that failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Roll the transaction back, then report the error.
    #[default]
    RollbackOnError,
    /// Commit whatever the transaction holds, then report the error.
    CommitOnError,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("could not connect to {target}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not close connection '{label}'")]
    Close {
        label: String,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("could not begin transaction")]
    Begin(#[source] sqlx::Error),

    #[error("statement failed: {sql}")]
    Statement {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not {action} transaction")]
    Finish {
        action: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("statement returned undecodable rows: {sql}")]
    Decode {
        sql: String,
        #[source]
        source: DecodeError,
    },
}

impl ExecError {
    /// The SQLSTATE reported by the server, if the failure came from it.
    pub fn sqlstate(&self) -> Option<Cow<'_, str>> {
        let source = match self {
            ExecError::Begin(source)
            | ExecError::Statement { source, .. }
            | ExecError::Finish { source, .. } => source,
            ExecError::Decode { .. } => return None,
        };
        source.as_database_error().and_then(|e| e.code())
    }

    /// True when the statement itself was rejected, as opposed to a failure
    /// around it (begin, commit, decoding).
    pub fn is_statement_rejection(&self) -> bool {
        matches!(self, ExecError::Statement { .. })
    }
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(Option<i32>),
    Text(Option<String>),
    IntList(Vec<i32>),
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<Vec<i32>> for SqlValue {
    fn from(v: Vec<i32>) -> Self {
        SqlValue::IntList(v)
    }
}

/// SQL text plus the values for its `$n` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    fn to_query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| match param {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::IntList(v) => query.bind(v.clone()),
            })
    }
}

/// One open connection to the database under test.
pub struct Session {
    label: String,
    conn: PgConnection,
    policy: CommitPolicy,
}

impl Session {
    pub async fn connect(config: &DatabaseConfig, label: &str) -> Result<Self, SessionError> {
        let options = config.connect_options()?;
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|source| SessionError::Connect {
                target: config.describe(),
                source,
            })?;

        tracing::info!("Connection '{}' to PostgreSQL established ({})", label, config.describe());

        Ok(Self {
            label: label.to_string(),
            conn,
            policy: CommitPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Direct access to the connection for typed queries (`query_as`).
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Run literal SQL with no parameter binding.
    ///
    /// Used where the statement's fault lives in its identifiers (unknown
    /// columns or tables), which placeholders cannot express.
    pub async fn execute(&mut self, sql: &str) -> Result<ResultSet, ExecError> {
        tracing::debug!("[{}] execute: {}", self.label, sql.trim());

        let mut tx = self.conn.begin().await.map_err(ExecError::Begin)?;
        let outcome = sqlx::raw_sql(sql).fetch_all(&mut *tx).await;
        let rows = finish(tx, outcome, sql, self.policy, &self.label).await?;
        decode(&rows, sql)
    }

    /// Run a parameterized statement.
    pub async fn execute_with(&mut self, statement: &Statement) -> Result<ResultSet, ExecError> {
        tracing::debug!(
            "[{}] execute: {} {:?}",
            self.label,
            statement.sql.trim(),
            statement.params
        );

        let mut tx = self.conn.begin().await.map_err(ExecError::Begin)?;
        let outcome = statement.to_query().fetch_all(&mut *tx).await;
        let rows = finish(tx, outcome, &statement.sql, self.policy, &self.label).await?;
        decode(&rows, &statement.sql)
    }

    pub async fn close(self) -> Result<(), SessionError> {
        let label = self.label;
        self.conn
            .close()
            .await
            .map_err(|source| SessionError::Close {
                label: label.clone(),
                source,
            })?;
        tracing::info!("Connection '{}' to PostgreSQL closed", label);
        Ok(())
    }
}

async fn finish(
    tx: sqlx::Transaction<'_, Postgres>,
    outcome: Result<Vec<PgRow>, sqlx::Error>,
    sql: &str,
    policy: CommitPolicy,
    label: &str,
) -> Result<Vec<PgRow>, ExecError> {
    match outcome {
        Ok(rows) => {
            tx.commit().await.map_err(|source| ExecError::Finish {
                action: "commit",
                source,
            })?;
            Ok(rows)
        }
        Err(source) => {
            let code = source
                .as_database_error()
                .and_then(|e| e.code())
                .map(|c| c.into_owned())
                .unwrap_or_default();
            tracing::warn!("[{}] statement rejected (sqlstate {}): {}", label, code, source);

            match policy {
                CommitPolicy::RollbackOnError => tx.rollback().await.map_err(|source| {
                    ExecError::Finish {
                        action: "roll back",
                        source,
                    }
                })?,
                CommitPolicy::CommitOnError => tx.commit().await.map_err(|source| {
                    ExecError::Finish {
                        action: "commit",
                        source,
                    }
                })?,
            }

            Err(ExecError::Statement {
                sql: sql.trim().to_string(),
                source,
            })
        }
    }
}

fn decode(rows: &[PgRow], sql: &str) -> Result<ResultSet, ExecError> {
    ResultSet::from_pg_rows(rows).map_err(|source| ExecError::Decode {
        sql: sql.trim().to_string(),
        source,
    })
}
