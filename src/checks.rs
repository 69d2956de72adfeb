// checks.rs - Assertions used by the case bodies
//
// A failed check is a `CheckFailed`. The runner tells check failures (FAIL)
// apart from every other error (ERROR) by downcasting to this type.

use crate::exec::ExecError;
use crate::flatten::{FlatRows, ResultSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckFailed {
    #[error("{what}: expected {expected}, got {actual}")]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("statement was expected to fail but succeeded: {what}")]
    UnexpectedSuccess { what: String },

    #[error("{what}: rejected with sqlstate {actual}, expected one of {expected:?}")]
    WrongRejection {
        what: String,
        expected: Vec<String>,
        actual: String,
    },
}

/// Compare a result set's flattened form with the expected list literal.
/// A mismatch names the result's columns next to `what`.
pub fn expect_rows(what: &str, result: &ResultSet, expected: &str) -> Result<(), CheckFailed> {
    expect_flat(what, &result.flatten(), expected).map_err(|err| match err {
        CheckFailed::Mismatch { what, expected, actual } if !result.columns.is_empty() => {
            CheckFailed::Mismatch {
                what: format!("{} (columns: {})", what, result.columns.join(", ")),
                expected,
                actual,
            }
        }
        other => other,
    })
}

pub fn expect_flat(what: &str, actual: &FlatRows, expected: &str) -> Result<(), CheckFailed> {
    let actual = actual.to_string();
    if actual == expected {
        Ok(())
    } else {
        Err(CheckFailed::Mismatch {
            what: what.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Require that the server rejected a statement; hands back the error.
///
/// Failures around the statement (begin, commit, decoding) are not a
/// rejection and come back as errors rather than passes.
pub fn expect_rejected(
    what: &str,
    outcome: Result<ResultSet, ExecError>,
) -> anyhow::Result<ExecError> {
    match outcome {
        Ok(_) => Err(CheckFailed::UnexpectedSuccess {
            what: what.to_string(),
        }
        .into()),
        Err(err) if err.is_statement_rejection() => {
            tracing::info!(
                "{}: rejected as expected (sqlstate {})",
                what,
                err.sqlstate().unwrap_or_default()
            );
            Ok(err)
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!("{}: could not run statement", what))),
    }
}

/// Like `expect_rejected`, but the server must also report one of `codes`
/// as the SQLSTATE. A rejection for some other reason (a protocol-level
/// bind error, say) does not count.
pub fn expect_rejected_as(
    what: &str,
    outcome: Result<ResultSet, ExecError>,
    codes: &[&str],
) -> anyhow::Result<ExecError> {
    let err = expect_rejected(what, outcome)?;
    let actual = err.sqlstate().map(|c| c.into_owned()).unwrap_or_default();
    if codes.contains(&actual.as_str()) {
        Ok(err)
    } else {
        Err(CheckFailed::WrongRejection {
            what: what.to_string(),
            expected: codes.iter().map(|c| c.to_string()).collect(),
            actual,
        }
        .into())
    }
}
