// runner.rs - Sequential suite runner with verbose output
//
// One connection per group, opened before the group's first case and closed
// after its last. Cases run one at a time in declaration order. Output:
//
//   count of tests: 16
//
//   select_query (PositiveTests) ... ok
//   ...
//   ----------------------------------------------------------------------
//   Ran 16 tests in 0.412s
//
//   OK

use std::io::Write;
use std::time::{Duration, Instant};

use crate::checks::CheckFailed;
use crate::config::DatabaseConfig;
use crate::exec::{CommitPolicy, Session};
use crate::fixtures::{with_fixture, CaseRun};
use crate::suite::{Case, Group};

const SEPARATOR: &str =
    "----------------------------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Fail(String),
    Error(String),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Fail(_) => "FAIL",
            Outcome::Error(_) => "ERROR",
        }
    }

    /// FAIL for a rejected check, ERROR for anything else.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let detail = format!("{:#}", err);
        if err.downcast_ref::<CheckFailed>().is_some() {
            Outcome::Fail(detail)
        } else {
            Outcome::Error(detail)
        }
    }

    pub fn from_run(run: CaseRun) -> Self {
        match run.into_result() {
            Ok(()) => Outcome::Ok,
            Err(err) => Outcome::from_error(&err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub group: Group,
    pub name: &'static str,
    pub outcome: Outcome,
}

impl CaseReport {
    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.group)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub cases: Vec<CaseReport>,
    pub elapsed: Duration,
}

impl Report {
    pub fn failures(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Fail(_)))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Error(_)))
    }

    pub fn success(&self) -> bool {
        self.cases.iter().all(|c| c.outcome == Outcome::Ok)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }

    /// Details of every failed case, then the totals line and the verdict.
    pub fn write_summary(&self, out: &mut impl Write) -> std::io::Result<()> {
        for case in &self.cases {
            let detail = match &case.outcome {
                Outcome::Ok => continue,
                Outcome::Fail(d) | Outcome::Error(d) => d,
            };
            writeln!(out, "{}", "=".repeat(SEPARATOR.len()))?;
            writeln!(out, "{}: {}", case.outcome.label(), case.title())?;
            writeln!(out, "{}", SEPARATOR)?;
            writeln!(out, "{}", detail)?;
            writeln!(out)?;
        }

        writeln!(out, "{}", SEPARATOR)?;
        writeln!(
            out,
            "Ran {} test{} in {:.3}s",
            self.cases.len(),
            if self.cases.len() == 1 { "" } else { "s" },
            self.elapsed.as_secs_f64()
        )?;
        writeln!(out)?;

        if self.success() {
            writeln!(out, "OK")
        } else {
            let mut parts = Vec::new();
            if self.failures() > 0 {
                parts.push(format!("failures={}", self.failures()));
            }
            if self.errors() > 0 {
                parts.push(format!("errors={}", self.errors()));
            }
            writeln!(out, "FAILED ({})", parts.join(", "))
        }
    }
}

/// The ordered set of groups to run.
#[derive(Debug, Clone)]
pub struct Suite {
    groups: Vec<Group>,
}

impl Suite {
    /// Positive, negative, then additional.
    pub fn standard() -> Self {
        Self::new(Group::ALL.to_vec())
    }

    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn count(&self) -> usize {
        self.groups.iter().map(|g| g.cases().len()).sum()
    }

    pub async fn run(
        &self,
        config: &DatabaseConfig,
        policy: CommitPolicy,
        out: &mut impl Write,
    ) -> std::io::Result<Report> {
        let started = Instant::now();
        let mut report = Report::default();

        writeln!(out, "count of tests: {}", self.count())?;
        writeln!(out)?;

        for (n, group) in self.groups.iter().enumerate() {
            let label = format!("{} #{}", group, n + 1);
            match Session::connect(config, &label).await {
                Ok(session) => {
                    let mut session = session.with_policy(policy);
                    tracing::info!("{}: running with {:?}", session.label(), session.policy());
                    for case in group.cases() {
                        let outcome = run_case(&mut session, *group, case).await;
                        report.cases.push(emit(out, *group, case, outcome)?);
                    }
                    if let Err(e) = session.close().await {
                        tracing::warn!("{:#}", anyhow::Error::new(e));
                    }
                }
                Err(e) => {
                    let detail = format!("{:#}", anyhow::Error::new(e));
                    tracing::error!("{}: {}", group, detail);
                    for case in group.cases() {
                        let outcome = Outcome::Error(detail.clone());
                        report.cases.push(emit(out, *group, case, outcome)?);
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        report.write_summary(out)?;
        Ok(report)
    }
}

async fn run_case(session: &mut Session, group: Group, case: &Case) -> Outcome {
    tracing::debug!("[{}] running {} ({})", session.label(), case.name, group);
    Outcome::from_run(with_fixture(session, group.table(), case.run).await)
}

fn emit(
    out: &mut impl Write,
    group: Group,
    case: &Case,
    outcome: Outcome,
) -> std::io::Result<CaseReport> {
    let report = CaseReport {
        group,
        name: case.name,
        outcome,
    };
    writeln!(out, "{} ... {}", report.title(), report.outcome.label())?;
    out.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectTarget, ConnectionParams};
    use crate::exec::ExecError;

    fn case(group: Group, name: &'static str, outcome: Outcome) -> CaseReport {
        CaseReport { group, name, outcome }
    }

    #[test]
    fn test_standard_suite_counts_every_case() {
        let suite = Suite::standard();
        assert_eq!(suite.groups(), &[Group::Positive, Group::Negative, Group::Additional]);
        assert_eq!(suite.count(), 16);
    }

    #[test]
    fn test_check_failures_and_errors_are_told_apart() {
        let check: anyhow::Error = CheckFailed::UnexpectedSuccess {
            what: "x".to_string(),
        }
        .into();
        assert!(matches!(Outcome::from_error(&check), Outcome::Fail(_)));

        let wrapped = check.context("while checking");
        assert!(matches!(Outcome::from_error(&wrapped), Outcome::Fail(_)));

        let exec: anyhow::Error = ExecError::Begin(sqlx::Error::PoolClosed).into();
        assert!(matches!(Outcome::from_error(&exec), Outcome::Error(_)));
    }

    #[test]
    fn test_failed_setup_is_an_error() {
        let run = CaseRun {
            setup: Err(ExecError::Begin(sqlx::Error::PoolClosed)),
            body: None,
            teardown: Ok(()),
        };
        assert!(matches!(Outcome::from_run(run), Outcome::Error(_)));
    }

    #[test]
    fn test_summary_ok() {
        let report = Report {
            cases: vec![case(Group::Positive, "select_query", Outcome::Ok)],
            elapsed: Duration::from_millis(1500),
        };

        let mut out = Vec::new();
        report.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(report.success());
        assert!(text.contains("Ran 1 test in 1.500s"));
        assert!(text.ends_with("OK\n"));
    }

    #[test]
    fn test_summary_lists_failures_and_errors() {
        let report = Report {
            cases: vec![
                case(Group::Positive, "select_query", Outcome::Ok),
                case(Group::Negative, "update_with_null_to_not_null_field", Outcome::Fail("accepted".into())),
                case(Group::Additional, "delete_with_like_condition", Outcome::Error("no table".into())),
            ],
            elapsed: Duration::ZERO,
        };

        let mut out = Vec::new();
        report.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!report.success());
        assert_eq!(report.failures(), 1);
        assert_eq!(report.errors(), 1);
        assert!(text.contains("FAIL: update_with_null_to_not_null_field (NegativeTests)"));
        assert!(text.contains("ERROR: delete_with_like_condition (AdditionalTests)"));
        assert!(text.contains("Ran 3 tests in 0.000s"));
        assert!(text.ends_with("FAILED (failures=1, errors=1)\n"));
    }

    #[tokio::test]
    async fn test_unreachable_database_reports_every_case_as_error() {
        // Nothing listens on port 1, so every group's connection is refused
        let config = DatabaseConfig {
            target: ConnectTarget::Params(ConnectionParams {
                user: "postgres".to_string(),
                password: String::new(),
                host: "127.0.0.1".to_string(),
                port: 1,
                database: "postgres".to_string(),
            }),
        };

        let mut out = Vec::new();
        let report = Suite::standard()
            .run(&config, CommitPolicy::default(), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!report.success());
        assert_eq!(report.cases.len(), 16);
        assert_eq!(report.errors(), 16);
        assert_eq!(report.failures(), 0);
        assert!(text.starts_with("count of tests: 16\n"));
        assert_eq!(text.lines().filter(|l| l.ends_with(" ... ERROR")).count(), 16);
        assert!(text.contains("select_query (PositiveTests) ... ERROR"));
        assert!(text.contains("delete_with_like_condition (AdditionalTests) ... ERROR"));
        assert!(text.ends_with("FAILED (errors=16)\n"));
    }

    #[test]
    fn test_suite_of_one_group_counts_only_that_group() {
        let suite = Suite::new(vec![Group::Negative]);
        assert_eq!(suite.count(), 8);
        assert_eq!(suite.groups(), &[Group::Negative]);
    }
}
