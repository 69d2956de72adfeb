// Runs the positive, negative and additional CRUD groups against the
// configured PostgreSQL database and prints a verbose report.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pg_crud_tests::exec::{CommitPolicy, Session};
use pg_crud_tests::logging::{self, LogTarget};
use pg_crud_tests::runner::Suite;
use pg_crud_tests::schema;
use pg_crud_tests::suite::Group;
use pg_crud_tests::DatabaseConfig;

/// Command-line arguments for the CRUD suite.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with user / password / host / port / database
    /// (defaults to DATABASE_URL or the DB_* variables)
    #[arg(long)]
    params: Option<PathBuf>,

    /// Write logs to this file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Commit the transaction of a rejected statement instead of rolling it back
    #[arg(long)]
    commit_on_error: bool,

    /// Do not check for the fixture tables before running
    #[arg(long)]
    skip_preflight: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(async_main(args)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let target = match &args.log_file {
        Some(path) => LogTarget::File(path.clone()),
        None => LogTarget::Stdout,
    };
    logging::init(&target)?;

    let config = DatabaseConfig::load(args.params.as_deref())
        .context("failed to load connection parameters")?;
    tracing::info!("Target database: {}", config.describe());

    if !args.skip_preflight {
        preflight(&config).await?;
    }

    let policy = if args.commit_on_error {
        CommitPolicy::CommitOnError
    } else {
        CommitPolicy::RollbackOnError
    };

    let mut stdout = std::io::stdout().lock();
    let report = Suite::standard().run(&config, policy, &mut stdout).await?;
    Ok(report.success())
}

async fn preflight(config: &DatabaseConfig) -> anyhow::Result<()> {
    let mut session = Session::connect(config, "preflight").await?;

    let mut tables: Vec<&str> = Group::ALL.iter().map(|g| g.table().table_name()).collect();
    tables.dedup();

    let verified = schema::verify(session.connection(), &tables).await;
    session.close().await?;
    verified?;
    Ok(())
}
