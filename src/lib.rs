// lib.rs - Root module for the pg_crud_tests library
//
// Black-box CRUD checks against PostgreSQL. The library holds the pieces;
// the `crud_suite` binary and the integration tests under tests/ drive them.

pub mod checks;
pub mod config;
pub mod exec;
/// Seed rows and per-case setup / teardown for the fixture tables
pub mod fixtures;
pub mod flatten;
pub mod logging;
pub mod runner;
pub mod schema;
pub mod suite;

pub use config::{ConnectionParams, DatabaseConfig};
pub use exec::{CommitPolicy, ExecError, Session, SqlValue, Statement};
pub use flatten::{flatten, Cell, FlatRows, ResultSet};
