//! Account persistence core.
//!
//! Defines the `Account` entity, its SQLite repository and the connection
//! bootstrap. Callers own the connection; entities only ever borrow it
//! through a repository handle.

pub mod db;
pub mod fixtures;
pub mod logging;
pub mod model;
pub mod repo;

pub use fixtures::{load_accounts, load_accounts_from_path, FixtureError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{Account, AccountDict, AccountId, DataValidationError};
pub use repo::account_repo::{AccountRepository, RepoError, RepoResult, SqliteAccountRepository};

/// Minimal health-check API for wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
