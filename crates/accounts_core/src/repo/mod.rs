//! Repository contracts and SQLite persistence for accounts.
//!
//! # Invariants
//! - SQL lives here and nowhere else in the crate.
//! - Storage constraint violations surface as `RepoError::Validation`; other
//!   transport errors stay `RepoError::Db`.

pub mod account_repo;
