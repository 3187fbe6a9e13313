//! Domain model for persisted user accounts.
//!
//! # Invariants
//! - An account has no identifier until storage assigns one.
//! - Entities never hold a connection; every durable operation receives the
//!   repository handle from its caller.

pub mod account;
