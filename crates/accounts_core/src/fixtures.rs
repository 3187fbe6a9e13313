//! Fixture loading for account seed data.
//!
//! A fixture is a JSON array of account objects using the same keys as
//! [`Account::to_dict`]; `id`, `phone_number` and `disabled` may be omitted.

use crate::model::account::Account;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for FixtureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read fixture: {err}"),
            Self::Parse(err) => write!(f, "invalid account fixture: {err}"),
        }
    }
}

impl Error for FixtureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Parses a fixture array from any reader.
pub fn load_accounts(reader: impl Read) -> Result<Vec<Account>, FixtureError> {
    serde_json::from_reader(reader).map_err(FixtureError::Parse)
}

/// Parses a fixture array from a file on disk.
pub fn load_accounts_from_path(path: impl AsRef<Path>) -> Result<Vec<Account>, FixtureError> {
    let file = File::open(path).map_err(FixtureError::Io)?;
    load_accounts(BufReader::new(file))
}
