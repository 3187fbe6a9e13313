//! Account entity.
//!
//! # Responsibility
//! - Define the record mirrored by one `accounts` row.
//! - Provide entity-level persistence entry points over an
//!   [`AccountRepository`] handle.
//! - Convert to and from the generic mapping form used by callers.
//!
//! # Invariants
//! - `id` is `None` until `create` stores the storage-assigned identifier.
//! - `update` and `delete` refuse to run without an identifier.
//! - `to_dict` followed by `from_dict` reproduces every field.

use crate::repo::account_repo::{AccountRepository, RepoResult};
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned row identifier.
pub type AccountId = i64;

/// Mapping form returned by [`Account::to_dict`].
pub type AccountDict = Map<String, Value>;

pub(crate) const UPDATE_WITHOUT_ID: &str = "Update called with empty ID field";
const DELETE_WITHOUT_ID: &str = "Delete called with empty ID field";

/// Error raised for invalid account data or misuse of the entity lifecycle.
///
/// `Display` renders the bare message so callers can compare it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataValidationError {
    message: String,
}

impl DataValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for DataValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for DataValidationError {}

/// A user account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Row identifier. `None` before the first successful `create`.
    #[serde(default)]
    pub id: Option<AccountId>,
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Serialized as an ISO `YYYY-MM-DD` string.
    pub date_joined: NaiveDate,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            email: String::new(),
            address: String::new(),
            phone_number: None,
            disabled: false,
            date_joined: Utc::now().date_naive(),
        }
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Account '{}'>", self.name)
    }
}

impl Account {
    /// Creates an unsaved, enabled account without a phone number.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
        date_joined: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            address: address.into(),
            phone_number: None,
            disabled: false,
            date_joined,
        }
    }

    /// Inserts this account as a new row and stores the assigned identifier.
    ///
    /// The insert never uses an identifier already present, so calling this on
    /// a saved account writes a copy under a fresh id. `id` only changes once
    /// the insert succeeds.
    ///
    /// # Errors
    /// - `RepoError::Validation` when the row violates a storage constraint.
    /// - `RepoError::Db` for any other storage failure.
    pub fn create<R>(&mut self, repo: &R) -> RepoResult<AccountId>
    where
        R: AccountRepository + ?Sized,
    {
        let id = repo.create_account(self)?;
        self.id = Some(id);
        info!("event=account_create module=model status=ok id={id}");
        Ok(id)
    }

    /// Writes every current field value to the existing row.
    ///
    /// # Errors
    /// - `RepoError::Validation` with "Update called with empty ID field" when
    ///   `id` is `None`.
    /// - `RepoError::NotFound` when no row carries this identifier.
    pub fn update<R>(&self, repo: &R) -> RepoResult<()>
    where
        R: AccountRepository + ?Sized,
    {
        let id = self.require_id(UPDATE_WITHOUT_ID)?;
        repo.update_account(self)?;
        info!("event=account_update module=model status=ok id={id}");
        Ok(())
    }

    /// Removes the row for this identifier.
    ///
    /// Returns `false` when no such row existed. In-memory fields, including
    /// `id`, are left as they were.
    pub fn delete<R>(&self, repo: &R) -> RepoResult<bool>
    where
        R: AccountRepository + ?Sized,
    {
        let id = self.require_id(DELETE_WITHOUT_ID)?;
        let removed = repo.delete_account(id)?;
        info!("event=account_delete module=model status=ok id={id} removed={removed}");
        Ok(removed)
    }

    /// Returns every persisted account ordered by identifier.
    pub fn all<R>(repo: &R) -> RepoResult<Vec<Account>>
    where
        R: AccountRepository + ?Sized,
    {
        let accounts = repo.list_accounts()?;
        debug!(
            "event=account_list module=model status=ok count={}",
            accounts.len()
        );
        Ok(accounts)
    }

    /// Looks an account up by identifier.
    pub fn find<R>(repo: &R, id: AccountId) -> RepoResult<Option<Account>>
    where
        R: AccountRepository + ?Sized,
    {
        debug!("event=account_find module=model id={id}");
        repo.get_account(id)
    }

    /// Returns all accounts whose name matches exactly.
    pub fn find_by_name<R>(repo: &R, name: &str) -> RepoResult<Vec<Account>>
    where
        R: AccountRepository + ?Sized,
    {
        repo.list_accounts_by_name(name)
    }

    /// Returns the number of persisted accounts.
    pub fn count<R>(repo: &R) -> RepoResult<u64>
    where
        R: AccountRepository + ?Sized,
    {
        repo.count_accounts()
    }

    /// Returns the generic mapping form of every field.
    ///
    /// Unset `id` and `phone_number` map to JSON `null`; `date_joined` maps to
    /// an ISO date string.
    pub fn to_dict(&self) -> AccountDict {
        let mut dict = Map::new();
        dict.insert("id".to_string(), self.id.map_or(Value::Null, Value::from));
        dict.insert("name".to_string(), Value::from(self.name.as_str()));
        dict.insert("email".to_string(), Value::from(self.email.as_str()));
        dict.insert("address".to_string(), Value::from(self.address.as_str()));
        dict.insert(
            "phone_number".to_string(),
            self.phone_number
                .as_deref()
                .map_or(Value::Null, Value::from),
        );
        dict.insert("disabled".to_string(), Value::Bool(self.disabled));
        dict.insert(
            "date_joined".to_string(),
            Value::String(self.date_joined.format("%Y-%m-%d").to_string()),
        );
        dict
    }

    /// Assigns fields from a mapping.
    ///
    /// `name`, `email`, `address` and `date_joined` are required. `id`,
    /// `phone_number` and `disabled` are assigned only when their key is
    /// present, so a request body without them keeps the stored values.
    /// The account is unchanged when the mapping is rejected.
    pub fn from_dict(&mut self, dict: &AccountDict) -> Result<(), DataValidationError> {
        let parsed: Account = serde_json::from_value(Value::Object(dict.clone()))
            .map_err(|err| DataValidationError::new(format!("Invalid Account: {err}")))?;

        self.name = parsed.name;
        self.email = parsed.email;
        self.address = parsed.address;
        self.date_joined = parsed.date_joined;
        if dict.contains_key("id") {
            self.id = parsed.id;
        }
        if dict.contains_key("phone_number") {
            self.phone_number = parsed.phone_number;
        }
        if dict.contains_key("disabled") {
            self.disabled = parsed.disabled;
        }
        Ok(())
    }

    fn require_id(&self, message: &str) -> Result<AccountId, DataValidationError> {
        self.id.ok_or_else(|| DataValidationError::new(message))
    }
}
