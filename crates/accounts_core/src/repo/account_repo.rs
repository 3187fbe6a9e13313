//! Account repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level CRUD over the `accounts` table.
//! - Translate rows into [`Account`] values and reject undecodable rows.
//!
//! # Invariants
//! - Inserts never bind `id`; SQLite assigns it.
//! - Read paths report corrupt persisted values instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::account::{Account, AccountId, DataValidationError, UPDATE_WITHOUT_ID};
use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACCOUNTS_TABLE: &str = "accounts";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "address",
    "phone_number",
    "disabled",
    "date_joined",
];

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    address,
    phone_number,
    disabled,
    date_joined
FROM accounts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for account persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(DataValidationError),
    Db(DbError),
    NotFound(AccountId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "account not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DataValidationError> for RepoError {
    fn from(value: DataValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for account CRUD operations.
pub trait AccountRepository {
    /// Inserts a new row and returns the assigned identifier. `account.id` is ignored.
    fn create_account(&self, account: &Account) -> RepoResult<AccountId>;
    /// Overwrites the row identified by `account.id`.
    fn update_account(&self, account: &Account) -> RepoResult<()>;
    /// Deletes one row; `Ok(false)` when it did not exist.
    fn delete_account(&self, id: AccountId) -> RepoResult<bool>;
    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn list_accounts(&self) -> RepoResult<Vec<Account>>;
    fn list_accounts_by_name(&self, name: &str) -> RepoResult<Vec<Account>>;
    fn count_accounts(&self) -> RepoResult<u64>;
    /// Removes every row and returns how many were deleted.
    fn delete_all_accounts(&self) -> RepoResult<usize>;
}

/// SQLite-backed account repository borrowing a caller-owned connection.
#[derive(Debug)]
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Wraps a connection after checking that its schema is usable.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` is behind.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the table
    ///   shape does not match what this repository reads and writes.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        ensure_accounts_shape(conn)?;
        Ok(Self { conn })
    }

    /// Returns the borrowed connection.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, account: &Account) -> RepoResult<AccountId> {
        self.conn
            .execute(
                "INSERT INTO accounts (
                    name,
                    email,
                    address,
                    phone_number,
                    disabled,
                    date_joined
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    account.name.as_str(),
                    account.email.as_str(),
                    account.address.as_str(),
                    account.phone_number.as_deref(),
                    bool_to_int(account.disabled),
                    account.date_joined,
                ],
            )
            .map_err(|err| constraint_as_validation(err, "creating", account))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_account(&self, account: &Account) -> RepoResult<()> {
        let id = account
            .id
            .ok_or_else(|| DataValidationError::new(UPDATE_WITHOUT_ID))?;

        let changed = self
            .conn
            .execute(
                "UPDATE accounts
                 SET
                    name = ?1,
                    email = ?2,
                    address = ?3,
                    phone_number = ?4,
                    disabled = ?5,
                    date_joined = ?6
                 WHERE id = ?7;",
                params![
                    account.name.as_str(),
                    account.email.as_str(),
                    account.address.as_str(),
                    account.phone_number.as_deref(),
                    bool_to_int(account.disabled),
                    account.date_joined,
                    id,
                ],
            )
            .map_err(|err| constraint_as_validation(err, "updating", account))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }

        Ok(None)
    }

    fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        collect_accounts(&mut rows)
    }

    fn list_accounts_by_name(&self, name: &str) -> RepoResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACCOUNT_SELECT_SQL} WHERE name = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([name])?;
        collect_accounts(&mut rows)
    }

    fn count_accounts(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative account count `{count}`")))
    }

    fn delete_all_accounts(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM accounts;", [])?)
    }
}

fn ensure_accounts_shape(conn: &Connection) -> RepoResult<()> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [ACCOUNTS_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(ACCOUNTS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([ACCOUNTS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: ACCOUNTS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn constraint_as_validation(err: rusqlite::Error, action: &str, account: &Account) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, ref message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            let detail = message.clone().unwrap_or_else(|| failure.to_string());
            RepoError::Validation(DataValidationError::new(format!(
                "Error {action} account '{}': {detail}",
                account.name
            )))
        }
        other => other.into(),
    }
}

fn collect_accounts(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Account>> {
    let mut accounts = Vec::new();
    while let Some(row) = rows.next()? {
        accounts.push(parse_account_row(row)?);
    }
    Ok(accounts)
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let id: AccountId = row.get("id")?;

    let disabled = match row.get::<_, i64>("disabled")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid disabled value `{other}` in accounts.disabled for id {id}"
            )));
        }
    };

    let date_text: String = row.get("date_joined")?;
    let date_joined = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in accounts.date_joined for id {id}"
        ))
    })?;

    Ok(Account {
        id: Some(id),
        name: row.get("name")?,
        email: row.get("email")?,
        address: row.get("address")?,
        phone_number: row.get("phone_number")?,
        disabled,
        date_joined,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
