use accounts_core::db::migrations::latest_version;
use accounts_core::db::open_db_in_memory;
use accounts_core::{
    load_accounts_from_path, Account, AccountRepository, RepoError, SqliteAccountRepository,
};
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::Connection;

const FIXTURE_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/account_data.json"
);

fn fixture_accounts() -> Vec<Account> {
    load_accounts_from_path(FIXTURE_PATH).unwrap()
}

fn random_fixture_account() -> Account {
    let mut accounts = fixture_accounts();
    let index = rand::thread_rng().gen_range(0..accounts.len());
    accounts.swap_remove(index)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn create_all_fixture_accounts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();
    let fixtures = fixture_accounts();

    for data in &fixtures {
        let mut account = data.clone();
        account.create(&repo).unwrap();
    }

    assert_eq!(Account::all(&repo).unwrap().len(), fixtures.len());
}

#[test]
fn create_assigns_id_and_adds_one_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    assert_eq!(account.id, None);

    let id = account.create(&repo).unwrap();

    assert_eq!(account.id, Some(id));
    assert_eq!(Account::count(&repo).unwrap(), 1);
    assert_eq!(Account::all(&repo).unwrap().len(), 1);
}

#[test]
fn created_account_reads_back_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    let id = account.create(&repo).unwrap();

    let loaded = Account::find(&repo, id).unwrap().unwrap();
    assert_eq!(loaded, account);
}

#[test]
fn create_on_saved_account_writes_a_new_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    let first = account.create(&repo).unwrap();
    let second = account.create(&repo).unwrap();

    assert_ne!(first, second);
    assert_eq!(account.id, Some(second));
    assert_eq!(Account::count(&repo).unwrap(), 2);
}

#[test]
fn update_persists_changed_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    account.create(&repo).unwrap();

    account.name = "Michelle".to_string();
    account.email = "mcgowm1@unlv.nevada.edu".to_string();
    account.disabled = true;
    account.update(&repo).unwrap();

    let id = account.id.unwrap();
    let updated = Account::find(&repo, id).unwrap().unwrap();
    assert_eq!(updated.name, "Michelle");
    assert_eq!(updated.email, "mcgowm1@unlv.nevada.edu");
    assert!(updated.disabled);
    assert_eq!(Account::count(&repo).unwrap(), 1);
}

#[test]
fn update_without_id_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let empty_id = Account::default();
    let err = empty_id.update(&repo).unwrap_err();

    match err {
        RepoError::Validation(validation) => {
            assert_eq!(validation.to_string(), "Update called with empty ID field");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_of_missing_row_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    account.id = Some(4242);

    let err = account.update(&repo).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(4242)));
}

#[test]
fn delete_removes_row_and_keeps_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let before = Account::count(&repo).unwrap();
    let mut account = random_fixture_account();
    let id = account.create(&repo).unwrap();
    let snapshot = account.clone();

    assert!(account.delete(&repo).unwrap());

    assert_eq!(Account::count(&repo).unwrap(), before);
    assert!(Account::all(&repo).unwrap().is_empty());
    assert!(Account::find(&repo, id).unwrap().is_none());
    assert_eq!(account, snapshot);
}

#[test]
fn delete_of_missing_row_is_noop() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    account.create(&repo).unwrap();

    assert!(account.delete(&repo).unwrap());
    assert!(!account.delete(&repo).unwrap());
}

#[test]
fn delete_without_id_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let err = Account::default().delete(&repo).unwrap_err();
    assert!(
        matches!(&err, RepoError::Validation(v) if v.message() == "Delete called with empty ID field"),
        "unexpected error: {err}"
    );
}

#[test]
fn find_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    assert!(Account::find(&repo, 1).unwrap().is_none());
}

#[test]
fn find_by_name_returns_exact_matches_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut first = Account::new("Sam", "sam1@example.com", "1 Main St", date(2020, 1, 1));
    let mut other = Account::new("Samantha", "sam2@example.com", "2 Main St", date(2020, 1, 2));
    let mut second = Account::new("Sam", "sam3@example.com", "3 Main St", date(2020, 1, 3));
    first.create(&repo).unwrap();
    other.create(&repo).unwrap();
    second.create(&repo).unwrap();

    let found = Account::find_by_name(&repo, "Sam").unwrap();
    let ids: Vec<_> = found.iter().map(|account| account.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn all_lists_accounts_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut created = Vec::new();
    for mut account in fixture_accounts() {
        account.create(&repo).unwrap();
        created.push(account);
    }

    assert_eq!(Account::all(&repo).unwrap(), created);
}

#[test]
fn oversized_name_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = Account::new("x".repeat(65), "long@example.com", "1 Main St", date(2020, 1, 1));
    let err = account.create(&repo).unwrap_err();

    match err {
        RepoError::Validation(validation) => {
            assert!(
                validation.message().starts_with("Error creating account"),
                "unexpected message: {validation}"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(account.id, None);
    assert_eq!(Account::count(&repo).unwrap(), 0);
}

#[test]
fn failed_create_keeps_previous_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    let id = account.create(&repo).unwrap();

    account.name = "y".repeat(65);
    let err = account.create(&repo).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(account.id, Some(id));

    account.name = "Recovered".to_string();
    account.update(&repo).unwrap();
    assert_eq!(Account::find(&repo, id).unwrap().unwrap().name, "Recovered");
    assert_eq!(Account::count(&repo).unwrap(), 1);
}

#[test]
fn find_then_from_dict_then_update_edits_stored_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut original = Account::new("Bea", "bea@example.com", "1 Old Road", date(2020, 6, 1));
    original.phone_number = Some("555-0100".to_string());
    original.disabled = true;
    let id = original.create(&repo).unwrap();

    let body = serde_json::json!({
        "name": "Bob",
        "email": "bob@example.com",
        "address": "2 New Road",
        "date_joined": "2021-01-01"
    });
    let serde_json::Value::Object(body) = body else {
        panic!("request body must be an object");
    };

    let mut account = Account::find(&repo, id).unwrap().unwrap();
    account.from_dict(&body).unwrap();
    assert_eq!(account.id, Some(id));
    account.update(&repo).unwrap();

    let stored = Account::find(&repo, id).unwrap().unwrap();
    assert_eq!(stored.name, "Bob");
    assert_eq!(stored.email, "bob@example.com");
    assert_eq!(stored.address, "2 New Road");
    assert_eq!(stored.date_joined, date(2021, 1, 1));
    assert_eq!(stored.phone_number.as_deref(), Some("555-0100"));
    assert!(stored.disabled);
    assert_eq!(Account::count(&repo).unwrap(), 1);
}

#[test]
fn from_dict_with_explicit_nulls_clears_optionals() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = Account::new("Cy", "cy@example.com", "3 Lane", date(2019, 9, 9));
    account.phone_number = Some("555-0199".to_string());
    let id = account.create(&repo).unwrap();

    let mut body = account.to_dict();
    body.insert("phone_number".to_string(), serde_json::Value::Null);
    body.remove("id");
    account.from_dict(&body).unwrap();
    account.update(&repo).unwrap();

    let stored = Account::find(&repo, id).unwrap().unwrap();
    assert_eq!(stored.phone_number, None);
}

#[test]
fn oversized_phone_number_blocks_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let mut account = random_fixture_account();
    account.create(&repo).unwrap();

    account.phone_number = Some("5".repeat(33));
    let err = account.update(&repo).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn truncation_clears_table_between_runs() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    for mut account in fixture_accounts() {
        account.create(&repo).unwrap();
    }

    let removed = repo.delete_all_accounts().unwrap();
    assert_eq!(removed, fixture_accounts().len());
    assert_eq!(repo.count_accounts().unwrap(), 0);
}

#[test]
fn corrupt_disabled_flag_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO accounts (name, email, address, disabled, date_joined)
         VALUES ('Broken', 'b@example.com', 'nowhere', 7, '2020-01-01');",
    )
    .unwrap();

    let err = Account::all(&repo).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_works_through_trait_object() {
    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteAccountRepository::try_new(&conn).unwrap();
    let repo: &dyn AccountRepository = &sqlite;

    let mut account = random_fixture_account();
    let id = account.create(repo).unwrap();
    assert!(Account::find(repo, id).unwrap().is_some());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteAccountRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_accounts_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteAccountRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("accounts"))
    ));
}

#[test]
fn repository_rejects_accounts_table_missing_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE accounts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            disabled INTEGER NOT NULL DEFAULT 0,
            date_joined TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteAccountRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "accounts",
            column: "phone_number"
        })
    ));
}
