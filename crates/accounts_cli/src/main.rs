//! Operator CLI over `accounts_core`.
//!
//! Every command opens the configured database, runs one account operation
//! and prints the result to stdout.

use accounts_core::db::open_db;
use accounts_core::{
    default_log_level, init_logging, load_accounts_from_path, Account, AccountId,
    AccountRepository, SqliteAccountRepository,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(version, long_about = None)]
struct Cli {
    /// SQLite database file
    #[clap(
        long,
        global = true,
        env = "ACCOUNTS_DB",
        default_value = "accounts.sqlite3",
        value_name = "PATH"
    )]
    db: PathBuf,
    /// Log level (trace|debug|info|warn|error)
    #[clap(long, global = true, env = "ACCOUNTS_LOG_LEVEL")]
    log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset
    #[clap(long, global = true, env = "ACCOUNTS_LOG_DIR", value_name = "DIR")]
    log_dir: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Checks that the core library is linked
    Ping,
    /// Creates one account per record of a JSON fixture file
    Import {
        #[clap(value_name = "FIXTURE")]
        fixture: PathBuf,
    },
    /// Lists every account
    List,
    /// Prints one account as JSON
    Show { id: AccountId },
    /// Changes the name of an account
    Rename { id: AccountId, name: String },
    /// Marks an account as disabled
    Disable { id: AccountId },
    /// Deletes an account
    Delete { id: AccountId },
    /// Deletes every account
    Truncate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    if let Command::Ping = cli.command {
        println!("accounts_core ping={}", accounts_core::ping());
        println!("accounts_core version={}", accounts_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let repo = SqliteAccountRepository::try_new(&conn)?;
    run(cli.command, &repo)
}

fn run(command: Command, repo: &impl AccountRepository) -> anyhow::Result<()> {
    match command {
        Command::Ping => {}
        Command::Import { fixture } => {
            let accounts = load_accounts_from_path(&fixture)
                .with_context(|| format!("failed to load fixture `{}`", fixture.display()))?;
            for mut account in accounts {
                let id = account.create(repo)?;
                println!("{id}\t{account}");
            }
            info!("event=cli_import module=cli status=ok");
        }
        Command::List => {
            for account in Account::all(repo)? {
                println!("{}\t{}", account.id.unwrap_or_default(), account);
            }
        }
        Command::Show { id } => {
            let account = find_or_bail(repo, id)?;
            println!("{}", serde_json::Value::Object(account.to_dict()));
        }
        Command::Rename { id, name } => {
            let mut account = find_or_bail(repo, id)?;
            account.name = name;
            account.update(repo)?;
            println!("{id}\t{account}");
        }
        Command::Disable { id } => {
            let mut account = find_or_bail(repo, id)?;
            account.disabled = true;
            account.update(repo)?;
            println!("{id}\t{account} disabled");
        }
        Command::Delete { id } => {
            let account = find_or_bail(repo, id)?;
            account.delete(repo)?;
            println!("deleted {account}");
        }
        Command::Truncate => {
            let removed = repo.delete_all_accounts()?;
            println!("deleted {removed} accounts");
        }
    }
    Ok(())
}

fn find_or_bail(repo: &impl AccountRepository, id: AccountId) -> anyhow::Result<Account> {
    match Account::find(repo, id)? {
        Some(account) => Ok(account),
        None => bail!("account {id} not found"),
    }
}
