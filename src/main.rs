use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pain_engine::application::engine::PainEngine;
use pain_engine::config::EngineConfig;
use pain_engine::domain::ports::LedgerStoreBox;
use pain_engine::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use pain_engine::infrastructure::rocksdb::RocksDBStore;
use pain_engine::infrastructure::static_auth::StaticAuthenticator;
use pain_engine::interfaces::csv::account_reader::AccountReader;
use pain_engine::interfaces::csv::balance_writer::BalanceWriter;
use pain_engine::interfaces::csv::command_reader::CommandReader;
use pain_engine::logging::{LogFormat, init_logging};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV file of command vectors, one command per line
    input: PathBuf,

    /// JSON engine configuration (fee rate, paging, credentials)
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV of opening balances (account_number,balance) for local accounts
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    /// Print the final balances of the seeded accounts and the holding account
    #[arg(long)]
    balances: bool,
}

fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryLedgerStore::new()))
        }
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };
    init_logging(&config.log_level, cli.log_format);

    let store = open_store(cli.db_path.as_deref())?;

    // Seed opening balances; accounts already present in the store keep theirs.
    let mut seeded = Vec::new();
    if let Some(path) = &cli.accounts {
        let file = File::open(path).into_diagnostic()?;
        let now = chrono::Utc::now().timestamp();
        for record in AccountReader::new(file).accounts(now) {
            match record {
                Ok(record) => {
                    seeded.push(record.account_number.clone());
                    if store
                        .balance(&record.account_number)
                        .await
                        .into_diagnostic()?
                        .is_none()
                    {
                        store.open_account(record).await.into_diagnostic()?;
                    }
                }
                Err(e) => warn!(error = %e, "skipping account seed row"),
            }
        }
    }

    let authenticator = StaticAuthenticator::from(&config.auth);
    let engine = PainEngine::new(store, Box::new(authenticator), config);

    // One JSON line per command: the success payload or the error.
    let file = File::open(&cli.input).into_diagnostic()?;
    for fields in CommandReader::new(file).commands() {
        let line = match fields {
            Ok(fields) => match engine.process(&fields).await {
                Ok(response) => serde_json::to_string(&response).into_diagnostic()?,
                Err(e) => {
                    warn!(error = %e, "Error processing command");
                    serde_json::json!({ "error": e.to_string() }).to_string()
                }
            },
            Err(e) => {
                warn!(error = %e, "Error reading command");
                serde_json::json!({ "error": e.to_string() }).to_string()
            }
        };
        println!("{line}");
    }

    if cli.balances {
        let mut records = Vec::with_capacity(seeded.len());
        for account in &seeded {
            if let Some(record) = engine.store().balance(account).await.into_diagnostic()? {
                records.push(record);
            }
        }
        let holding = engine.store().holding_account().await.into_diagnostic()?;
        let stdout = io::stdout();
        let mut writer = BalanceWriter::new(stdout.lock());
        writer.write_balances(records, &holding).into_diagnostic()?;
    }

    Ok(())
}
