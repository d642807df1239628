#![allow(dead_code)]

use async_trait::async_trait;
use pain_engine::application::engine::{PainEngine, PainResponse};
use pain_engine::config::EngineConfig;
use pain_engine::domain::account::{BalanceRecord, FeeRate, HoldingAccountRecord};
use pain_engine::domain::ports::{Clock, HistoryQuery, LedgerStore, LedgerUnit};
use pain_engine::domain::transaction::PainTransaction;
use pain_engine::error::{PainError, Result};
use pain_engine::infrastructure::in_memory::InMemoryLedgerStore;
use pain_engine::infrastructure::static_auth::StaticAuthenticator;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub const TOKEN: &str = "token-1";
pub const TELLER: &str = "teller";
pub const TELLER_PASSWORD: &str = "s3cret";

/// A clock that advances one second per reading.
pub struct SteppingClock(pub Arc<AtomicI64>);

impl Clock for SteppingClock {
    fn now(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

pub fn authenticator() -> StaticAuthenticator {
    StaticAuthenticator::new()
        .with_token(TOKEN)
        .with_basic(TELLER, TELLER_PASSWORD)
}

pub async fn seed(store: &dyn LedgerStore, accounts: &[(&str, Decimal)]) {
    for (account, balance) in accounts {
        store
            .open_account(BalanceRecord::new(*account, *balance, 0))
            .await
            .unwrap();
    }
}

/// In-memory engine with the given fee rate and opening balances.
pub async fn engine_with(fee_rate: Decimal, accounts: &[(&str, Decimal)]) -> PainEngine {
    let store = InMemoryLedgerStore::new();
    seed(&store, accounts).await;
    let config = EngineConfig::default().with_fee_rate(FeeRate::new(fee_rate).unwrap());
    PainEngine::new(Box::new(store), Box::new(authenticator()), config)
        .with_clock(Box::new(SteppingClock(Arc::new(AtomicI64::new(1_000)))))
}

pub fn transfer<'a>(from: &'a str, to: &'a str, amount: &'a str) -> Vec<&'a str> {
    vec![TOKEN, "pain", "1", from, to, amount, "", "", "test transfer"]
}

pub fn deposit<'a>(to: &'a str, amount: &'a str) -> Vec<&'a str> {
    vec!["", "pain", "1000", to, amount, "", "", "test deposit", TELLER, TELLER_PASSWORD]
}

pub async fn history(engine: &PainEngine, fields: &[&str]) -> Result<Vec<PainTransaction>> {
    match engine.process(fields).await? {
        PainResponse::History(rows) => Ok(rows),
        other => panic!("expected history, got {other:?}"),
    }
}

pub async fn available(engine: &PainEngine, account: &str) -> Decimal {
    engine
        .store()
        .balance(account)
        .await
        .unwrap()
        .expect("account should exist")
        .available_balance
}

pub async fn holding(engine: &PainEngine) -> Decimal {
    engine.store().holding_account().await.unwrap().balance
}

pub async fn ledger_len(engine: &PainEngine, account: &str) -> usize {
    let query = HistoryQuery {
        account_number: account.to_string(),
        offset: 0,
        per_page: usize::MAX,
        min_timestamp: None,
    };
    engine.store().list(&query).await.unwrap().len()
}

/// Which step of a unit of work the faulty store breaks on.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    AddFee,
    Append,
    Commit,
}

/// Wraps the in-memory store and fails one step of every unit of work.
pub struct FaultyStore {
    pub inner: InMemoryLedgerStore,
    pub fail_at: FailAt,
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>> {
        Ok(Box::new(FaultyUnit {
            inner: self.inner.begin().await?,
            fail_at: self.fail_at,
        }))
    }

    async fn list(&self, query: &HistoryQuery) -> Result<Vec<PainTransaction>> {
        self.inner.list(query).await
    }

    async fn balance(&self, account_number: &str) -> Result<Option<BalanceRecord>> {
        self.inner.balance(account_number).await
    }

    async fn holding_account(&self) -> Result<HoldingAccountRecord> {
        self.inner.holding_account().await
    }

    async fn open_account(&self, record: BalanceRecord) -> Result<()> {
        self.inner.open_account(record).await
    }

    async fn remove_transaction(&self, id: i64) -> Result<()> {
        self.inner.remove_transaction(id).await
    }
}

struct FaultyUnit {
    inner: Box<dyn LedgerUnit>,
    fail_at: FailAt,
}

fn store_down() -> PainError {
    PainError::PersistenceError("store unavailable".to_string())
}

#[async_trait]
impl LedgerUnit for FaultyUnit {
    async fn balance(&mut self, account_number: &str) -> Result<BalanceRecord> {
        self.inner.balance(account_number).await
    }

    async fn apply_delta(
        &mut self,
        account_number: &str,
        delta: Decimal,
        timestamp: i64,
    ) -> Result<()> {
        self.inner.apply_delta(account_number, delta, timestamp).await
    }

    async fn add_fee(&mut self, fee: Decimal, timestamp: i64) -> Result<()> {
        if self.fail_at == FailAt::AddFee {
            return Err(store_down());
        }
        self.inner.add_fee(fee, timestamp).await
    }

    async fn append(&mut self, transaction: PainTransaction) -> Result<i64> {
        if self.fail_at == FailAt::Append {
            return Err(store_down());
        }
        self.inner.append(transaction).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fail_at == FailAt::Commit {
            return Err(store_down());
        }
        self.inner.commit().await
    }
}

/// Writes `rows` credit transfers from `from` to `to` as a command CSV.
pub fn generate_commands(path: &Path, from: &str, to: &str, rows: usize) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    for _ in 0..rows {
        wtr.write_record(transfer(from, to, "1.00"))?;
    }

    wtr.flush()?;
    Ok(())
}
