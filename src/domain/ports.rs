use super::account::{BalanceRecord, HoldingAccountRecord};
use super::transaction::PainTransaction;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Page of a history listing, with relational `LIMIT offset, per_page` semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub account_number: String,
    pub offset: usize,
    pub per_page: usize,
    pub min_timestamp: Option<i64>,
}

/// Persistent home of balances, the holding account, and the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transactional unit. Units are serialized against each other.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>>;

    /// Rows touching the account, most recent first.
    async fn list(&self, query: &HistoryQuery) -> Result<Vec<PainTransaction>>;

    async fn balance(&self, account_number: &str) -> Result<Option<BalanceRecord>>;

    async fn holding_account(&self) -> Result<HoldingAccountRecord>;

    /// Creates or replaces a local account's balance row.
    async fn open_account(&self, record: BalanceRecord) -> Result<()>;

    /// Test teardown only; ledger rows are never removed in normal operation.
    async fn remove_transaction(&self, id: i64) -> Result<()>;
}

/// A scoped transactional unit over a `LedgerStore`.
///
/// Nothing staged here is visible until `commit`. Dropping the unit without
/// committing discards every staged mutation.
#[async_trait]
pub trait LedgerUnit: Send {
    async fn balance(&mut self, account_number: &str) -> Result<BalanceRecord>;

    /// Adds `delta` to both the account and available balance.
    async fn apply_delta(
        &mut self,
        account_number: &str,
        delta: Decimal,
        timestamp: i64,
    ) -> Result<()>;

    async fn add_fee(&mut self, fee: Decimal, timestamp: i64) -> Result<()>;

    /// Stages the row and returns the identifier it will carry once committed.
    async fn append(&mut self, transaction: PainTransaction) -> Result<i64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Credential checks, owned by the authentication subsystem.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn check_token(&self, token: &str) -> Result<()>;
    async fn check_basic_auth(&self, user: &str, password: &str) -> Result<()>;
}

pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type AuthenticatorBox = Box<dyn Authenticator>;
pub type ClockBox = Box<dyn Clock>;
