use crate::domain::account::{BalanceRecord, HoldingAccountRecord};
use crate::domain::ports::{HistoryQuery, LedgerStore, LedgerUnit};
use crate::domain::transaction::PainTransaction;
use crate::error::{PainError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, BalanceRecord>,
    holding: HoldingAccountRecord,
    transactions: BTreeMap<i64, PainTransaction>,
    last_id: i64,
}

/// A thread-safe in-memory ledger store.
///
/// All state sits behind one `Arc<Mutex<_>>`. A unit of work owns the guard
/// until it commits or is dropped, which serializes concurrent units the way
/// row locks would in a relational store.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryUnit {
            state,
            accounts: HashMap::new(),
            holding: None,
            appended: Vec::new(),
        }))
    }

    async fn list(&self, query: &HistoryQuery) -> Result<Vec<PainTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .values()
            .rev()
            .filter(|tx| tx.touches(&query.account_number))
            .filter(|tx| query.min_timestamp.is_none_or(|min| tx.timestamp >= min))
            .skip(query.offset)
            .take(query.per_page)
            .cloned()
            .collect())
    }

    async fn balance(&self, account_number: &str) -> Result<Option<BalanceRecord>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(account_number).cloned())
    }

    async fn holding_account(&self) -> Result<HoldingAccountRecord> {
        let state = self.state.lock().await;
        Ok(state.holding.clone())
    }

    async fn open_account(&self, record: BalanceRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        state.accounts.insert(record.account_number.clone(), record);
        Ok(())
    }

    async fn remove_transaction(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .transactions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PainError::NotFoundError(format!("Transaction {id}")))
    }
}

struct InMemoryUnit {
    state: OwnedMutexGuard<LedgerState>,
    accounts: HashMap<String, BalanceRecord>,
    holding: Option<HoldingAccountRecord>,
    appended: Vec<PainTransaction>,
}

#[async_trait]
impl LedgerUnit for InMemoryUnit {
    async fn balance(&mut self, account_number: &str) -> Result<BalanceRecord> {
        self.accounts
            .get(account_number)
            .or_else(|| self.state.accounts.get(account_number))
            .cloned()
            .ok_or_else(|| PainError::NotFoundError(format!("Account {account_number}")))
    }

    async fn apply_delta(
        &mut self,
        account_number: &str,
        delta: Decimal,
        timestamp: i64,
    ) -> Result<()> {
        let mut record = self.balance(account_number).await?;
        record.apply_delta(delta, timestamp)?;
        self.accounts.insert(account_number.to_string(), record);
        Ok(())
    }

    async fn add_fee(&mut self, fee: Decimal, timestamp: i64) -> Result<()> {
        let holding = self
            .holding
            .get_or_insert_with(|| self.state.holding.clone());
        holding.collect(fee, timestamp)?;
        Ok(())
    }

    async fn append(&mut self, mut transaction: PainTransaction) -> Result<i64> {
        let id = self.state.last_id + self.appended.len() as i64 + 1;
        transaction.id = Some(id);
        self.appended.push(transaction);
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            mut state,
            accounts,
            holding,
            appended,
        } = *self;
        state.accounts.extend(accounts);
        if let Some(holding) = holding {
            state.holding = holding;
        }
        for transaction in appended {
            if let Some(id) = transaction.id {
                state.last_id = state.last_id.max(id);
                state.transactions.insert(id, transaction);
            }
        }
        Ok(())
    }
}
