use crate::domain::account::{BalanceRecord, HoldingAccountRecord};
use crate::domain::ports::{HistoryQuery, LedgerStore, LedgerUnit};
use crate::domain::transaction::PainTransaction;
use crate::error::{PainError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Column Family for storing account balance rows.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing ledger rows, keyed by big-endian id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for the holding account and the id counter.
pub const CF_META: &str = "meta";

const KEY_HOLDING: &[u8] = b"holding_account";
const KEY_LAST_ID: &[u8] = b"last_transaction_id";

/// A persistent ledger store implementation using RocksDB.
///
/// Units of work stage their mutations in memory and commit them as one
/// `WriteBatch`, so a crash either persists the whole transaction or nothing.
/// A process-wide write mutex serializes units against each other.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ACCOUNTS, CF_TRANSACTIONS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }
}

fn cf<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| PainError::PersistenceError(format!("Column family {name} not found")))
}

fn get_json<T: DeserializeOwned>(db: &DB, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
    match db.get_cf(cf(db, cf_name)?, key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn transaction_key(id: i64) -> [u8; 8] {
    id.to_be_bytes()
}

fn last_id(db: &DB) -> Result<i64> {
    Ok(get_json(db, CF_META, KEY_LAST_ID)?.unwrap_or(0))
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>> {
        let guard = self.write_lock.clone().lock_owned().await;
        let last_id = last_id(&self.db)?;
        Ok(Box::new(RocksDBUnit {
            db: self.db.clone(),
            _guard: guard,
            last_id,
            accounts: HashMap::new(),
            holding: None,
            appended: Vec::new(),
        }))
    }

    async fn list(&self, query: &HistoryQuery) -> Result<Vec<PainTransaction>> {
        let handle = cf(&self.db, CF_TRANSACTIONS)?;
        let mut page = Vec::with_capacity(query.per_page);
        let mut skipped = 0;

        // Ids are positive, so big-endian keys sort in id order.
        for item in self.db.iterator_cf(handle, IteratorMode::End) {
            let (_key, value) = item?;
            let tx: PainTransaction = serde_json::from_slice(&value)?;
            if !tx.touches(&query.account_number)
                || query.min_timestamp.is_some_and(|min| tx.timestamp < min)
            {
                continue;
            }
            if skipped < query.offset {
                skipped += 1;
                continue;
            }
            if page.len() == query.per_page {
                break;
            }
            page.push(tx);
        }
        Ok(page)
    }

    async fn balance(&self, account_number: &str) -> Result<Option<BalanceRecord>> {
        get_json(&self.db, CF_ACCOUNTS, account_number.as_bytes())
    }

    async fn holding_account(&self) -> Result<HoldingAccountRecord> {
        Ok(get_json(&self.db, CF_META, KEY_HOLDING)?.unwrap_or_default())
    }

    async fn open_account(&self, record: BalanceRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let value = to_json(&record)?;
        self.db.put_cf(
            cf(&self.db, CF_ACCOUNTS)?,
            record.account_number.as_bytes(),
            value,
        )?;
        Ok(())
    }

    async fn remove_transaction(&self, id: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let handle = cf(&self.db, CF_TRANSACTIONS)?;
        let key = transaction_key(id);
        if self.db.get_pinned_cf(handle, key)?.is_none() {
            return Err(PainError::NotFoundError(format!("Transaction {id}")));
        }
        self.db.delete_cf(handle, key)?;
        Ok(())
    }
}

struct RocksDBUnit {
    db: Arc<DB>,
    _guard: OwnedMutexGuard<()>,
    last_id: i64,
    accounts: HashMap<String, BalanceRecord>,
    holding: Option<HoldingAccountRecord>,
    appended: Vec<PainTransaction>,
}

#[async_trait]
impl LedgerUnit for RocksDBUnit {
    async fn balance(&mut self, account_number: &str) -> Result<BalanceRecord> {
        if let Some(record) = self.accounts.get(account_number) {
            return Ok(record.clone());
        }
        get_json(&self.db, CF_ACCOUNTS, account_number.as_bytes())?
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
        let mut holding = match self.holding.take() {
            Some(holding) => holding,
            None => get_json(&self.db, CF_META, KEY_HOLDING)?.unwrap_or_default(),
        };
        holding.collect(fee, timestamp)?;
        self.holding = Some(holding);
        Ok(())
    }

    async fn append(&mut self, mut transaction: PainTransaction) -> Result<i64> {
        let id = self.last_id + self.appended.len() as i64 + 1;
        transaction.id = Some(id);
        self.appended.push(transaction);
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let accounts_cf = cf(&self.db, CF_ACCOUNTS)?;
        let transactions_cf = cf(&self.db, CF_TRANSACTIONS)?;
        let meta_cf = cf(&self.db, CF_META)?;

        let mut batch = WriteBatch::default();
        for (account_number, record) in &self.accounts {
            batch.put_cf(accounts_cf, account_number.as_bytes(), to_json(record)?);
        }
        if let Some(holding) = &self.holding {
            batch.put_cf(meta_cf, KEY_HOLDING, to_json(holding)?);
        }
        let mut last_id = self.last_id;
        for transaction in &self.appended {
            if let Some(id) = transaction.id {
                batch.put_cf(transactions_cf, transaction_key(id), to_json(transaction)?);
                last_id = last_id.max(id);
            }
        }
        batch.put_cf(meta_cf, KEY_LAST_ID, to_json(&last_id)?);

        self.db.write(batch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountHolder, Amount, FeeRate};
    use crate::domain::transaction::PainType;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn transfer(from: &str, to: &str, timestamp: i64) -> PainTransaction {
        PainTransaction::new(
            PainType::CreditTransfer,
            AccountHolder::local(from),
            AccountHolder::local(to),
            Amount::new(dec!(2.50)).unwrap(),
            FeeRate::new(dec!(0.01)).unwrap(),
        )
        .at(timestamp)
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
        assert!(store.db.cf_handle(CF_META).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_unit_commit_and_rollback() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        store
            .open_account(BalanceRecord::new("a", dec!(10.00), 0))
            .await
            .unwrap();

        {
            let mut unit = store.begin().await.unwrap();
            unit.apply_delta("a", dec!(-5), 1).await.unwrap();
            unit.append(transfer("a", "b", 1)).await.unwrap();
        }
        assert_eq!(
            store.balance("a").await.unwrap().unwrap().available_balance,
            dec!(10.00)
        );

        let mut unit = store.begin().await.unwrap();
        unit.apply_delta("a", dec!(-2.525), 2).await.unwrap();
        unit.add_fee(dec!(0.025), 2).await.unwrap();
        let id = unit.append(transfer("a", "b", 2)).await.unwrap();
        unit.commit().await.unwrap();

        assert_eq!(id, 1);
        assert_eq!(
            store.balance("a").await.unwrap().unwrap().account_balance,
            dec!(7.475)
        );
        assert_eq!(store.holding_account().await.unwrap().balance, dec!(0.025));
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            for ts in 1..=3 {
                let mut unit = store.begin().await.unwrap();
                unit.append(transfer("a", "b", ts)).await.unwrap();
                unit.commit().await.unwrap();
            }
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        let query = HistoryQuery {
            account_number: "a".to_string(),
            offset: 0,
            per_page: 10,
            min_timestamp: None,
        };
        let ids: Vec<_> = store
            .list(&query)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let mut unit = store.begin().await.unwrap();
        assert_eq!(unit.append(transfer("a", "b", 4)).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_rocksdb_list_filters_and_pages() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let mut unit = store.begin().await.unwrap();
        for ts in 1..=6 {
            unit.append(transfer("a", "b", ts * 100)).await.unwrap();
        }
        unit.append(transfer("x", "y", 700)).await.unwrap();
        unit.commit().await.unwrap();

        let query = HistoryQuery {
            account_number: "b".to_string(),
            offset: 1,
            per_page: 2,
            min_timestamp: Some(300),
        };
        let ids: Vec<_> = store
            .list(&query)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[tokio::test]
    async fn test_rocksdb_remove_transaction() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let mut unit = store.begin().await.unwrap();
        let id = unit.append(transfer("a", "b", 1)).await.unwrap();
        unit.commit().await.unwrap();

        store.remove_transaction(id).await.unwrap();
        assert!(matches!(
            store.remove_transaction(id).await,
            Err(PainError::NotFoundError(_))
        ));
    }
}
