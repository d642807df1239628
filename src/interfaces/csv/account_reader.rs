use crate::domain::account::BalanceRecord;
use crate::error::{PainError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct AccountSeed {
    account_number: String,
    #[serde(with = "rust_decimal::serde::str")]
    balance: Decimal,
}

/// Reads opening balances (`account_number,balance`) for local accounts.
pub struct AccountReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> AccountReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Yields one balance record per row, stamped with `timestamp`.
    pub fn accounts(self, timestamp: i64) -> impl Iterator<Item = Result<BalanceRecord>> {
        self.reader.into_deserialize().map(move |result| {
            result
                .map(|seed: AccountSeed| {
                    BalanceRecord::new(seed.account_number, seed.balance, timestamp)
                })
                .map_err(PainError::from)
        })
    }
}
