use crate::domain::account::{BalanceRecord, HoldingAccountRecord};
use crate::error::Result;
use std::io::Write;

/// Writes balance rows as CSV, with the holding account as a final `@holding` row.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_balances(
        &mut self,
        accounts: impl IntoIterator<Item = BalanceRecord>,
        holding: &HoldingAccountRecord,
    ) -> Result<()> {
        self.writer
            .write_record(["account", "account_balance", "available_balance", "timestamp"])?;
        for record in accounts {
            self.writer.write_record([
                record.account_number,
                record.account_balance.normalize().to_string(),
                record.available_balance.normalize().to_string(),
                record.timestamp.to_string(),
            ])?;
        }
        let balance = holding.balance.normalize().to_string();
        self.writer.write_record([
            "@holding".to_string(),
            balance.clone(),
            balance,
            holding.timestamp.to_string(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}
