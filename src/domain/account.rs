use crate::error::PainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative monetary amount carried by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PainError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PainError::ValidationError(
                "Amount must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The product of a non-negative amount and a rate in [0, 1] lies in
    /// [0, self], so it is always a valid `Amount`.
    pub(crate) fn scaled_by(self, rate: FeeRate) -> Self {
        Self(self.0 * rate.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = PainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| PainError::ValidationError(format!("Invalid amount '{s}': {e}")))?;
        Self::new(value)
    }
}

/// Fraction of the amount charged as a fee, e.g. `0.01` for 1%.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct FeeRate(Decimal);

impl FeeRate {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PainError> {
        if value >= Decimal::ZERO && value <= Decimal::ONE {
            Ok(Self(value))
        } else {
            Err(PainError::ValidationError(format!(
                "Fee rate {value} must lie between 0 and 1"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for FeeRate {
    type Error = PainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeRate> for Decimal {
    fn from(rate: FeeRate) -> Self {
        rate.0
    }
}

/// One side of a transaction.
///
/// The account number is scoped to the bank number; an empty bank number marks
/// an account held by this ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountHolder {
    pub account_number: String,
    pub bank_number: String,
}

impl AccountHolder {
    pub fn local(account_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            bank_number: String::new(),
        }
    }

    pub fn remote(account_number: impl Into<String>, bank_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            bank_number: bank_number.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.bank_number.is_empty()
    }
}

/// Parses `accountNumber@bankNumber`. The bank part may be omitted or empty.
impl FromStr for AccountHolder {
    type Err = PainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account, bank) = match s.trim().split_once('@') {
            Some((account, bank)) => (account.trim(), bank.trim()),
            None => (s.trim(), ""),
        };
        if account.is_empty() {
            return Err(PainError::ValidationError(format!(
                "Account details '{s}' carry no account number"
            )));
        }
        if bank.contains('@') {
            return Err(PainError::ValidationError(format!(
                "Account details '{s}' are malformed"
            )));
        }
        Ok(Self::remote(account, bank))
    }
}

impl fmt::Display for AccountHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_number, self.bank_number)
    }
}

/// Balance row of a local account.
///
/// `account_balance` and `available_balance` move together for every
/// operation this engine performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub account_number: String,
    pub account_balance: Decimal,
    pub available_balance: Decimal,
    pub timestamp: i64,
}

impl BalanceRecord {
    pub fn new(account_number: impl Into<String>, balance: Decimal, timestamp: i64) -> Self {
        Self {
            account_number: account_number.into(),
            account_balance: balance,
            available_balance: balance,
            timestamp,
        }
    }

    /// Applies the same delta to both balances and stamps the time.
    ///
    /// Leaves the record untouched when either balance would leave the
    /// representable range.
    pub fn apply_delta(&mut self, delta: Decimal, timestamp: i64) -> Result<(), PainError> {
        let overflow = || {
            PainError::ValidationError(format!(
                "Balance of account {} would overflow",
                self.account_number
            ))
        };
        let account_balance = self
            .account_balance
            .checked_add(delta)
            .ok_or_else(overflow)?;
        let available_balance = self
            .available_balance
            .checked_add(delta)
            .ok_or_else(overflow)?;
        self.account_balance = account_balance;
        self.available_balance = available_balance;
        self.timestamp = timestamp;
        Ok(())
    }
}

/// The bank's single fee-collecting account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HoldingAccountRecord {
    pub balance: Decimal,
    pub timestamp: i64,
}

impl HoldingAccountRecord {
    pub fn collect(&mut self, fee: Decimal, timestamp: i64) -> Result<(), PainError> {
        self.balance = self.balance.checked_add(fee).ok_or_else(|| {
            PainError::ValidationError("Holding account balance would overflow".to_string())
        })?;
        self.timestamp = timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(PainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!("10.50".parse::<Amount>().unwrap().value(), dec!(10.50));
        assert!(matches!(
            "ten".parse::<Amount>(),
            Err(PainError::ValidationError(_))
        ));
        assert!(matches!(
            "-3".parse::<Amount>(),
            Err(PainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_fee_rate_bounds() {
        assert!(FeeRate::new(dec!(0)).is_ok());
        assert!(FeeRate::new(dec!(1)).is_ok());
        assert!(FeeRate::new(dec!(1.01)).is_err());
        assert!(FeeRate::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_fee_rate_deserializes_from_string() {
        let rate: FeeRate = serde_json::from_str("\"0.02\"").unwrap();
        assert_eq!(rate.value(), dec!(0.02));
        assert!(serde_json::from_str::<FeeRate>("\"2\"").is_err());
    }

    #[test]
    fn test_account_holder_parsing() {
        let local: AccountHolder = "1234".parse().unwrap();
        assert!(local.is_local());
        assert_eq!(local.account_number, "1234");

        let local_with_sep: AccountHolder = "1234@".parse().unwrap();
        assert!(local_with_sep.is_local());

        let remote: AccountHolder = "1234@bank-9".parse().unwrap();
        assert!(!remote.is_local());
        assert_eq!(remote.bank_number, "bank-9");

        assert!("@bank-9".parse::<AccountHolder>().is_err());
        assert!("".parse::<AccountHolder>().is_err());
        assert!("a@b@c".parse::<AccountHolder>().is_err());
    }

    #[test]
    fn test_balance_record_moves_both_balances() {
        let mut record = BalanceRecord::new("1", dec!(100.00), 0);
        record.apply_delta(dec!(-10.10), 42).unwrap();
        assert_eq!(record.account_balance, dec!(89.90));
        assert_eq!(record.available_balance, dec!(89.90));
        assert_eq!(record.timestamp, 42);
    }

    #[test]
    fn test_balance_overflow_leaves_record_untouched() {
        let mut record = BalanceRecord::new("1", Decimal::MAX, 3);
        assert!(matches!(
            record.apply_delta(dec!(10), 4),
            Err(PainError::ValidationError(_))
        ));
        assert_eq!(record, BalanceRecord::new("1", Decimal::MAX, 3));
    }

    #[test]
    fn test_holding_account_collects() {
        let mut holding = HoldingAccountRecord::default();
        holding.collect(dec!(0.10), 7).unwrap();
        holding.collect(dec!(1.00), 8).unwrap();
        assert_eq!(holding.balance, dec!(1.10));
        assert_eq!(holding.timestamp, 8);
    }

    #[test]
    fn test_holding_account_overflow_is_refused() {
        let mut holding = HoldingAccountRecord {
            balance: Decimal::MAX,
            timestamp: 1,
        };
        assert!(holding.collect(dec!(5), 2).is_err());
        assert_eq!(holding.balance, Decimal::MAX);
        assert_eq!(holding.timestamp, 1);
    }
}
