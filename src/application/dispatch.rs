//! Versioned dispatch table from `(domain, operation code)` to an operation.
//!
//! Codes are append-only: a published code keeps its meaning forever. Within
//! the `pain` domain, codes 2..=999 and 1002.. are reserved.

pub const PAIN_DOMAIN: &str = "pain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreditTransferInitiation,
    DepositInitiation,
    HistoryListing,
}

const DISPATCH_TABLE: &[(&str, i64, Operation)] = &[
    (PAIN_DOMAIN, 1, Operation::CreditTransferInitiation),
    (PAIN_DOMAIN, 1000, Operation::DepositInitiation),
    (PAIN_DOMAIN, 1001, Operation::HistoryListing),
];

impl Operation {
    pub fn lookup(domain: &str, code: i64) -> Option<Self> {
        DISPATCH_TABLE
            .iter()
            .find(|(d, c, _)| *d == domain && *c == code)
            .map(|(_, _, op)| *op)
    }

    pub fn code(self) -> i64 {
        match self {
            Self::CreditTransferInitiation => 1,
            Self::DepositInitiation => 1000,
            Self::HistoryListing => 1001,
        }
    }
}
