use super::codec::Command;
use super::dispatch::Operation;
use crate::domain::account::{AccountHolder, Amount};
use crate::domain::transaction::GeoPoint;
use crate::error::{PainError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CreditTransferRequest {
    pub token: String,
    pub sender: AccountHolder,
    pub receiver: AccountHolder,
    pub amount: Amount,
    pub geo: Option<GeoPoint>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepositRequest {
    pub receiver: AccountHolder,
    pub amount: Amount,
    pub geo: Option<GeoPoint>,
    pub description: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub token: String,
    pub account_number: String,
    /// 1-based.
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub min_timestamp: Option<i64>,
}

/// A command with named, typed fields in place of positional strings.
#[derive(Debug, Clone, PartialEq)]
pub enum PainRequest {
    CreditTransfer(CreditTransferRequest),
    Deposit(DepositRequest),
    History(HistoryRequest),
}

impl PainRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::CreditTransfer(_) => Operation::CreditTransferInitiation,
            Self::Deposit(_) => Operation::DepositInitiation,
            Self::History(_) => Operation::HistoryListing,
        }
    }
}

impl TryFrom<Command> for PainRequest {
    type Error = PainError;

    fn try_from(command: Command) -> Result<Self> {
        let operation = Operation::lookup(&command.domain, command.operation_code).ok_or_else(
            || {
                PainError::ValidationError(format!(
                    "No operation {} in domain '{}'",
                    command.operation_code, command.domain
                ))
            },
        )?;
        let Command {
            credential,
            arguments,
            ..
        } = command;

        match operation {
            Operation::CreditTransferInitiation => {
                let [sender, receiver, amount, lat, lon, description] =
                    expect_args::<6>(arguments, "credit transfer")?;
                Ok(Self::CreditTransfer(CreditTransferRequest {
                    token: credential,
                    sender: sender.parse()?,
                    receiver: receiver.parse()?,
                    amount: amount.parse()?,
                    geo: GeoPoint::from_parts(&lat, &lon)?,
                    description,
                }))
            }
            Operation::DepositInitiation => {
                let [receiver, amount, lat, lon, description, user, password] =
                    expect_args::<7>(arguments, "deposit")?;
                Ok(Self::Deposit(DepositRequest {
                    receiver: receiver.parse()?,
                    amount: amount.parse()?,
                    geo: GeoPoint::from_parts(&lat, &lon)?,
                    description,
                    user,
                    password,
                }))
            }
            Operation::HistoryListing => {
                if arguments.is_empty() || arguments.len() > 4 {
                    return Err(PainError::ValidationError(format!(
                        "History listing takes 1 to 4 arguments, got {}",
                        arguments.len()
                    )));
                }
                let mut args = arguments.into_iter();
                let account_number = args.next().unwrap_or_default().trim().to_string();
                if account_number.is_empty() {
                    return Err(PainError::ValidationError(
                        "History listing needs an account number".to_string(),
                    ));
                }
                let page = optional_number::<usize>(args.next(), "page")?;
                let per_page = optional_number::<usize>(args.next(), "perPage")?;
                let min_timestamp =
                    optional_number::<i64>(args.next(), "timestamp")?.filter(|ts| *ts > 0);
                Ok(Self::History(HistoryRequest {
                    token: credential,
                    account_number,
                    page,
                    per_page,
                    min_timestamp,
                }))
            }
        }
    }
}

fn expect_args<const N: usize>(arguments: Vec<String>, name: &str) -> Result<[String; N]> {
    let got = arguments.len();
    arguments.try_into().map_err(|_| {
        PainError::ValidationError(format!("{name} takes {N} arguments, got {got}"))
    })
}

fn optional_number<T: std::str::FromStr>(raw: Option<String>, name: &str) -> Result<Option<T>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| PainError::ValidationError(format!("Invalid {name} '{value}'"))),
    }
}
