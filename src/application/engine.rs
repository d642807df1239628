use super::codec::Command;
use super::request::{CreditTransferRequest, DepositRequest, HistoryRequest, PainRequest};
use crate::config::{EngineConfig, RemoteLegPolicy};
use crate::domain::account::AccountHolder;
use crate::domain::ports::{
    AuthenticatorBox, ClockBox, HistoryQuery, LedgerStore, LedgerStoreBox, LedgerUnit,
    SystemClock,
};
use crate::domain::transaction::{PainTransaction, PainType, TransactionStatus};
use crate::error::{PainError, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Success payload handed back to the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PainResponse {
    Transaction(PainTransaction),
    History(Vec<PainTransaction>),
}

/// The transaction processor.
///
/// `PainEngine` authorizes and routes decoded commands, computes fees, and
/// applies every balance mutation, the fee collection, and the ledger append
/// of one transaction inside a single `LedgerUnit`. Either the unit commits
/// and all of it becomes visible, or none of it does.
pub struct PainEngine {
    store: LedgerStoreBox,
    authenticator: AuthenticatorBox,
    clock: ClockBox,
    config: EngineConfig,
}

impl PainEngine {
    /// Creates a new `PainEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - Balances, holding account and ledger.
    /// * `authenticator` - Token and basic-auth checks.
    /// * `config` - Fee rate, paging limits and remote-leg policy.
    pub fn new(
        store: LedgerStoreBox,
        authenticator: AuthenticatorBox,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            authenticator,
            clock: Box::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decodes a raw command vector and dispatches it.
    pub async fn process<S: AsRef<str>>(&self, fields: &[S]) -> Result<PainResponse> {
        let command = Command::decode(fields).map_err(|e| e.within("command_codec"))?;
        let request = PainRequest::try_from(command).map_err(|e| e.within("command_codec"))?;
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: PainRequest) -> Result<PainResponse> {
        let operation = request.operation();
        debug!(?operation, code = operation.code(), "dispatching request");
        let response = match request {
            PainRequest::CreditTransfer(req) => self
                .initiate_credit_transfer(req)
                .await
                .map(PainResponse::Transaction),
            PainRequest::Deposit(req) => self
                .initiate_deposit(req)
                .await
                .map(PainResponse::Transaction),
            PainRequest::History(req) => self.list_history(req).await.map(PainResponse::History),
        };
        response.map_err(|e| e.within("pain_engine"))
    }

    pub async fn initiate_credit_transfer(
        &self,
        req: CreditTransferRequest,
    ) -> Result<PainTransaction> {
        self.authenticator
            .check_token(&req.token)
            .await
            .map_err(|e| e.within("authenticator"))?;
        self.check_remote_legs(&[&req.sender, &req.receiver])?;

        let transaction = PainTransaction::new(
            PainType::CreditTransfer,
            req.sender,
            req.receiver,
            req.amount,
            self.config.fee_rate,
        )
        .with_geo(req.geo)
        .with_description(req.description);
        self.apply(transaction).await
    }

    pub async fn initiate_deposit(&self, req: DepositRequest) -> Result<PainTransaction> {
        self.authenticator
            .check_basic_auth(&req.user, &req.password)
            .await
            .map_err(|e| e.within("authenticator"))?;
        self.check_remote_legs(&[&req.receiver])?;

        let transaction = PainTransaction::new(
            PainType::Deposit,
            req.receiver.clone(),
            req.receiver,
            req.amount,
            self.config.fee_rate,
        )
        .with_geo(req.geo)
        .with_description(req.description);
        self.apply(transaction).await
    }

    pub async fn list_history(&self, req: HistoryRequest) -> Result<Vec<PainTransaction>> {
        self.authenticator
            .check_token(&req.token)
            .await
            .map_err(|e| e.within("authenticator"))?;

        let per_page = req.per_page.unwrap_or(self.config.default_per_page);
        if per_page == 0 {
            return Err(PainError::ValidationError(
                "perPage must be positive".to_string(),
            ));
        }
        let per_page = per_page.min(self.config.max_per_page);
        let page = req.page.unwrap_or(1).max(1);
        let query = HistoryQuery {
            account_number: req.account_number,
            offset: (page - 1).saturating_mul(per_page),
            per_page,
            min_timestamp: req.min_timestamp,
        };
        self.store
            .list(&query)
            .await
            .map_err(|e| e.within("ledger_store"))
    }

    fn check_remote_legs(&self, legs: &[&AccountHolder]) -> Result<()> {
        if self.config.remote_legs == RemoteLegPolicy::Reject
            && let Some(remote) = legs.iter().find(|leg| !leg.is_local())
        {
            return Err(PainError::RoutingUnsupportedError(format!(
                "Account {remote} belongs to another bank"
            )));
        }
        Ok(())
    }

    /// Runs one transaction as a single unit: mutate balances, collect the fee,
    /// append the ledger row, commit. Any failure drops the unit uncommitted.
    async fn apply(&self, transaction: PainTransaction) -> Result<PainTransaction> {
        let timestamp = self.clock.now();
        let mut transaction = transaction.at(timestamp);
        transaction.status = TransactionStatus::Approved;

        let amount = transaction.amount.value();
        let fee = transaction.fee_amount.value();

        let mut unit = self
            .store
            .begin()
            .await
            .map_err(|e| e.within("ledger_store"))?;

        match transaction.pain_type {
            PainType::CreditTransfer => {
                let debit = amount.checked_add(fee).ok_or_else(|| {
                    PainError::ValidationError(format!("Amount {amount} plus fee {fee} overflows"))
                })?;
                if transaction.sender.is_local() {
                    let account = &transaction.sender.account_number;
                    let record = unit
                        .balance(account)
                        .await
                        .map_err(|e| e.within("balance_mutator"))?;
                    if record.available_balance < debit {
                        return Err(PainError::ValidationError(format!(
                            "Insufficient funds in account {account}: available {}, required {debit}",
                            record.available_balance
                        )));
                    }
                    debit_or_credit(unit.as_mut(), account, -debit, timestamp).await?;
                } else {
                    drop_onto_ledger(&transaction.sender, "sender");
                }

                if transaction.receiver.is_local() {
                    let account = &transaction.receiver.account_number;
                    debit_or_credit(unit.as_mut(), account, amount, timestamp).await?;
                } else {
                    drop_onto_ledger(&transaction.receiver, "receiver");
                }
            }
            PainType::Deposit => {
                if transaction.receiver.is_local() {
                    let account = &transaction.receiver.account_number;
                    // fee <= amount
                    let net = amount - fee;
                    debit_or_credit(unit.as_mut(), account, net, timestamp).await?;
                } else {
                    drop_onto_ledger(&transaction.receiver, "receiver");
                }
            }
        }

        unit.add_fee(fee, timestamp)
            .await
            .map_err(|e| e.within("holding_account"))?;
        let id = unit
            .append(transaction.clone())
            .await
            .map_err(|e| e.within("ledger_store"))?;
        unit.commit().await.map_err(|e| e.within("ledger_store"))?;

        transaction.id = Some(id);
        info!(
            id,
            pain_type = transaction.pain_type.code(),
            sender = %transaction.sender,
            receiver = %transaction.receiver,
            amount = %amount,
            fee = %fee,
            "transaction committed"
        );
        Ok(transaction)
    }
}

async fn debit_or_credit(
    unit: &mut dyn LedgerUnit,
    account_number: &str,
    delta: rust_decimal::Decimal,
    timestamp: i64,
) -> Result<()> {
    unit.apply_delta(account_number, delta, timestamp)
        .await
        .map_err(|e| e.within("balance_mutator"))
}

/// Settlement with other banks is not implemented; the leg lives on the ledger only.
fn drop_onto_ledger(holder: &AccountHolder, leg: &str) {
    warn!(
        account = %holder.account_number,
        bank = %holder.bank_number,
        leg,
        "remote bank leg recorded on ledger without local mutation"
    );
}
