//! Aggregate roots for the Account context.

use ledgerline_core::aggregate::AggregateRoot;
use ledgerline_core::clock::Clock;
use ledgerline_core::error::{DomainError, ReplayError};
use ledgerline_core::event::EventMetadata;
use ledgerline_core::stream::StreamId;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::events::{
    AccountEvent, AccountEventKind, AccountOpened, FundsDeposited, FundsWithdrawn,
};

/// The aggregate root for a bank account.
///
/// Fields change only in [`AggregateRoot::apply`]. Command methods take
/// `&self` and return the events they would produce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    id: Option<StreamId>,
    owner: Option<String>,
    balance: Decimal,
    version: i64,
}

fn require_positive(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

impl Account {
    /// Returns the account holder, once opened.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the current balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    fn require_identity(&self) -> Result<&StreamId, DomainError> {
        self.id
            .as_ref()
            .ok_or_else(|| DomainError::Validation("account has not been opened".into()))
    }

    fn new_event(
        &self,
        kind: AccountEventKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> AccountEvent {
        AccountEvent {
            metadata: EventMetadata {
                event_id: Uuid::now_v7(),
                event_type: kind.event_type().to_owned(),
                stream_id: kind.account_id().clone(),
                position: self.version,
                schema_version: kind.schema_version(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        }
    }

    /// Opens the account, producing an `AccountOpened` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the account is already open or
    /// the owner name is blank.
    pub fn open(
        &self,
        account_id: StreamId,
        owner: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Vec<AccountEvent>, DomainError> {
        if let Some(existing) = &self.id {
            return Err(DomainError::Validation(format!(
                "account {existing} is already open"
            )));
        }
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(DomainError::Validation(
                "owner name must not be empty".into(),
            ));
        }

        let kind = AccountEventKind::AccountOpened(AccountOpened {
            account_id,
            owner: owner.to_owned(),
        });
        Ok(vec![self.new_event(kind, correlation_id, clock)])
    }

    /// Deposits funds, producing a `FundsDeposited` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the account is not open, the
    /// amount is not positive, or the resulting balance is not representable.
    pub fn deposit(
        &self,
        amount: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Vec<AccountEvent>, DomainError> {
        let account_id = self.require_identity()?.clone();
        require_positive(amount)?;
        if self.balance.checked_add(amount).is_none() {
            return Err(DomainError::Validation(format!(
                "deposit of {amount} would overflow the balance of account {account_id}"
            )));
        }

        let kind = AccountEventKind::FundsDeposited(FundsDeposited { account_id, amount });
        Ok(vec![self.new_event(kind, correlation_id, clock)])
    }

    /// Withdraws funds, producing a `FundsWithdrawn` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the account is not open, the
    /// amount is not positive, or the balance does not cover it.
    pub fn withdraw(
        &self,
        amount: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Vec<AccountEvent>, DomainError> {
        let account_id = self.require_identity()?.clone();
        require_positive(amount)?;
        if amount > self.balance {
            return Err(DomainError::Validation(format!(
                "insufficient funds in account {account_id}: balance {}, requested {amount}",
                self.balance
            )));
        }

        let kind = AccountEventKind::FundsWithdrawn(FundsWithdrawn { account_id, amount });
        Ok(vec![self.new_event(kind, correlation_id, clock)])
    }

    fn check_target(&self, event: &AccountEvent) -> Result<(), ReplayError> {
        let meta = &event.metadata;
        let fail = |reason: String| ReplayError::new(meta.stream_id.clone(), meta.position, reason);
        match &self.id {
            None => Err(fail(format!(
                "'{}' before the account was opened",
                meta.event_type
            ))),
            Some(id) if id != event.kind.account_id() => Err(fail(format!(
                "'{}' names account {} but stream belongs to {id}",
                meta.event_type,
                event.kind.account_id()
            ))),
            Some(_) => Ok(()),
        }
    }
}

impl AggregateRoot for Account {
    type Event = AccountEvent;
    const KIND: &'static str = "account";

    fn aggregate_id(&self) -> Option<&StreamId> {
        self.id.as_ref()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> Result<(), ReplayError> {
        let meta = &event.metadata;
        match &event.kind {
            AccountEventKind::AccountOpened(payload) => {
                if self.id.is_some() {
                    return Err(ReplayError::new(
                        meta.stream_id.clone(),
                        meta.position,
                        "account opened twice",
                    ));
                }
                if payload.account_id != meta.stream_id {
                    return Err(ReplayError::new(
                        meta.stream_id.clone(),
                        meta.position,
                        format!("opened account {} on a foreign stream", payload.account_id),
                    ));
                }
                self.id = Some(payload.account_id.clone());
                self.owner = Some(payload.owner.clone());
            }
            AccountEventKind::FundsDeposited(payload) => {
                self.check_target(event)?;
                self.balance = self.balance.checked_add(payload.amount).ok_or_else(|| {
                    ReplayError::new(
                        meta.stream_id.clone(),
                        meta.position,
                        format!(
                            "deposit of {} overflows balance {}",
                            payload.amount, self.balance
                        ),
                    )
                })?;
            }
            AccountEventKind::FundsWithdrawn(payload) => {
                self.check_target(event)?;
                if payload.amount > self.balance {
                    return Err(ReplayError::new(
                        meta.stream_id.clone(),
                        meta.position,
                        format!(
                            "withdrawal of {} exceeds balance {}",
                            payload.amount, self.balance
                        ),
                    ));
                }
                self.balance -= payload.amount;
            }
        }
        self.version += 1;
        Ok(())
    }
}
