//! Commands for the Account context.

use ledgerline_core::command::Command;
use ledgerline_core::stream::StreamId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to open a new account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier to open the account under; `None` generates one.
    pub account_id: Option<StreamId>,
    /// The account holder's name.
    pub owner: String,
}

/// Command to deposit funds.
#[derive(Debug, Clone)]
pub struct DepositFunds {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: StreamId,
    /// Amount to deposit.
    pub amount: Decimal,
}

/// Command to withdraw funds.
#[derive(Debug, Clone)]
pub struct WithdrawFunds {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: StreamId,
    /// Amount to withdraw.
    pub amount: Decimal,
}

impl Command for OpenAccount {
    fn command_type(&self) -> &'static str {
        "open"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for DepositFunds {
    fn command_type(&self) -> &'static str {
        "deposit"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for WithdrawFunds {
    fn command_type(&self) -> &'static str {
        "withdraw"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// A command addressed by name, as submitted from outside the context.
///
/// Serialized with a `command` tag, e.g. `{"command": "deposit", "amount": "100.0"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AccountCommand {
    /// Open the account.
    Open {
        /// The account holder's name.
        owner: String,
    },
    /// Deposit funds.
    Deposit {
        /// Amount to deposit.
        amount: Decimal,
    },
    /// Withdraw funds.
    Withdraw {
        /// Amount to withdraw.
        amount: Decimal,
    },
}

impl AccountCommand {
    /// Binds the payload to a target account and correlation ID.
    #[must_use]
    pub fn into_command(
        self,
        account_id: StreamId,
        correlation_id: Uuid,
    ) -> AccountCommandEnvelope {
        match self {
            Self::Open { owner } => AccountCommandEnvelope::Open(OpenAccount {
                correlation_id,
                account_id: Some(account_id),
                owner,
            }),
            Self::Deposit { amount } => AccountCommandEnvelope::Deposit(DepositFunds {
                correlation_id,
                account_id,
                amount,
            }),
            Self::Withdraw { amount } => AccountCommandEnvelope::Withdraw(WithdrawFunds {
                correlation_id,
                account_id,
                amount,
            }),
        }
    }
}

/// A fully addressed Account command.
#[derive(Debug, Clone)]
pub enum AccountCommandEnvelope {
    /// See [`OpenAccount`].
    Open(OpenAccount),
    /// See [`DepositFunds`].
    Deposit(DepositFunds),
    /// See [`WithdrawFunds`].
    Withdraw(WithdrawFunds),
}
