//! Domain events for the Account context.

use ledgerline_core::error::{DomainError, ReplayError};
use ledgerline_core::event::{DomainEvent, EventCodec, EventMetadata};
use ledgerline_core::stream::StreamId;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Event type tag for [`AccountOpened`].
pub const ACCOUNT_OPENED_EVENT_TYPE: &str = "account.opened";
/// Event type tag for [`FundsDeposited`].
pub const FUNDS_DEPOSITED_EVENT_TYPE: &str = "account.funds_deposited";
/// Event type tag for [`FundsWithdrawn`].
pub const FUNDS_WITHDRAWN_EVENT_TYPE: &str = "account.funds_withdrawn";

/// Current schema version of [`AccountOpened`]. Version 1 named the owner
/// field `owner_name`.
pub const ACCOUNT_OPENED_SCHEMA_VERSION: i32 = 2;
/// Current schema version of [`FundsDeposited`].
pub const FUNDS_DEPOSITED_SCHEMA_VERSION: i32 = 1;
/// Current schema version of [`FundsWithdrawn`].
pub const FUNDS_WITHDRAWN_SCHEMA_VERSION: i32 = 1;

/// Emitted when an account is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOpened {
    /// The account identifier.
    pub account_id: StreamId,
    /// The account holder's name.
    pub owner: String,
}

/// Emitted when money is paid into an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsDeposited {
    /// The account identifier.
    pub account_id: StreamId,
    /// Amount deposited; always positive.
    pub amount: Decimal,
}

/// Emitted when money is taken out of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    /// The account identifier.
    pub account_id: StreamId,
    /// Amount withdrawn; always positive and never more than the balance.
    pub amount: Decimal,
}

/// Event payload variants for the Account context.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEventKind {
    /// An account has been opened.
    AccountOpened(AccountOpened),
    /// Funds have been deposited.
    FundsDeposited(FundsDeposited),
    /// Funds have been withdrawn.
    FundsWithdrawn(FundsWithdrawn),
}

impl AccountEventKind {
    /// Returns the event type tag of this variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AccountOpened(_) => ACCOUNT_OPENED_EVENT_TYPE,
            Self::FundsDeposited(_) => FUNDS_DEPOSITED_EVENT_TYPE,
            Self::FundsWithdrawn(_) => FUNDS_WITHDRAWN_EVENT_TYPE,
        }
    }

    /// Returns the schema version this variant serializes as.
    #[must_use]
    pub fn schema_version(&self) -> i32 {
        match self {
            Self::AccountOpened(_) => ACCOUNT_OPENED_SCHEMA_VERSION,
            Self::FundsDeposited(_) => FUNDS_DEPOSITED_SCHEMA_VERSION,
            Self::FundsWithdrawn(_) => FUNDS_WITHDRAWN_SCHEMA_VERSION,
        }
    }

    /// Returns the account the payload names.
    #[must_use]
    pub fn account_id(&self) -> &StreamId {
        match self {
            Self::AccountOpened(e) => &e.account_id,
            Self::FundsDeposited(e) => &e.account_id,
            Self::FundsWithdrawn(e) => &e.account_id,
        }
    }
}

/// Domain event envelope for the Account context.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: AccountEventKind,
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn schema_version(&self) -> i32 {
        self.kind.schema_version()
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        let payload = match &self.kind {
            AccountEventKind::AccountOpened(e) => serde_json::to_value(e),
            AccountEventKind::FundsDeposited(e) => serde_json::to_value(e),
            AccountEventKind::FundsWithdrawn(e) => serde_json::to_value(e),
        };
        payload.map_err(|e| {
            DomainError::Infrastructure(format!("event serialization failed: {e}"))
        })
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

fn decode_payload<T: DeserializeOwned>(
    metadata: &EventMetadata,
    payload: serde_json::Value,
) -> Result<T, ReplayError> {
    serde_json::from_value(payload).map_err(|e| {
        ReplayError::new(
            metadata.stream_id.clone(),
            metadata.position,
            format!("malformed '{}' payload: {e}", metadata.event_type),
        )
    })
}

impl EventCodec for AccountEvent {
    fn decode(metadata: EventMetadata, payload: serde_json::Value) -> Result<Self, ReplayError> {
        let kind = match metadata.event_type.as_str() {
            ACCOUNT_OPENED_EVENT_TYPE => {
                AccountEventKind::AccountOpened(decode_payload(&metadata, payload)?)
            }
            FUNDS_DEPOSITED_EVENT_TYPE => {
                AccountEventKind::FundsDeposited(decode_payload(&metadata, payload)?)
            }
            FUNDS_WITHDRAWN_EVENT_TYPE => {
                AccountEventKind::FundsWithdrawn(decode_payload(&metadata, payload)?)
            }
            other => {
                return Err(ReplayError::new(
                    metadata.stream_id.clone(),
                    metadata.position,
                    format!("unknown event type '{other}' for account"),
                ));
            }
        };
        Ok(Self { metadata, kind })
    }
}
