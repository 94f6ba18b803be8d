//! Query handlers for the Account context.
//!
//! Queries replay the stream on every call and return read-only views.

use ledgerline_core::aggregate::AggregateRoot;
use ledgerline_core::error::DomainError;
use ledgerline_core::repository::{EventRepository, StoredEvent};
use ledgerline_core::stream::StreamId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::application::command_handlers;

/// Read-only view of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    /// The account identifier.
    pub account_id: StreamId,
    /// The account holder's name.
    pub owner: String,
    /// Current balance.
    pub balance: Decimal,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves an account by replaying its stream.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the stream is empty and
/// `DomainError::Replay` if its history cannot be replayed.
pub async fn get_account_by_id(
    account_id: &StreamId,
    repo: &dyn EventRepository,
) -> Result<AccountView, DomainError> {
    let stored_events = repo.load_events(account_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::AggregateNotFound(account_id.clone()));
    }
    let account = command_handlers::reconstitute(account_id, &stored_events)?;
    Ok(AccountView {
        account_id: account_id.clone(),
        owner: account.owner().unwrap_or_default().to_owned(),
        balance: account.balance(),
        version: account.version(),
    })
}

/// Returns the raw event history of an account.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the stream is empty.
pub async fn get_stream(
    account_id: &StreamId,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events = repo.load_events(account_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::AggregateNotFound(account_id.clone()));
    }
    Ok(stored_events)
}
