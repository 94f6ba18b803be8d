//! Command handlers for the Account context.
//!
//! Every handler runs the same cycle: load the stream, replay it into an
//! `Account`, let the aggregate decide, and append the resulting events at
//! the version that was read. A concurrency conflict either surfaces to the
//! caller or restarts the cycle, depending on the [`ConflictPolicy`].

use ledgerline_core::aggregate::{self, AggregateRoot};
use ledgerline_core::clock::Clock;
use ledgerline_core::command::Command;
use ledgerline_core::error::DomainError;
use ledgerline_core::repository::{EventRepository, NewEvent, StoredEvent};
use ledgerline_core::stream::StreamId;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::domain::aggregates::Account;
use crate::domain::commands::{
    AccountCommand, AccountCommandEnvelope, DepositFunds, OpenAccount, WithdrawFunds,
};
use crate::domain::events::AccountEvent;
use crate::domain::upcasters::account_upcasters;

/// Result of a successfully handled command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// The account stream the command was applied to.
    pub stream_id: StreamId,
    /// Stream version after the append.
    pub new_version: i64,
    /// The events persisted by the command.
    pub events: Vec<StoredEvent>,
}

/// What a handler does when its append loses an optimistic concurrency race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Return the `ConcurrencyConflict` to the caller.
    #[default]
    Surface,
    /// Reload and re-decide, making at most `max_attempts` append attempts
    /// in total.
    Retry {
        /// Total attempts, including the first.
        max_attempts: u32,
    },
}

impl ConflictPolicy {
    /// Builds a policy from an attempt budget; `1` or less surfaces conflicts.
    #[must_use]
    pub fn from_max_attempts(max_attempts: u32) -> Self {
        if max_attempts <= 1 {
            Self::Surface
        } else {
            Self::Retry { max_attempts }
        }
    }

    fn max_attempts(self) -> u32 {
        match self {
            Self::Surface => 1,
            Self::Retry { max_attempts } => max_attempts.max(1),
        }
    }
}

/// Replays a stream into an `Account`, upcasting older payloads.
///
/// # Errors
///
/// Returns `DomainError::Replay` if the history cannot be replayed.
pub fn reconstitute(stream_id: &StreamId, stored: &[StoredEvent]) -> Result<Account, DomainError> {
    aggregate::reconstitute(stream_id, stored, &account_upcasters()).map_err(|e| {
        error!(
            stream_id = %e.stream_id,
            position = e.position,
            reason = %e.reason,
            "account history failed to replay"
        );
        DomainError::from(e)
    })
}

async fn execute<F>(
    stream_id: &StreamId,
    require_existing: bool,
    repo: &dyn EventRepository,
    policy: ConflictPolicy,
    decide: F,
) -> Result<CommandOutcome, DomainError>
where
    F: Fn(&Account) -> Result<Vec<AccountEvent>, DomainError> + Send + Sync,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        let existing = repo.load_events(stream_id).await?;
        if require_existing && existing.is_empty() {
            return Err(DomainError::AggregateNotFound(stream_id.clone()));
        }
        let account = reconstitute(stream_id, &existing)?;

        let new_events = decide(&account)?
            .iter()
            .map(NewEvent::from_domain_event)
            .collect::<Result<Vec<_>, _>>()?;

        match repo
            .append_events(stream_id, account.version(), &new_events)
            .await
        {
            Ok(committed) => {
                return Ok(CommandOutcome {
                    stream_id: stream_id.clone(),
                    new_version: committed.new_version,
                    events: committed.events,
                });
            }
            Err(err) if err.is_conflict() && attempt < max_attempts => {
                warn!(
                    stream_id = %stream_id,
                    attempt,
                    max_attempts,
                    error = %err,
                    "append lost a concurrency race, retrying"
                );
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Handles the `OpenAccount` command. A missing account ID is generated.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the stream already holds an open
/// account or the owner is blank, and any store error otherwise.
#[instrument(
    skip(clock, repo),
    fields(command_type = command.command_type(), correlation_id = %command.correlation_id)
)]
pub async fn handle_open_account(
    command: &OpenAccount,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    policy: ConflictPolicy,
) -> Result<CommandOutcome, DomainError> {
    let account_id = command
        .account_id
        .clone()
        .unwrap_or_else(StreamId::generate);
    execute(&account_id, false, repo, policy, |account| {
        account.open(
            account_id.clone(),
            &command.owner,
            command.correlation_id,
            clock,
        )
    })
    .await
}

/// Handles the `DepositFunds` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an empty stream,
/// `DomainError::Validation` for a non-positive amount, and any store or
/// replay error otherwise.
#[instrument(
    skip(clock, repo),
    fields(command_type = command.command_type(), account_id = %command.account_id)
)]
pub async fn handle_deposit_funds(
    command: &DepositFunds,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    policy: ConflictPolicy,
) -> Result<CommandOutcome, DomainError> {
    execute(&command.account_id, true, repo, policy, |account| {
        account.deposit(command.amount, command.correlation_id, clock)
    })
    .await
}

/// Handles the `WithdrawFunds` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an empty stream,
/// `DomainError::Validation` for a non-positive amount or insufficient
/// funds, and any store or replay error otherwise.
#[instrument(
    skip(clock, repo),
    fields(command_type = command.command_type(), account_id = %command.account_id)
)]
pub async fn handle_withdraw_funds(
    command: &WithdrawFunds,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    policy: ConflictPolicy,
) -> Result<CommandOutcome, DomainError> {
    execute(&command.account_id, true, repo, policy, |account| {
        account.withdraw(command.amount, command.correlation_id, clock)
    })
    .await
}

/// Addresses a named command and routes it to its handler.
///
/// `Open` accepts a missing account ID; deposits and withdrawals need one.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a deposit or withdrawal without an
/// account ID, and whatever the routed handler returns otherwise.
pub async fn submit(
    account_id: Option<StreamId>,
    command: AccountCommand,
    correlation_id: Uuid,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    policy: ConflictPolicy,
) -> Result<CommandOutcome, DomainError> {
    let envelope = match (account_id, command) {
        (account_id, AccountCommand::Open { owner }) => {
            AccountCommandEnvelope::Open(OpenAccount {
                correlation_id,
                account_id,
                owner,
            })
        }
        (Some(account_id), command) => command.into_command(account_id, correlation_id),
        (None, _) => {
            return Err(DomainError::Validation(
                "deposits and withdrawals need an account id".into(),
            ));
        }
    };

    match &envelope {
        AccountCommandEnvelope::Open(cmd) => handle_open_account(cmd, clock, repo, policy).await,
        AccountCommandEnvelope::Deposit(cmd) => {
            handle_deposit_funds(cmd, clock, repo, policy).await
        }
        AccountCommandEnvelope::Withdraw(cmd) => {
            handle_withdraw_funds(cmd, clock, repo, policy).await
        }
    }
}
