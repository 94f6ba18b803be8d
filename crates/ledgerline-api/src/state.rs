//! Shared application state.

use std::sync::Arc;

use ledgerline_account::application::command_handlers::ConflictPolicy;
use ledgerline_core::clock::Clock;
use ledgerline_core::repository::EventRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock stamped onto new events.
    pub clock: Arc<dyn Clock>,
    /// Event store backing every account stream.
    pub event_repository: Arc<dyn EventRepository>,
    /// What command handlers do when an append loses a race.
    pub conflict_policy: ConflictPolicy,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        event_repository: Arc<dyn EventRepository>,
        conflict_policy: ConflictPolicy,
    ) -> Self {
        Self {
            clock,
            event_repository,
            conflict_policy,
        }
    }
}
