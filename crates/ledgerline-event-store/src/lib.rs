//! Ledgerline event stores.
//!
//! Both backends implement `EventRepository` with the same contract: an
//! append succeeds only when the caller's expected version equals the
//! stream's current version, and a batch is persisted whole or not at all.

pub mod in_memory_event_store;
pub mod pg_event_store;
pub mod schema;
