//! Ledgerline — bank account bounded context.
//!
//! An account's owner and balance are derived entirely from its event
//! stream. Commands validate against the replayed state and return the
//! events they produce; the application layer commits them under the
//! version it read.

pub mod application;
pub mod domain;
