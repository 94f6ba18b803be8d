//! Ledgerline — HTTP API over the account event streams.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
