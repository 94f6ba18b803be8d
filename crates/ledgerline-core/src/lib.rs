//! Ledgerline Core — shared event-sourcing abstractions.
//!
//! This crate defines the traits and types every bounded context builds on:
//! immutable events, aggregates rebuilt by replay, the event repository
//! contract with its optimistic-concurrency guard, and payload upcasting.
//! It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
pub mod stream;
pub mod upcast;
