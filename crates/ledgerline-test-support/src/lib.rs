//! Shared test mocks and utilities for the Ledgerline engine.

mod clock;
mod repository;

pub use clock::{FixedClock, fixed_now};
pub use repository::{
    ConflictingEventRepository, EmptyEventRepository, FailingEventRepository,
    RecordingEventRepository,
};
