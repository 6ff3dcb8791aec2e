//! Funding rounds for the agora engine.
//!
//! - [`phase`] — the pure phase clock: round schedule + current time +
//!   distribution flag → phase.
//! - [`distribution`] — the explicit one-time token grant.
//! - [`ledger`] — pure allocation planning: bounds and budget math.
//! - [`coordinator`] — the only public entry point that mutates allocations;
//!   validates and commits in one atomic unit with bounded conflict retry.

pub mod coordinator;
pub mod distribution;
pub mod error;
pub mod ledger;
pub mod phase;

pub use coordinator::AllocationCoordinator;
pub use error::RoundError;
pub use ledger::AllocationPlan;
