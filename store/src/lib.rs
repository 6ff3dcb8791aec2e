//! Storage layer for the agora engine.
//!
//! Domain logic talks to storage through two typed repository traits:
//! [`ProposalStore`] for proposals, options and votes, and [`RoundStore`]
//! for funding rounds, participants, submissions and token allocations.
//! Multi-row mutations that must be atomic (vote swap, token distribution,
//! allocation commit) are single trait methods, so an implementation can
//! wrap them in one transaction.
//!
//! [`MemoryStore`] is the bundled implementation: thread-safe, with
//! optimistic per-participant versioning and whole-store snapshots.

pub mod error;
pub mod memory;
pub mod proposal;
pub mod round;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use proposal::{ProposalStore, VoteWrite};
pub use round::{AllocationCommit, CommittedAllocation, RoundStore};
