//! Proposal lifecycle for the agora engine.
//!
//! Three pieces, layered on the storage traits:
//! - [`status`] — the single pure time→status resolver, used both to gate
//!   mutations and to refresh the cached status column.
//! - [`votes`] — the vote ledger: idempotent add/remove and the atomic swap,
//!   all gated by the derived status.
//! - [`quorum`] — read-only quorum evaluation, per-option tally, and the
//!   one-time outcome resolution for completed proposals.

pub mod error;
pub mod quorum;
pub mod status;
pub mod votes;

pub use error::ProposalError;
pub use quorum::QuorumStatus;
pub use votes::VoteLedger;
