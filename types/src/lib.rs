//! Fundamental types for the agora engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: identifiers, timestamps, the clock abstraction, and the domain
//! records for proposals and funding rounds together with their state enums.

pub mod id;
pub mod proposal;
pub mod round;
pub mod time;

pub use id::{GroupId, OptionId, ProposalId, RoundId, SubmissionId, UserId};
pub use proposal::{Proposal, ProposalOption, ProposalOutcome, ProposalStatus, ProposalVote};
pub use round::{FundingRound, Participant, RoundPhase, Submission, TokenAllocation};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
