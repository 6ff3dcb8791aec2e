//! Funding round records — participatory budgeting state.

use crate::id::{GroupId, RoundId, SubmissionId, UserId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// The current stage of a funding round's lifecycle.
///
/// Derived from the round's window timestamps and the distribution flag;
/// never persisted as the source of truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Submissions have not opened (or no schedule is configured).
    Draft,
    SubmissionsOpen,
    /// Submissions closed, voting not yet open.
    SubmissionsClosed,
    VotingOpen,
    VotingClosed,
    /// Tokens have been distributed and the voting window is not open.
    /// Terminal — timestamp edits cannot move a distributed round back.
    Distributed,
}

/// A time-boxed participatory budgeting process with a fixed token budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRound {
    pub id: RoundId,
    pub group_id: GroupId,
    pub title: String,
    /// Budget granted to each participant at distribution time.
    pub total_tokens: u64,
    /// Smallest non-zero allocation accepted, when configured (> 0).
    pub min_token_allocation: Option<u64>,
    /// Largest allocation accepted, when configured (> 0).
    pub max_token_allocation: Option<u64>,
    pub submissions_open_at: Option<Timestamp>,
    pub submissions_close_at: Option<Timestamp>,
    pub voting_opens_at: Option<Timestamp>,
    pub voting_closes_at: Option<Timestamp>,
    /// Set exactly once, when the budget is granted to participants.
    pub tokens_distributed_at: Option<Timestamp>,
}

impl FundingRound {
    pub fn new(id: RoundId, group_id: GroupId, title: impl Into<String>, total_tokens: u64) -> Self {
        Self {
            id,
            group_id,
            title: title.into(),
            total_tokens,
            min_token_allocation: None,
            max_token_allocation: None,
            submissions_open_at: None,
            submissions_close_at: None,
            voting_opens_at: None,
            voting_closes_at: None,
            tokens_distributed_at: None,
        }
    }

    /// Configure the submission and voting windows.
    pub fn with_schedule(
        mut self,
        submissions_open_at: Timestamp,
        submissions_close_at: Option<Timestamp>,
        voting_opens_at: Option<Timestamp>,
        voting_closes_at: Option<Timestamp>,
    ) -> Self {
        self.submissions_open_at = Some(submissions_open_at);
        self.submissions_close_at = submissions_close_at;
        self.voting_opens_at = voting_opens_at;
        self.voting_closes_at = voting_closes_at;
        self
    }

    /// Configure per-allocation bounds. Zero means unconfigured.
    pub fn with_allocation_bounds(mut self, min: u64, max: u64) -> Self {
        self.min_token_allocation = (min > 0).then_some(min);
        self.max_token_allocation = (max > 0).then_some(max);
        self
    }
}

/// A user's budget within one funding round.
///
/// Created only at distribution time. `version` is the optimistic-concurrency
/// token: every committed allocation bumps it, so a stale read is detected at
/// commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub round_id: RoundId,
    pub user_id: UserId,
    /// Budget at grant time. The sum of this participant's allocation
    /// amounts plus `tokens_remaining` always equals this value.
    pub tokens_granted: u64,
    pub tokens_remaining: u64,
    pub granted_at: Timestamp,
    pub version: u64,
}

impl Participant {
    /// A fresh grant of the round budget.
    pub fn granted(round_id: RoundId, user_id: UserId, tokens: u64, at: Timestamp) -> Self {
        Self {
            round_id,
            user_id,
            tokens_granted: tokens,
            tokens_remaining: tokens,
            granted_at: at,
            version: 0,
        }
    }
}

/// A submission competing for tokens within a funding round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub round_id: RoundId,
    /// Aggregate of all committed allocations referencing this submission.
    pub tokens_allocated_to: u64,
}

impl Submission {
    pub fn new(id: SubmissionId, round_id: RoundId) -> Self {
        Self {
            id,
            round_id,
            tokens_allocated_to: 0,
        }
    }
}

/// The current allocation of one participant to one submission.
///
/// A *set*, not a delta history; an amount of zero removes the row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAllocation {
    pub round_id: RoundId,
    pub user_id: UserId,
    pub submission_id: SubmissionId,
    pub amount: u64,
}
