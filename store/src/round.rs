//! Funding round storage trait — rounds, participants, submissions,
//! allocations.

use crate::StoreError;
use agora_types::{
    FundingRound, Participant, RoundId, Submission, SubmissionId, Timestamp, TokenAllocation,
    UserId,
};

/// One allocation write, validated by the coordinator and applied atomically
/// by the store.
///
/// `expected_version` is the participant version the plan was computed
/// against; the commit fails with [`StoreError::VersionConflict`] if the
/// participant row has moved since.
#[derive(Clone, Debug)]
pub struct AllocationCommit {
    pub round_id: RoundId,
    pub user_id: UserId,
    pub submission_id: SubmissionId,
    /// The new absolute amount for this `(participant, submission)` pair.
    /// Zero removes the allocation row.
    pub amount: u64,
    pub expected_version: u64,
    pub new_tokens_remaining: u64,
}

/// Totals after a committed allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommittedAllocation {
    pub tokens_remaining: u64,
    pub submission_total: u64,
}

/// Trait for storing funding round state.
///
/// [`commit_distribution`] and [`commit_allocation`] are the two compound
/// writes; each is atomic across every row it touches.
///
/// [`commit_distribution`]: RoundStore::commit_distribution
/// [`commit_allocation`]: RoundStore::commit_allocation
pub trait RoundStore: Send + Sync {
    /// Store a round (insert or replace).
    fn put_round(&self, round: &FundingRound) -> Result<(), StoreError>;

    /// Get a round by id.
    fn round(&self, id: RoundId) -> Result<FundingRound, StoreError>;

    /// Store a submission (insert or replace).
    fn put_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Get a submission by id.
    fn submission(&self, id: SubmissionId) -> Result<Submission, StoreError>;

    /// Get a participant's ledger entry.
    fn participant(&self, round: RoundId, user: UserId) -> Result<Participant, StoreError>;

    /// All participants of a round.
    fn participants_for_round(&self, id: RoundId) -> Result<Vec<Participant>, StoreError>;

    /// Current allocation for a `(participant, submission)` pair, if any.
    fn allocation(
        &self,
        round: RoundId,
        user: UserId,
        submission: SubmissionId,
    ) -> Result<Option<TokenAllocation>, StoreError>;

    /// All of a participant's current allocations in a round.
    fn allocations_for_participant(
        &self,
        round: RoundId,
        user: UserId,
    ) -> Result<Vec<TokenAllocation>, StoreError>;

    /// All current allocations referencing a submission.
    fn allocations_for_submission(
        &self,
        id: SubmissionId,
    ) -> Result<Vec<TokenAllocation>, StoreError>;

    /// Atomically set `tokens_distributed_at` and insert the granted
    /// participant rows.
    ///
    /// Fails with [`StoreError::Duplicate`] if the round already has
    /// `tokens_distributed_at` set — the write-once guard holds even under
    /// concurrent calls.
    fn commit_distribution(
        &self,
        round: RoundId,
        grants: &[Participant],
        at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Atomically apply one validated allocation write: update the
    /// participant's `tokens_remaining`, bump its version, upsert or remove
    /// the allocation row, and adjust the submission aggregate by the signed
    /// difference.
    ///
    /// Fails with [`StoreError::VersionConflict`] if the participant version
    /// does not match `expected_version`.
    fn commit_allocation(
        &self,
        commit: &AllocationCommit,
    ) -> Result<CommittedAllocation, StoreError>;
}
