//! Proposal storage trait — proposals, options, and votes.

use crate::StoreError;
use agora_types::{
    OptionId, Proposal, ProposalId, ProposalOption, ProposalOutcome, ProposalStatus, ProposalVote,
    Timestamp, UserId,
};

/// Result of an idempotent vote write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteWrite {
    /// The row was inserted or deleted.
    Applied,
    /// The store already looked like that; nothing happened.
    Unchanged,
}

/// Trait for storing proposal state.
///
/// Votes are keyed by `(user_id, option_id)` and there is never more than
/// one row per key. The compound operations ([`insert_vote`] with an
/// exclusivity scope, [`swap_vote`]) are atomic: no interleaved call may
/// observe or create an intermediate state.
///
/// [`insert_vote`]: ProposalStore::insert_vote
/// [`swap_vote`]: ProposalStore::swap_vote
pub trait ProposalStore: Send + Sync {
    /// Store a proposal (insert or replace).
    fn put_proposal(&self, proposal: &Proposal) -> Result<(), StoreError>;

    /// Get a proposal by id.
    fn proposal(&self, id: ProposalId) -> Result<Proposal, StoreError>;

    /// Refresh the cached status column.
    fn set_cached_status(&self, id: ProposalId, status: ProposalStatus) -> Result<(), StoreError>;

    /// Write the cached outcome column.
    fn set_cached_outcome(&self, id: ProposalId, outcome: ProposalOutcome)
        -> Result<(), StoreError>;

    /// Store an option (insert or replace).
    fn put_option(&self, option: &ProposalOption) -> Result<(), StoreError>;

    /// Get an option by id.
    fn option(&self, id: OptionId) -> Result<ProposalOption, StoreError>;

    /// All options of a proposal.
    fn options_for_proposal(&self, id: ProposalId) -> Result<Vec<ProposalOption>, StoreError>;

    /// Insert a vote. Re-inserting an existing `(user, option)` pair returns
    /// `Unchanged`.
    ///
    /// When `exclusive_within` is given, the insert fails with
    /// [`StoreError::Duplicate`] if the user already holds a vote on any of
    /// the listed options — checked and inserted atomically, so two
    /// concurrent inserts cannot both succeed on a strict proposal.
    fn insert_vote(
        &self,
        vote: &ProposalVote,
        exclusive_within: Option<&[OptionId]>,
    ) -> Result<VoteWrite, StoreError>;

    /// Delete a vote. Absence returns `Unchanged`, not an error.
    fn remove_vote(&self, user: UserId, option: OptionId) -> Result<VoteWrite, StoreError>;

    /// Atomically move a user's vote from `remove` to `add`.
    ///
    /// Fails with [`StoreError::NotFound`] if the `(user, remove)` vote does
    /// not exist at commit time. If the user already voted on `add`, the
    /// insert half is a no-op and the user ends holding exactly that vote.
    fn swap_vote(
        &self,
        user: UserId,
        remove: OptionId,
        add: OptionId,
        cast_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// All votes on a proposal.
    fn votes_for_proposal(&self, id: ProposalId) -> Result<Vec<ProposalVote>, StoreError>;

    /// Number of distinct users holding at least one vote on the proposal.
    fn distinct_voter_count(&self, id: ProposalId) -> Result<u32, StoreError>;
}
