//! In-memory store — the bundled [`ProposalStore`] / [`RoundStore`]
//! implementation.
//!
//! All state lives behind a single mutex, which makes every trait method —
//! including the compound commits — atomic with respect to every other.
//! Optimistic concurrency across calls is provided by the participant
//! version checked in [`RoundStore::commit_allocation`].
//!
//! The whole store can be serialized to bytes and restored, so a host
//! process can persist state across restarts without this crate taking a
//! dependency on any storage backend.

use crate::proposal::{ProposalStore, VoteWrite};
use crate::round::{AllocationCommit, CommittedAllocation, RoundStore};
use crate::StoreError;
use agora_types::{
    FundingRound, OptionId, Participant, Proposal, ProposalId, ProposalOption, ProposalOutcome,
    ProposalStatus, ProposalVote, RoundId, Submission, SubmissionId, Timestamp, TokenAllocation,
    UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default, Serialize, Deserialize)]
struct Inner {
    proposals: HashMap<ProposalId, Proposal>,
    options: HashMap<OptionId, ProposalOption>,
    votes: HashMap<(UserId, OptionId), ProposalVote>,
    rounds: HashMap<RoundId, FundingRound>,
    submissions: HashMap<SubmissionId, Submission>,
    participants: HashMap<(RoundId, UserId), Participant>,
    allocations: HashMap<(RoundId, UserId, SubmissionId), TokenAllocation>,
}

/// Thread-safe in-memory storage.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Serialize the entire store to bytes.
    pub fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let inner = self.lock()?;
        bincode::serialize(&*inner).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Restore a store from [`snapshot`](MemoryStore::snapshot) bytes.
    pub fn restore(bytes: &[u8]) -> Result<Self, StoreError> {
        let inner: Inner =
            bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore for MemoryStore {
    fn put_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        self.lock()?.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    fn proposal(&self, id: ProposalId) -> Result<Proposal, StoreError> {
        self.lock()?
            .proposals
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))
    }

    fn set_cached_status(&self, id: ProposalId, status: ProposalStatus) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let proposal = inner
            .proposals
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))?;
        proposal.cached_status = status;
        Ok(())
    }

    fn set_cached_outcome(
        &self,
        id: ProposalId,
        outcome: ProposalOutcome,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let proposal = inner
            .proposals
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))?;
        proposal.cached_outcome = outcome;
        Ok(())
    }

    fn put_option(&self, option: &ProposalOption) -> Result<(), StoreError> {
        self.lock()?.options.insert(option.id, option.clone());
        Ok(())
    }

    fn option(&self, id: OptionId) -> Result<ProposalOption, StoreError> {
        self.lock()?
            .options
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("option {id}")))
    }

    fn options_for_proposal(&self, id: ProposalId) -> Result<Vec<ProposalOption>, StoreError> {
        let inner = self.lock()?;
        let mut options: Vec<ProposalOption> = inner
            .options
            .values()
            .filter(|o| o.proposal_id == id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.id);
        Ok(options)
    }

    fn insert_vote(
        &self,
        vote: &ProposalVote,
        exclusive_within: Option<&[OptionId]>,
    ) -> Result<VoteWrite, StoreError> {
        let mut inner = self.lock()?;
        if inner.votes.contains_key(&(vote.user_id, vote.option_id)) {
            return Ok(VoteWrite::Unchanged);
        }
        if let Some(scope) = exclusive_within {
            for option in scope {
                if *option != vote.option_id
                    && inner.votes.contains_key(&(vote.user_id, *option))
                {
                    return Err(StoreError::Duplicate(format!(
                        "user {} already voted on option {option} of proposal {}",
                        vote.user_id, vote.proposal_id
                    )));
                }
            }
        }
        inner
            .votes
            .insert((vote.user_id, vote.option_id), vote.clone());
        Ok(VoteWrite::Applied)
    }

    fn remove_vote(&self, user: UserId, option: OptionId) -> Result<VoteWrite, StoreError> {
        match self.lock()?.votes.remove(&(user, option)) {
            Some(_) => Ok(VoteWrite::Applied),
            None => Ok(VoteWrite::Unchanged),
        }
    }

    fn swap_vote(
        &self,
        user: UserId,
        remove: OptionId,
        add: OptionId,
        cast_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let add_option = inner
            .options
            .get(&add)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("option {add}")))?;
        inner
            .votes
            .remove(&(user, remove))
            .ok_or_else(|| StoreError::NotFound(format!("vote ({user}, {remove})")))?;
        inner.votes.entry((user, add)).or_insert(ProposalVote {
            proposal_id: add_option.proposal_id,
            option_id: add,
            user_id: user,
            cast_at,
        });
        Ok(())
    }

    fn votes_for_proposal(&self, id: ProposalId) -> Result<Vec<ProposalVote>, StoreError> {
        let inner = self.lock()?;
        let mut votes: Vec<ProposalVote> = inner
            .votes
            .values()
            .filter(|v| v.proposal_id == id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| (v.option_id, v.user_id));
        Ok(votes)
    }

    fn distinct_voter_count(&self, id: ProposalId) -> Result<u32, StoreError> {
        let inner = self.lock()?;
        let voters: HashSet<UserId> = inner
            .votes
            .values()
            .filter(|v| v.proposal_id == id)
            .map(|v| v.user_id)
            .collect();
        Ok(voters.len() as u32)
    }
}

impl RoundStore for MemoryStore {
    fn put_round(&self, round: &FundingRound) -> Result<(), StoreError> {
        self.lock()?.rounds.insert(round.id, round.clone());
        Ok(())
    }

    fn round(&self, id: RoundId) -> Result<FundingRound, StoreError> {
        self.lock()?
            .rounds
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("round {id}")))
    }

    fn put_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.lock()?
            .submissions
            .insert(submission.id, submission.clone());
        Ok(())
    }

    fn submission(&self, id: SubmissionId) -> Result<Submission, StoreError> {
        self.lock()?
            .submissions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("submission {id}")))
    }

    fn participant(&self, round: RoundId, user: UserId) -> Result<Participant, StoreError> {
        self.lock()?
            .participants
            .get(&(round, user))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("participant ({round}, {user})")))
    }

    fn participants_for_round(&self, id: RoundId) -> Result<Vec<Participant>, StoreError> {
        let inner = self.lock()?;
        let mut participants: Vec<Participant> = inner
            .participants
            .values()
            .filter(|p| p.round_id == id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.user_id);
        Ok(participants)
    }

    fn allocation(
        &self,
        round: RoundId,
        user: UserId,
        submission: SubmissionId,
    ) -> Result<Option<TokenAllocation>, StoreError> {
        Ok(self.lock()?.allocations.get(&(round, user, submission)).cloned())
    }

    fn allocations_for_participant(
        &self,
        round: RoundId,
        user: UserId,
    ) -> Result<Vec<TokenAllocation>, StoreError> {
        let inner = self.lock()?;
        let mut allocations: Vec<TokenAllocation> = inner
            .allocations
            .values()
            .filter(|a| a.round_id == round && a.user_id == user)
            .cloned()
            .collect();
        allocations.sort_by_key(|a| a.submission_id);
        Ok(allocations)
    }

    fn allocations_for_submission(
        &self,
        id: SubmissionId,
    ) -> Result<Vec<TokenAllocation>, StoreError> {
        let inner = self.lock()?;
        let mut allocations: Vec<TokenAllocation> = inner
            .allocations
            .values()
            .filter(|a| a.submission_id == id)
            .cloned()
            .collect();
        allocations.sort_by_key(|a| (a.user_id, a.submission_id));
        Ok(allocations)
    }

    fn commit_distribution(
        &self,
        round: RoundId,
        grants: &[Participant],
        at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let round_row = inner
            .rounds
            .get(&round)
            .ok_or_else(|| StoreError::NotFound(format!("round {round}")))?;
        if round_row.tokens_distributed_at.is_some() {
            return Err(StoreError::Duplicate(format!(
                "round {round} tokens already distributed"
            )));
        }
        for grant in grants {
            if inner.participants.contains_key(&(round, grant.user_id)) {
                return Err(StoreError::Duplicate(format!(
                    "participant ({round}, {})",
                    grant.user_id
                )));
            }
        }
        // All checks passed; apply the whole grant as one unit.
        for grant in grants {
            inner
                .participants
                .insert((round, grant.user_id), grant.clone());
        }
        if let Some(round_row) = inner.rounds.get_mut(&round) {
            round_row.tokens_distributed_at = Some(at);
        }
        Ok(())
    }

    fn commit_allocation(
        &self,
        commit: &AllocationCommit,
    ) -> Result<CommittedAllocation, StoreError> {
        let mut inner = self.lock()?;
        let key = (commit.round_id, commit.user_id, commit.submission_id);

        let participant = inner
            .participants
            .get(&(commit.round_id, commit.user_id))
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "participant ({}, {})",
                    commit.round_id, commit.user_id
                ))
            })?;
        if participant.version != commit.expected_version {
            return Err(StoreError::VersionConflict {
                entity: format!("participant ({}, {})", commit.round_id, commit.user_id),
                expected: commit.expected_version,
                found: participant.version,
            });
        }

        let previous = inner.allocations.get(&key).map(|a| a.amount).unwrap_or(0);
        let submission = inner
            .submissions
            .get(&commit.submission_id)
            .ok_or_else(|| StoreError::NotFound(format!("submission {}", commit.submission_id)))?;
        let submission_total = submission
            .tokens_allocated_to
            .checked_sub(previous)
            .and_then(|t| t.checked_add(commit.amount))
            .ok_or_else(|| {
                StoreError::Backend(format!(
                    "submission {} aggregate out of sync",
                    commit.submission_id
                ))
            })?;

        // Point of no return — apply all three row updates together.
        if let Some(participant) = inner
            .participants
            .get_mut(&(commit.round_id, commit.user_id))
        {
            participant.tokens_remaining = commit.new_tokens_remaining;
            participant.version += 1;
        }
        if commit.amount == 0 {
            inner.allocations.remove(&key);
        } else {
            inner.allocations.insert(
                key,
                TokenAllocation {
                    round_id: commit.round_id,
                    user_id: commit.user_id,
                    submission_id: commit.submission_id,
                    amount: commit.amount,
                },
            );
        }
        if let Some(submission) = inner.submissions.get_mut(&commit.submission_id) {
            submission.tokens_allocated_to = submission_total;
        }

        Ok(CommittedAllocation {
            tokens_remaining: commit.new_tokens_remaining,
            submission_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::GroupId;

    fn seed_proposal(store: &MemoryStore, id: u64, options: &[u64]) -> ProposalId {
        let proposal_id = ProposalId::new(id);
        let proposal = Proposal::casual(proposal_id, GroupId::new(1));
        store.put_proposal(&proposal).unwrap();
        for &option in options {
            store
                .put_option(&ProposalOption::new(
                    OptionId::new(option),
                    proposal_id,
                    format!("option {option}"),
                ))
                .unwrap();
        }
        proposal_id
    }

    fn vote(proposal: ProposalId, user: u64, option: u64) -> ProposalVote {
        ProposalVote {
            proposal_id: proposal,
            option_id: OptionId::new(option),
            user_id: UserId::new(user),
            cast_at: Timestamp::new(100),
        }
    }

    #[test]
    fn insert_vote_is_idempotent() {
        let store = MemoryStore::new();
        let proposal = seed_proposal(&store, 1, &[10, 11]);

        let first = store.insert_vote(&vote(proposal, 7, 10), None).unwrap();
        let second = store.insert_vote(&vote(proposal, 7, 10), None).unwrap();
        assert_eq!(first, VoteWrite::Applied);
        assert_eq!(second, VoteWrite::Unchanged);
        assert_eq!(store.votes_for_proposal(proposal).unwrap().len(), 1);
    }

    #[test]
    fn exclusive_insert_rejects_second_option() {
        let store = MemoryStore::new();
        let proposal = seed_proposal(&store, 1, &[10, 11]);
        let scope = [OptionId::new(10), OptionId::new(11)];

        store
            .insert_vote(&vote(proposal, 7, 10), Some(&scope))
            .unwrap();
        let err = store
            .insert_vote(&vote(proposal, 7, 11), Some(&scope))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn swap_vote_moves_exactly_one_row() {
        let store = MemoryStore::new();
        let proposal = seed_proposal(&store, 1, &[10, 11]);

        store.insert_vote(&vote(proposal, 7, 10), None).unwrap();
        store
            .swap_vote(
                UserId::new(7),
                OptionId::new(10),
                OptionId::new(11),
                Timestamp::new(200),
            )
            .unwrap();

        let votes = store.votes_for_proposal(proposal).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].option_id, OptionId::new(11));
    }

    #[test]
    fn swap_vote_without_source_fails() {
        let store = MemoryStore::new();
        seed_proposal(&store, 1, &[10, 11]);

        let err = store
            .swap_vote(
                UserId::new(7),
                OptionId::new(10),
                OptionId::new(11),
                Timestamp::new(200),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    fn seed_round(store: &MemoryStore) -> (RoundId, SubmissionId) {
        let round_id = RoundId::new(1);
        let round = FundingRound::new(round_id, GroupId::new(1), "Grants", 100);
        store.put_round(&round).unwrap();
        let submission_id = SubmissionId::new(50);
        store
            .put_submission(&Submission::new(submission_id, round_id))
            .unwrap();
        (round_id, submission_id)
    }

    #[test]
    fn distribution_is_write_once() {
        let store = MemoryStore::new();
        let (round_id, _) = seed_round(&store);
        let grants = [Participant::granted(
            round_id,
            UserId::new(7),
            100,
            Timestamp::new(500),
        )];

        store
            .commit_distribution(round_id, &grants, Timestamp::new(500))
            .unwrap();
        let err = store
            .commit_distribution(round_id, &grants, Timestamp::new(501))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let round = RoundStore::round(&store, round_id).unwrap();
        assert_eq!(round.tokens_distributed_at, Some(Timestamp::new(500)));
    }

    #[test]
    fn commit_allocation_rejects_stale_version() {
        let store = MemoryStore::new();
        let (round_id, submission_id) = seed_round(&store);
        let user = UserId::new(7);
        store
            .commit_distribution(
                round_id,
                &[Participant::granted(round_id, user, 100, Timestamp::new(500))],
                Timestamp::new(500),
            )
            .unwrap();

        let commit = AllocationCommit {
            round_id,
            user_id: user,
            submission_id,
            amount: 40,
            expected_version: 0,
            new_tokens_remaining: 60,
        };
        store.commit_allocation(&commit).unwrap();

        // Same expected_version again — the first commit bumped it.
        let err = store.commit_allocation(&commit).unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[test]
    fn commit_allocation_updates_all_three_rows() {
        let store = MemoryStore::new();
        let (round_id, submission_id) = seed_round(&store);
        let user = UserId::new(7);
        store
            .commit_distribution(
                round_id,
                &[Participant::granted(round_id, user, 100, Timestamp::new(500))],
                Timestamp::new(500),
            )
            .unwrap();

        let committed = store
            .commit_allocation(&AllocationCommit {
                round_id,
                user_id: user,
                submission_id,
                amount: 40,
                expected_version: 0,
                new_tokens_remaining: 60,
            })
            .unwrap();
        assert_eq!(committed.tokens_remaining, 60);
        assert_eq!(committed.submission_total, 40);

        // Replace with a smaller amount; the aggregate follows the difference.
        let committed = store
            .commit_allocation(&AllocationCommit {
                round_id,
                user_id: user,
                submission_id,
                amount: 10,
                expected_version: 1,
                new_tokens_remaining: 90,
            })
            .unwrap();
        assert_eq!(committed.submission_total, 10);

        // Zero removes the row.
        store
            .commit_allocation(&AllocationCommit {
                round_id,
                user_id: user,
                submission_id,
                amount: 0,
                expected_version: 2,
                new_tokens_remaining: 100,
            })
            .unwrap();
        assert!(store
            .allocation(round_id, user, submission_id)
            .unwrap()
            .is_none());
        assert_eq!(
            store.submission(submission_id).unwrap().tokens_allocated_to,
            0
        );
    }

    #[test]
    fn snapshot_roundtrip_preserves_state() {
        let store = MemoryStore::new();
        let proposal = seed_proposal(&store, 1, &[10]);
        store.insert_vote(&vote(proposal, 7, 10), None).unwrap();
        let (round_id, _) = seed_round(&store);

        let bytes = store.snapshot().unwrap();
        let restored = MemoryStore::restore(&bytes).unwrap();

        assert_eq!(restored.votes_for_proposal(proposal).unwrap().len(), 1);
        assert_eq!(
            RoundStore::round(&restored, round_id).unwrap(),
            RoundStore::round(&store, round_id).unwrap()
        );
    }
}
