//! The allocation transaction coordinator — the only public entry point
//! that mutates token allocations.
//!
//! Each call is a short, bounded read-modify-write: read the participant
//! (with its version), re-derive the phase, plan the write, then commit the
//! whole thing atomically through the store. A stale participant version at
//! commit time means another allocation landed in between; the coordinator
//! re-reads and retries a bounded number of times with linear backoff before
//! surfacing `AllocationConflict`.

use crate::error::RoundError;
use crate::ledger;
use crate::phase;
use agora_store::{AllocationCommit, CommittedAllocation, RoundStore, StoreError};
use agora_types::{RoundId, RoundPhase, SubmissionId, Timestamp, UserId};
use std::sync::Arc;
use std::time::Duration;

/// Default number of commit attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Base backoff between attempts; attempt `n` waits `n` times this.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5);

/// Serializes a participant's allocation writes through the version on
/// their ledger entry.
pub struct AllocationCoordinator<S> {
    store: Arc<S>,
    max_attempts: u32,
    backoff: Duration,
}

impl<S: RoundStore> AllocationCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_retry(store, DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }

    pub fn with_retry(store: Arc<S>, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Set the caller's allocation for one submission to an absolute amount.
    ///
    /// Replaces any previous allocation for the pair; zero removes it.
    /// Validation and state errors leave no trace; a conflict is retried
    /// internally and only surfaced after the attempt budget is exhausted,
    /// at which point the caller should re-read and decide whether to
    /// resubmit.
    pub fn set_allocation(
        &self,
        round_id: RoundId,
        user: UserId,
        submission_id: SubmissionId,
        amount: u64,
        now: Timestamp,
    ) -> Result<CommittedAllocation, RoundError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_set(round_id, user, submission_id, amount, now) {
                Err(RoundError::Store(StoreError::VersionConflict { .. }))
                    if attempt < self.max_attempts =>
                {
                    tracing::debug!(
                        round = %round_id,
                        %user,
                        submission = %submission_id,
                        attempt,
                        "allocation commit conflicted; retrying"
                    );
                    std::thread::sleep(self.backoff * attempt);
                }
                Err(RoundError::Store(StoreError::VersionConflict { .. })) => {
                    return Err(RoundError::AllocationConflict { attempts: attempt });
                }
                other => return other,
            }
        }
    }

    /// One full validate-and-commit pass.
    fn try_set(
        &self,
        round_id: RoundId,
        user: UserId,
        submission_id: SubmissionId,
        amount: u64,
        now: Timestamp,
    ) -> Result<CommittedAllocation, RoundError> {
        let round = self.store.round(round_id).map_err(|e| match e {
            StoreError::NotFound(_) => RoundError::RoundNotFound(round_id),
            other => RoundError::Store(other),
        })?;

        let current_phase = phase::phase_at(&round, now);
        if current_phase != RoundPhase::VotingOpen {
            return Err(RoundError::VotingNotOpen(current_phase));
        }
        if round.tokens_distributed_at.is_none() {
            return Err(RoundError::NotDistributed(round_id));
        }

        let submission = self.store.submission(submission_id).map_err(|e| match e {
            StoreError::NotFound(_) => RoundError::SubmissionNotFound(submission_id),
            other => RoundError::Store(other),
        })?;
        if submission.round_id != round_id {
            return Err(RoundError::SubmissionNotInRound {
                submission: submission_id,
                round: round_id,
            });
        }

        let participant = self.store.participant(round_id, user).map_err(|e| match e {
            StoreError::NotFound(_) => RoundError::NotParticipating {
                user,
                round: round_id,
            },
            other => RoundError::Store(other),
        })?;

        let previous = self
            .store
            .allocation(round_id, user, submission_id)?
            .map(|a| a.amount)
            .unwrap_or(0);
        let plan = ledger::plan_allocation(&round, &participant, previous, amount)?;

        let committed = self.store.commit_allocation(&AllocationCommit {
            round_id,
            user_id: user,
            submission_id,
            amount: plan.amount,
            expected_version: participant.version,
            new_tokens_remaining: plan.new_tokens_remaining,
        })?;

        tracing::debug!(
            round = %round_id,
            %user,
            submission = %submission_id,
            amount,
            previous,
            tokens_remaining = committed.tokens_remaining,
            "allocation committed"
        );
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::distribute;
    use agora_store::MemoryStore;
    use agora_types::{FundingRound, GroupId, Participant, Submission};

    const VOTING: Timestamp = Timestamp::new(350);

    fn voting_round(total: u64, min: u64, max: u64) -> FundingRound {
        FundingRound::new(RoundId::new(1), GroupId::new(1), "Grants", total)
            .with_schedule(
                Timestamp::new(100),
                Some(Timestamp::new(200)),
                Some(Timestamp::new(300)),
                Some(Timestamp::new(400)),
            )
            .with_allocation_bounds(min, max)
    }

    fn setup(total: u64, min: u64, max: u64) -> (AllocationCoordinator<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.put_round(&voting_round(total, min, max)).unwrap();
        for submission in [50, 51] {
            store
                .put_submission(&Submission::new(
                    SubmissionId::new(submission),
                    RoundId::new(1),
                ))
                .unwrap();
        }
        distribute(
            store.as_ref(),
            RoundId::new(1),
            &[UserId::new(7)],
            Timestamp::new(300),
        )
        .unwrap();
        (AllocationCoordinator::new(store.clone()), store)
    }

    #[test]
    fn allocate_then_rebalance_across_submissions() {
        // The documented walk-through: 100 tokens, max 50 per submission.
        let (coordinator, store) = setup(100, 0, 50);
        let user = UserId::new(7);
        let a = SubmissionId::new(50);
        let b = SubmissionId::new(51);

        let committed = coordinator
            .set_allocation(RoundId::new(1), user, a, 40, VOTING)
            .unwrap();
        assert_eq!(committed.tokens_remaining, 60);

        // 70 breaks the per-allocation cap before the budget is consulted.
        let err = coordinator
            .set_allocation(RoundId::new(1), user, b, 70, VOTING)
            .unwrap_err();
        assert!(matches!(err, RoundError::AboveMaximum { amount: 70, max: 50 }));

        // Shrink A to 30, freeing 10.
        let committed = coordinator
            .set_allocation(RoundId::new(1), user, a, 30, VOTING)
            .unwrap();
        assert_eq!(committed.tokens_remaining, 70);
        assert_eq!(committed.submission_total, 30);

        // Now B = 50 fits (the cap limits 70).
        let committed = coordinator
            .set_allocation(RoundId::new(1), user, b, 50, VOTING)
            .unwrap();
        assert_eq!(committed.tokens_remaining, 20);
        assert_eq!(committed.submission_total, 50);

        assert_eq!(store.submission(a).unwrap().tokens_allocated_to, 30);
        assert_eq!(store.submission(b).unwrap().tokens_allocated_to, 50);
    }

    #[test]
    fn budget_rejection_has_no_side_effects() {
        let (coordinator, store) = setup(100, 0, 0);
        let user = UserId::new(7);
        let a = SubmissionId::new(50);
        let b = SubmissionId::new(51);

        coordinator
            .set_allocation(RoundId::new(1), user, a, 40, VOTING)
            .unwrap();
        let err = coordinator
            .set_allocation(RoundId::new(1), user, b, 70, VOTING)
            .unwrap_err();
        assert!(matches!(
            err,
            RoundError::InsufficientTokens {
                requested: 70,
                available: 60
            }
        ));

        let participant = store.participant(RoundId::new(1), user).unwrap();
        assert_eq!(participant.tokens_remaining, 60);
        assert_eq!(store.submission(b).unwrap().tokens_allocated_to, 0);

        // The walk-through's recovery: shrink A to 30, then B = 70 lands.
        coordinator
            .set_allocation(RoundId::new(1), user, a, 30, VOTING)
            .unwrap();
        let committed = coordinator
            .set_allocation(RoundId::new(1), user, b, 70, VOTING)
            .unwrap();
        assert_eq!(committed.tokens_remaining, 0);
        assert_eq!(store.submission(a).unwrap().tokens_allocated_to, 30);
        assert_eq!(store.submission(b).unwrap().tokens_allocated_to, 70);
    }

    #[test]
    fn rejects_outside_voting_phase() {
        let (coordinator, _) = setup(100, 0, 0);
        let user = UserId::new(7);
        let a = SubmissionId::new(50);

        for (now, expected) in [
            (Timestamp::new(150), RoundPhase::Distributed),
            (Timestamp::new(250), RoundPhase::Distributed),
            (Timestamp::new(450), RoundPhase::Distributed),
        ] {
            let err = coordinator
                .set_allocation(RoundId::new(1), user, a, 10, now)
                .unwrap_err();
            match err {
                RoundError::VotingNotOpen(phase) => assert_eq!(phase, expected),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn undistributed_round_rejects_allocations() {
        let store = Arc::new(MemoryStore::new());
        store.put_round(&voting_round(100, 0, 0)).unwrap();
        store
            .put_submission(&Submission::new(SubmissionId::new(50), RoundId::new(1)))
            .unwrap();
        let coordinator = AllocationCoordinator::new(store);

        let err = coordinator
            .set_allocation(
                RoundId::new(1),
                UserId::new(7),
                SubmissionId::new(50),
                10,
                VOTING,
            )
            .unwrap_err();
        // No grant yet — the user cannot be a participant.
        assert!(matches!(err, RoundError::NotParticipating { .. }));
    }

    #[test]
    fn non_participant_is_rejected() {
        let (coordinator, _) = setup(100, 0, 0);
        let err = coordinator
            .set_allocation(
                RoundId::new(1),
                UserId::new(99),
                SubmissionId::new(50),
                10,
                VOTING,
            )
            .unwrap_err();
        assert!(matches!(err, RoundError::NotParticipating { .. }));
    }

    #[test]
    fn foreign_submission_is_rejected() {
        let (coordinator, store) = setup(100, 0, 0);
        store
            .put_round(&FundingRound::new(
                RoundId::new(2),
                GroupId::new(1),
                "Other",
                100,
            ))
            .unwrap();
        store
            .put_submission(&Submission::new(SubmissionId::new(60), RoundId::new(2)))
            .unwrap();

        let err = coordinator
            .set_allocation(
                RoundId::new(1),
                UserId::new(7),
                SubmissionId::new(60),
                10,
                VOTING,
            )
            .unwrap_err();
        assert!(matches!(err, RoundError::SubmissionNotInRound { .. }));
    }

    /// A store that reports a version conflict on the first N allocation
    /// commits, then behaves normally.
    struct ConflictingStore {
        inner: Arc<MemoryStore>,
        conflicts_left: std::sync::atomic::AtomicU32,
    }

    impl ConflictingStore {
        fn new(inner: Arc<MemoryStore>, conflicts: u32) -> Self {
            Self {
                inner,
                conflicts_left: std::sync::atomic::AtomicU32::new(conflicts),
            }
        }
    }

    impl RoundStore for ConflictingStore {
        fn put_round(&self, round: &agora_types::FundingRound) -> Result<(), StoreError> {
            self.inner.put_round(round)
        }
        fn round(&self, id: RoundId) -> Result<agora_types::FundingRound, StoreError> {
            self.inner.round(id)
        }
        fn put_submission(&self, submission: &Submission) -> Result<(), StoreError> {
            self.inner.put_submission(submission)
        }
        fn submission(&self, id: SubmissionId) -> Result<Submission, StoreError> {
            self.inner.submission(id)
        }
        fn participant(&self, round: RoundId, user: UserId) -> Result<Participant, StoreError> {
            self.inner.participant(round, user)
        }
        fn participants_for_round(&self, id: RoundId) -> Result<Vec<Participant>, StoreError> {
            self.inner.participants_for_round(id)
        }
        fn allocation(
            &self,
            round: RoundId,
            user: UserId,
            submission: SubmissionId,
        ) -> Result<Option<agora_types::TokenAllocation>, StoreError> {
            self.inner.allocation(round, user, submission)
        }
        fn allocations_for_participant(
            &self,
            round: RoundId,
            user: UserId,
        ) -> Result<Vec<agora_types::TokenAllocation>, StoreError> {
            self.inner.allocations_for_participant(round, user)
        }
        fn allocations_for_submission(
            &self,
            id: SubmissionId,
        ) -> Result<Vec<agora_types::TokenAllocation>, StoreError> {
            self.inner.allocations_for_submission(id)
        }
        fn commit_distribution(
            &self,
            round: RoundId,
            grants: &[Participant],
            at: Timestamp,
        ) -> Result<(), StoreError> {
            self.inner.commit_distribution(round, grants, at)
        }
        fn commit_allocation(
            &self,
            commit: &AllocationCommit,
        ) -> Result<CommittedAllocation, StoreError> {
            use std::sync::atomic::Ordering;
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::VersionConflict {
                    entity: "participant".into(),
                    expected: commit.expected_version,
                    found: commit.expected_version + 1,
                });
            }
            self.inner.commit_allocation(commit)
        }
    }

    fn conflicting_setup(conflicts: u32) -> AllocationCoordinator<ConflictingStore> {
        let (_, store) = setup(100, 0, 0);
        let conflicting = Arc::new(ConflictingStore::new(store, conflicts));
        AllocationCoordinator::with_retry(conflicting, 3, Duration::from_millis(1))
    }

    #[test]
    fn transient_conflict_is_retried_to_success() {
        let coordinator = conflicting_setup(2);
        let committed = coordinator
            .set_allocation(
                RoundId::new(1),
                UserId::new(7),
                SubmissionId::new(50),
                20,
                VOTING,
            )
            .unwrap();
        assert_eq!(committed.tokens_remaining, 80);
    }

    #[test]
    fn exhausted_retries_surface_allocation_conflict() {
        let coordinator = conflicting_setup(u32::MAX);
        let err = coordinator
            .set_allocation(
                RoundId::new(1),
                UserId::new(7),
                SubmissionId::new(50),
                20,
                VOTING,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RoundError::AllocationConflict { attempts: 3 }
        ));
    }

    #[test]
    fn concurrent_allocations_never_overspend() {
        use std::thread;

        let (coordinator, store) = setup(100, 0, 0);
        let coordinator = Arc::new(coordinator);
        let user = UserId::new(7);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let coordinator = Arc::clone(&coordinator);
                let submission = SubmissionId::new(50 + (i % 2));
                thread::spawn(move || {
                    coordinator.set_allocation(RoundId::new(1), user, submission, 30, VOTING)
                })
            })
            .collect();
        for handle in handles {
            // Individual attempts may lose the budget race; the invariant
            // check below is the real assertion.
            let _ = handle.join().unwrap();
        }

        let participant = store.participant(RoundId::new(1), user).unwrap();
        let allocated: u64 = store
            .allocations_for_participant(RoundId::new(1), user)
            .unwrap()
            .iter()
            .map(|a| a.amount)
            .sum();
        assert_eq!(allocated + participant.tokens_remaining, 100);

        for submission in [50, 51] {
            let total = store
                .submission(SubmissionId::new(submission))
                .unwrap()
                .tokens_allocated_to;
            let sum: u64 = store
                .allocations_for_submission(SubmissionId::new(submission))
                .unwrap()
                .iter()
                .map(|a| a.amount)
                .sum();
            assert_eq!(total, sum);
        }
    }
}
