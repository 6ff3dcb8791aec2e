//! The engine service — wires the ledgers and coordinator over one store.

use crate::error::ApiError;
use crate::handlers::{
    AddVoteRequest, DistributeRequest, DistributeResponse, OutcomeResponse, QuorumStatusRequest,
    QuorumStatusResponse, RemoveVoteRequest, ResolveOutcomeRequest, RoundPhaseRequest,
    RoundPhaseResponse, SetAllocationRequest, SetAllocationResponse, SwapVoteRequest, VoteResponse,
};
use agora_proposals::{quorum, status, VoteLedger};
use agora_rounds::coordinator::AllocationCoordinator;
use agora_rounds::{distribution, phase, RoundError};
use agora_store::{ProposalStore, RoundStore, StoreError};
use agora_types::Clock;
use std::sync::Arc;

/// Transport-agnostic entry point for every exposed operation.
///
/// Holds one store handle for both repositories plus the injected time
/// source; callers construct it once and share it.
pub struct EngineService<S> {
    store: Arc<S>,
    votes: VoteLedger<S>,
    coordinator: AllocationCoordinator<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ProposalStore + RoundStore> EngineService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            votes: VoteLedger::new(store.clone()),
            coordinator: AllocationCoordinator::new(store.clone()),
            store,
            clock,
        }
    }

    /// Replace the default coordinator (e.g. to tune the retry budget).
    pub fn with_coordinator(mut self, coordinator: AllocationCoordinator<S>) -> Self {
        self.coordinator = coordinator;
        self
    }

    // ── Proposal votes ───────────────────────────────────────────────────

    pub fn add_proposal_vote(&self, req: &AddVoteRequest) -> Result<VoteResponse, ApiError> {
        let now = self.clock.now();
        self.votes
            .add_vote(req.user_id, req.post_id, req.option_id, now)?;
        let proposal = ProposalStore::proposal(self.store.as_ref(), req.post_id)
            .map_err(agora_proposals::ProposalError::from)?;
        Ok(VoteResponse {
            proposal_status: status::derive(&proposal, now),
        })
    }

    pub fn remove_proposal_vote(&self, req: &RemoveVoteRequest) -> Result<VoteResponse, ApiError> {
        let now = self.clock.now();
        self.votes
            .remove_vote(req.user_id, req.post_id, req.option_id, now)?;
        let proposal = ProposalStore::proposal(self.store.as_ref(), req.post_id)
            .map_err(agora_proposals::ProposalError::from)?;
        Ok(VoteResponse {
            proposal_status: status::derive(&proposal, now),
        })
    }

    pub fn swap_proposal_vote(&self, req: &SwapVoteRequest) -> Result<VoteResponse, ApiError> {
        let now = self.clock.now();
        self.votes.swap_vote(
            req.user_id,
            req.post_id,
            req.add_option_id,
            req.remove_option_id,
            now,
        )?;
        let proposal = ProposalStore::proposal(self.store.as_ref(), req.post_id)
            .map_err(agora_proposals::ProposalError::from)?;
        Ok(VoteResponse {
            proposal_status: status::derive(&proposal, now),
        })
    }

    // ── Quorum and outcome ───────────────────────────────────────────────

    pub fn quorum_status(&self, req: &QuorumStatusRequest) -> Result<QuorumStatusResponse, ApiError> {
        let now = self.clock.now();
        // Lazily refresh the cached column while we are here.
        status::refresh(self.store.as_ref(), req.post_id, now)?;
        let quorum = quorum::evaluate(self.store.as_ref(), req.post_id, req.eligible_voters)?;
        Ok(QuorumStatusResponse { quorum })
    }

    pub fn resolve_proposal_outcome(
        &self,
        req: &ResolveOutcomeRequest,
    ) -> Result<OutcomeResponse, ApiError> {
        let now = self.clock.now();
        let outcome = quorum::resolve_outcome(
            self.store.as_ref(),
            req.post_id,
            req.eligible_voters,
            now,
        )?;
        Ok(OutcomeResponse { outcome })
    }

    // ── Token allocation ─────────────────────────────────────────────────

    pub fn set_token_allocation(
        &self,
        req: &SetAllocationRequest,
    ) -> Result<SetAllocationResponse, ApiError> {
        let now = self.clock.now();
        let committed = self
            .coordinator
            .set_allocation(
                req.funding_round_id,
                req.user_id,
                req.submission_id,
                req.tokens,
                now,
            )
            .map_err(|e| {
                if matches!(e, RoundError::AllocationConflict { .. }) {
                    tracing::warn!(
                        round = %req.funding_round_id,
                        user = %req.user_id,
                        "allocation conflict survived the retry budget"
                    );
                }
                e
            })?;
        Ok(SetAllocationResponse {
            tokens_remaining: committed.tokens_remaining,
            submission_tokens_allocated_to: committed.submission_total,
        })
    }

    // ── Round phase and distribution ─────────────────────────────────────

    pub fn funding_round_phase(
        &self,
        req: &RoundPhaseRequest,
    ) -> Result<RoundPhaseResponse, ApiError> {
        let now = self.clock.now();
        let round = RoundStore::round(self.store.as_ref(), req.funding_round_id).map_err(
            |e| match e {
                StoreError::NotFound(_) => {
                    ApiError::Round(RoundError::RoundNotFound(req.funding_round_id))
                }
                other => ApiError::Round(RoundError::Store(other)),
            },
        )?;
        let phase = phase::phase_at(&round, now);

        let tokens_remaining = match req.user_id {
            Some(user) => {
                match RoundStore::participant(self.store.as_ref(), req.funding_round_id, user) {
                    Ok(participant) => Some(participant.tokens_remaining),
                    Err(StoreError::NotFound(_)) => None,
                    Err(other) => return Err(ApiError::Round(RoundError::Store(other))),
                }
            }
            None => None,
        };

        Ok(RoundPhaseResponse {
            phase,
            tokens_remaining,
        })
    }

    pub fn distribute_tokens(&self, req: &DistributeRequest) -> Result<DistributeResponse, ApiError> {
        let now = self.clock.now();
        let participants_granted = distribution::distribute(
            self.store.as_ref(),
            req.funding_round_id,
            &req.participant_ids,
            now,
        )?;
        Ok(DistributeResponse {
            participants_granted,
        })
    }
}
