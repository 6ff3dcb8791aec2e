//! Operation request and response structs.

use agora_proposals::QuorumStatus;
use agora_types::{
    OptionId, ProposalId, ProposalOutcome, ProposalStatus, RoundId, RoundPhase, SubmissionId,
    UserId,
};
use serde::{Deserialize, Serialize};

// ── Proposal votes ───────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct AddVoteRequest {
    pub user_id: UserId,
    pub post_id: ProposalId,
    pub option_id: OptionId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoveVoteRequest {
    pub user_id: UserId,
    pub post_id: ProposalId,
    pub option_id: OptionId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SwapVoteRequest {
    pub user_id: UserId,
    pub post_id: ProposalId,
    pub add_option_id: OptionId,
    pub remove_option_id: OptionId,
}

#[derive(Clone, Debug, Serialize)]
pub struct VoteResponse {
    /// Status derived while handling the mutation.
    pub proposal_status: ProposalStatus,
}

// ── Quorum and outcome ───────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct QuorumStatusRequest {
    pub post_id: ProposalId,
    /// Eligible voter count, derived from group membership by the caller.
    pub eligible_voters: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuorumStatusResponse {
    #[serde(flatten)]
    pub quorum: QuorumStatus,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResolveOutcomeRequest {
    pub post_id: ProposalId,
    pub eligible_voters: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutcomeResponse {
    pub outcome: ProposalOutcome,
}

// ── Token allocation ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct SetAllocationRequest {
    pub user_id: UserId,
    pub funding_round_id: RoundId,
    pub submission_id: SubmissionId,
    pub tokens: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SetAllocationResponse {
    pub tokens_remaining: u64,
    pub submission_tokens_allocated_to: u64,
}

// ── Round phase and distribution ─────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct RoundPhaseRequest {
    pub funding_round_id: RoundId,
    /// When set, the response includes this user's remaining budget.
    pub user_id: Option<UserId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundPhaseResponse {
    pub phase: RoundPhase,
    /// Remaining budget for the requesting participant; absent when the
    /// caller is anonymous or not participating.
    pub tokens_remaining: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DistributeRequest {
    pub funding_round_id: RoundId,
    /// The joined-roster at distribution time, resolved by the caller.
    pub participant_ids: Vec<UserId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DistributeResponse {
    pub participants_granted: u32,
}
