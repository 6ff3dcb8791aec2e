//! Proposal status derivation.
//!
//! One pure function derives the status from the voting window and the
//! current time; everything else in the workspace calls it instead of
//! comparing dates inline, so the cached column and the derived value can
//! never drift.

use crate::error::ProposalError;
use agora_store::ProposalStore;
use agora_types::{Proposal, ProposalId, ProposalStatus, Timestamp};

/// Derive the status of a proposal at a given time.
///
/// - no `start_time` → `Casual` (no voting window at all)
/// - before `start_time` → `Discussion`
/// - at/after `end_time` → `Completed`
/// - otherwise → `Voting` (an absent `end_time` never closes)
pub fn derive(proposal: &Proposal, now: Timestamp) -> ProposalStatus {
    let start = match proposal.start_time {
        None => return ProposalStatus::Casual,
        Some(start) => start,
    };
    if now < start {
        return ProposalStatus::Discussion;
    }
    match proposal.end_time {
        Some(end) if now >= end => ProposalStatus::Completed,
        _ => ProposalStatus::Voting,
    }
}

/// Fail with `NotOpenForVoting` unless the derived status accepts votes.
pub fn ensure_open_for_voting(
    proposal: &Proposal,
    now: Timestamp,
) -> Result<ProposalStatus, ProposalError> {
    let status = derive(proposal, now);
    if status.allows_voting() {
        Ok(status)
    } else {
        Err(ProposalError::NotOpenForVoting(status))
    }
}

/// Recompute the status and refresh the cached column.
///
/// The cache exists for indexing and display; time windows stay the source
/// of truth, so this can be called at any moment without changing behavior.
pub fn refresh<S: ProposalStore>(
    store: &S,
    id: ProposalId,
    now: Timestamp,
) -> Result<ProposalStatus, ProposalError> {
    let proposal = store.proposal(id).map_err(|e| not_found(e, id))?;
    let status = derive(&proposal, now);
    if status != proposal.cached_status {
        store.set_cached_status(id, status)?;
    }
    Ok(status)
}

pub(crate) fn not_found(err: agora_store::StoreError, id: ProposalId) -> ProposalError {
    match err {
        agora_store::StoreError::NotFound(_) => ProposalError::ProposalNotFound(id),
        other => ProposalError::Store(other),
    }
}
