//! Quorum evaluation and outcome resolution.
//!
//! Read-only over the vote ledger; the eligible-voter count comes from the
//! caller (group membership is an external fact). Safe to call at any time
//! for progress display — the outcome is only finalized once the proposal
//! has completed.

use crate::error::ProposalError;
use crate::status;
use agora_store::ProposalStore;
use agora_types::{OptionId, ProposalId, ProposalOutcome, ProposalStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// Quorum attainment for one proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumStatus {
    /// Distinct users holding at least one vote.
    pub actual_voters: u32,
    /// Minimum voters required for a decisive outcome.
    pub voters_for_quorum: u32,
    pub quorum_reached: bool,
}

/// `ceil(quorum_percent / 100 × eligible_voters)`, in integer math.
pub fn voters_for_quorum(quorum_percent: u8, eligible_voters: u32) -> u32 {
    let scaled = quorum_percent as u64 * eligible_voters as u64;
    ((scaled + 99) / 100) as u32
}

/// Evaluate quorum attainment against an externally supplied voter count.
pub fn evaluate<S: ProposalStore>(
    store: &S,
    id: ProposalId,
    eligible_voters: u32,
) -> Result<QuorumStatus, ProposalError> {
    let proposal = store.proposal(id).map_err(|e| status::not_found(e, id))?;
    let actual_voters = store.distinct_voter_count(id)?;
    let needed = voters_for_quorum(proposal.quorum_percent, eligible_voters);
    Ok(QuorumStatus {
        actual_voters,
        voters_for_quorum: needed,
        quorum_reached: actual_voters >= needed,
    })
}

/// Vote counts per option, including options nobody voted for.
pub fn tally<S: ProposalStore>(
    store: &S,
    id: ProposalId,
) -> Result<Vec<(OptionId, u32)>, ProposalError> {
    let options = store.options_for_proposal(id)?;
    let votes = store.votes_for_proposal(id)?;
    Ok(options
        .iter()
        .map(|option| {
            let count = votes.iter().filter(|v| v.option_id == option.id).count() as u32;
            (option.id, count)
        })
        .collect())
}

/// Finalize the outcome of a completed proposal.
///
/// Writes the cached outcome exactly once: a proposal whose outcome is
/// already terminal returns it unchanged. Quorum reached resolves to
/// `Decided` carrying the option(s) with the highest vote count (several on
/// a tie); otherwise `NoQuorum`.
pub fn resolve_outcome<S: ProposalStore>(
    store: &S,
    id: ProposalId,
    eligible_voters: u32,
    now: Timestamp,
) -> Result<ProposalOutcome, ProposalError> {
    let proposal = store.proposal(id).map_err(|e| status::not_found(e, id))?;
    if proposal.cached_outcome.is_terminal() {
        return Ok(proposal.cached_outcome);
    }
    if status::derive(&proposal, now) != ProposalStatus::Completed {
        return Err(ProposalError::NotCompleted(id));
    }

    let quorum = evaluate(store, id, eligible_voters)?;
    let outcome = if quorum.quorum_reached {
        let counts = tally(store, id)?;
        let top = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
        let winning_options = counts
            .into_iter()
            .filter(|(_, n)| *n == top && top > 0)
            .map(|(option, _)| option)
            .collect();
        ProposalOutcome::Decided { winning_options }
    } else {
        ProposalOutcome::NoQuorum
    };

    store.set_cached_outcome(id, outcome.clone())?;
    store.set_cached_status(id, ProposalStatus::Completed)?;
    tracing::info!(proposal = %id, ?outcome, "proposal outcome resolved");
    Ok(outcome)
}
