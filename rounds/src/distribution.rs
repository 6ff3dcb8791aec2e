//! Token distribution — the explicit, one-time budget grant.

use crate::error::RoundError;
use agora_store::{RoundStore, StoreError};
use agora_types::{Participant, RoundId, Timestamp, UserId};

/// Grant the round's `total_tokens` to every listed participant.
///
/// The participant roster is supplied by the caller — who joined the round
/// and whether they may vote is decided by the surrounding application.
/// Guarded by `tokens_distributed_at`: a second call returns
/// `AlreadyDistributed` without side effects, even when racing the first.
///
/// Returns the number of participants granted.
pub fn distribute<S: RoundStore>(
    store: &S,
    round_id: RoundId,
    users: &[UserId],
    now: Timestamp,
) -> Result<u32, RoundError> {
    let round = store.round(round_id).map_err(|e| match e {
        StoreError::NotFound(_) => RoundError::RoundNotFound(round_id),
        other => RoundError::Store(other),
    })?;
    if round.tokens_distributed_at.is_some() {
        return Err(RoundError::AlreadyDistributed(round_id));
    }
    if round.total_tokens == 0 {
        return Err(RoundError::NoBudget(round_id));
    }

    let grants: Vec<Participant> = users
        .iter()
        .map(|&user| Participant::granted(round_id, user, round.total_tokens, now))
        .collect();

    store
        .commit_distribution(round_id, &grants, now)
        .map_err(|e| match e {
            // Lost the race against a concurrent distribute.
            StoreError::Duplicate(_) => RoundError::AlreadyDistributed(round_id),
            other => RoundError::Store(other),
        })?;

    tracing::info!(
        round = %round_id,
        participants = grants.len(),
        tokens = round.total_tokens,
        "tokens distributed"
    );
    Ok(grants.len() as u32)
}
