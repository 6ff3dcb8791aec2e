use agora_store::StoreError;
use agora_types::{RoundId, RoundPhase, SubmissionId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("round {0} not found")]
    RoundNotFound(RoundId),

    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),

    #[error("submission {submission} is not part of round {round}")]
    SubmissionNotInRound {
        submission: SubmissionId,
        round: RoundId,
    },

    #[error("user {user} is not participating in round {round}")]
    NotParticipating { user: UserId, round: RoundId },

    #[error("round {0} has no token budget configured")]
    NoBudget(RoundId),

    #[error("tokens for round {0} have not been distributed")]
    NotDistributed(RoundId),

    #[error("tokens for round {0} have already been distributed")]
    AlreadyDistributed(RoundId),

    #[error("voting is not open (phase {0:?})")]
    VotingNotOpen(RoundPhase),

    #[error("allocation of {amount} is below the minimum of {min}")]
    BelowMinimum { amount: u64, min: u64 },

    #[error("allocation of {amount} is above the maximum of {max}")]
    AboveMaximum { amount: u64, max: u64 },

    #[error("not enough tokens remaining: requested {requested}, available {available}")]
    InsufficientTokens { requested: u64, available: u64 },

    #[error("allocation conflicted with concurrent updates after {attempts} attempts")]
    AllocationConflict { attempts: u32 },

    #[error("token arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Store(#[from] StoreError),
}
