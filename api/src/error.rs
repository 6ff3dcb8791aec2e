//! API error type and taxonomy.

use agora_proposals::ProposalError;
use agora_rounds::RoundError;
use agora_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of an [`ApiError`], for transports.
///
/// Validation and state errors are permanent for the given request;
/// conflicts are transient — the caller should re-read and may resubmit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    State,
    Conflict,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    Round(#[from] RoundError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::Validation,
            Self::Proposal(e) => match e {
                ProposalError::ProposalNotFound(_)
                | ProposalError::OptionNotFound(_)
                | ProposalError::VoteNotFound { .. } => ErrorKind::NotFound,
                ProposalError::OptionMismatch { .. } | ProposalError::SameOption(_) => {
                    ErrorKind::Validation
                }
                ProposalError::NotOpenForVoting(_)
                | ProposalError::AlreadyVoted { .. }
                | ProposalError::NotCompleted(_) => ErrorKind::State,
                ProposalError::Store(e) => store_kind(e),
            },
            Self::Round(e) => match e {
                RoundError::RoundNotFound(_)
                | RoundError::SubmissionNotFound(_)
                | RoundError::NotParticipating { .. } => ErrorKind::NotFound,
                RoundError::SubmissionNotInRound { .. }
                | RoundError::BelowMinimum { .. }
                | RoundError::AboveMaximum { .. }
                | RoundError::InsufficientTokens { .. }
                | RoundError::Overflow => ErrorKind::Validation,
                RoundError::NoBudget(_)
                | RoundError::NotDistributed(_)
                | RoundError::AlreadyDistributed(_)
                | RoundError::VotingNotOpen(_) => ErrorKind::State,
                RoundError::AllocationConflict { .. } => ErrorKind::Conflict,
                RoundError::Store(e) => store_kind(e),
            },
        }
    }
}

fn store_kind(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::NotFound(_) => ErrorKind::NotFound,
        StoreError::Duplicate(_) | StoreError::VersionConflict { .. } => ErrorKind::Conflict,
        StoreError::Serialization(_) | StoreError::Backend(_) => ErrorKind::Internal,
    }
}
