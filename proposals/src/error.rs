use agora_store::StoreError;
use agora_types::{OptionId, ProposalId, ProposalStatus, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("option {0} not found")]
    OptionNotFound(OptionId),

    #[error("option {option} does not belong to proposal {proposal}")]
    OptionMismatch {
        option: OptionId,
        proposal: ProposalId,
    },

    #[error("proposal is not open for voting (status {0:?})")]
    NotOpenForVoting(ProposalStatus),

    #[error("user {user} has already voted on proposal {proposal}; swap the vote instead")]
    AlreadyVoted {
        user: UserId,
        proposal: ProposalId,
    },

    #[error("no vote by user {user} on option {option}")]
    VoteNotFound { user: UserId, option: OptionId },

    #[error("cannot swap a vote for the same option {0}")]
    SameOption(OptionId),

    #[error("proposal {0} has not completed; outcome cannot be resolved")]
    NotCompleted(ProposalId),

    #[error(transparent)]
    Store(#[from] StoreError),
}
