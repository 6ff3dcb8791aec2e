//! The vote ledger — every vote mutation goes through here.
//!
//! All three operations re-derive the proposal status from the time windows
//! before writing, and lean on the store's atomic compound operations so no
//! interleaving can violate the one-vote rule on strict proposals or observe
//! a half-applied swap.

use crate::error::ProposalError;
use crate::status;
use agora_store::{ProposalStore, StoreError, VoteWrite};
use agora_types::{OptionId, Proposal, ProposalId, ProposalOption, ProposalVote, Timestamp, UserId};
use std::sync::Arc;

/// Add, remove, and swap votes on proposal options.
pub struct VoteLedger<S> {
    store: Arc<S>,
}

impl<S: ProposalStore> VoteLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Cast a vote on an option.
    ///
    /// Idempotent: re-adding an existing `(user, option)` vote is a no-op.
    /// On a strict proposal a vote on a *different* option fails with
    /// `AlreadyVoted` — the caller must use [`swap_vote`](Self::swap_vote).
    pub fn add_vote(
        &self,
        user: UserId,
        proposal_id: ProposalId,
        option_id: OptionId,
        now: Timestamp,
    ) -> Result<(), ProposalError> {
        let (proposal, option) = self.option_of(proposal_id, option_id)?;
        let status = status::ensure_open_for_voting(&proposal, now)?;

        let vote = ProposalVote {
            proposal_id,
            option_id,
            user_id: user,
            cast_at: now,
        };
        let write = if proposal.strict {
            let siblings: Vec<OptionId> = self
                .store
                .options_for_proposal(proposal_id)?
                .iter()
                .map(|o| o.id)
                .collect();
            self.store
                .insert_vote(&vote, Some(&siblings))
                .map_err(|e| match e {
                    StoreError::Duplicate(_) => ProposalError::AlreadyVoted {
                        user,
                        proposal: proposal_id,
                    },
                    other => ProposalError::Store(other),
                })?
        } else {
            self.store.insert_vote(&vote, None)?
        };

        if write == VoteWrite::Applied {
            tracing::debug!(%user, proposal = %proposal_id, option = %option.id, "vote added");
            self.store.set_cached_status(proposal_id, status)?;
        }
        Ok(())
    }

    /// Withdraw a vote from an option. Absence is not an error.
    pub fn remove_vote(
        &self,
        user: UserId,
        proposal_id: ProposalId,
        option_id: OptionId,
        now: Timestamp,
    ) -> Result<(), ProposalError> {
        let (proposal, _) = self.option_of(proposal_id, option_id)?;
        let status = status::ensure_open_for_voting(&proposal, now)?;

        if self.store.remove_vote(user, option_id)? == VoteWrite::Applied {
            tracing::debug!(%user, proposal = %proposal_id, option = %option_id, "vote removed");
            self.store.set_cached_status(proposal_id, status)?;
        }
        Ok(())
    }

    /// Atomically move a vote from `remove_option_id` to `add_option_id`.
    ///
    /// Fails with `VoteNotFound` if the vote to remove does not exist at
    /// commit time. If the user already holds a vote on the target option,
    /// the add half is a no-op and the user ends with exactly that vote.
    pub fn swap_vote(
        &self,
        user: UserId,
        proposal_id: ProposalId,
        add_option_id: OptionId,
        remove_option_id: OptionId,
        now: Timestamp,
    ) -> Result<(), ProposalError> {
        if add_option_id == remove_option_id {
            return Err(ProposalError::SameOption(add_option_id));
        }
        let (proposal, _) = self.option_of(proposal_id, add_option_id)?;
        self.option_of(proposal_id, remove_option_id)?;
        let status = status::ensure_open_for_voting(&proposal, now)?;

        self.store
            .swap_vote(user, remove_option_id, add_option_id, now)
            .map_err(|e| match e {
                StoreError::NotFound(_) => ProposalError::VoteNotFound {
                    user,
                    option: remove_option_id,
                },
                other => ProposalError::Store(other),
            })?;
        tracing::debug!(
            %user,
            proposal = %proposal_id,
            from = %remove_option_id,
            to = %add_option_id,
            "vote swapped"
        );
        self.store.set_cached_status(proposal_id, status)?;
        Ok(())
    }

    /// Look up an option and its proposal, verifying ownership.
    fn option_of(
        &self,
        proposal_id: ProposalId,
        option_id: OptionId,
    ) -> Result<(Proposal, ProposalOption), ProposalError> {
        let option = self.store.option(option_id).map_err(|e| match e {
            StoreError::NotFound(_) => ProposalError::OptionNotFound(option_id),
            other => ProposalError::Store(other),
        })?;
        if option.proposal_id != proposal_id {
            return Err(ProposalError::OptionMismatch {
                option: option_id,
                proposal: proposal_id,
            });
        }
        let proposal = self
            .store
            .proposal(proposal_id)
            .map_err(|e| status::not_found(e, proposal_id))?;
        Ok((proposal, option))
    }
}
