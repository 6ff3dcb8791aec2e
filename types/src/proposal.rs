//! Proposal records and their lifecycle states.

use crate::id::{GroupId, OptionId, ProposalId, UserId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// The time-derived stage of a proposal's lifecycle.
///
/// Always recomputable from `(start_time, end_time, now)`; the copy cached on
/// the proposal row exists only for indexing and display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// No voting window at all — votes may be cast at any time.
    Casual,
    /// The voting window has not opened yet.
    Discussion,
    /// The voting window is open.
    Voting,
    /// The voting window has closed.
    Completed,
}

impl ProposalStatus {
    /// Whether vote mutations are accepted in this status.
    ///
    /// Casual proposals have no window and are permanently open.
    pub fn allows_voting(&self) -> bool {
        matches!(self, Self::Voting | Self::Casual)
    }
}

/// The resolved result of a proposal.
///
/// `InProgress` until the status reaches `Completed`; finalized exactly once
/// after that, using the quorum evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalOutcome {
    /// Voting has not concluded.
    InProgress,
    /// Quorum was reached. Several winners indicate a tie.
    Decided { winning_options: Vec<OptionId> },
    /// The voting window closed without reaching quorum.
    NoQuorum,
}

impl ProposalOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// A decision item a group votes on, with an optional scheduled voting window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub group_id: GroupId,
    /// Strict proposals allow a user at most one vote across all options;
    /// changing it requires a swap.
    pub strict: bool,
    /// Start of the voting window. Absent on casual proposals.
    pub start_time: Option<Timestamp>,
    /// End of the voting window. Absent means voting never closes.
    pub end_time: Option<Timestamp>,
    /// Minimum share of eligible voters required for a decisive outcome,
    /// in whole percent (0–100).
    pub quorum_percent: u8,
    /// Cached copy of the derived status, refreshed lazily.
    pub cached_status: ProposalStatus,
    /// Cached outcome; terminal values are written exactly once.
    pub cached_outcome: ProposalOutcome,
}

impl Proposal {
    /// A proposal with a scheduled voting window.
    pub fn scheduled(
        id: ProposalId,
        group_id: GroupId,
        start_time: Timestamp,
        end_time: Option<Timestamp>,
        quorum_percent: u8,
    ) -> Self {
        Self {
            id,
            group_id,
            strict: false,
            start_time: Some(start_time),
            end_time,
            quorum_percent: quorum_percent.min(100),
            cached_status: ProposalStatus::Discussion,
            cached_outcome: ProposalOutcome::InProgress,
        }
    }

    /// A casual proposal — no window, open for voting indefinitely.
    pub fn casual(id: ProposalId, group_id: GroupId) -> Self {
        Self {
            id,
            group_id,
            strict: false,
            start_time: None,
            end_time: None,
            quorum_percent: 0,
            cached_status: ProposalStatus::Casual,
            cached_outcome: ProposalOutcome::InProgress,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// One votable option of a proposal. Owned exclusively by its proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalOption {
    pub id: OptionId,
    pub proposal_id: ProposalId,
    pub text: String,
    /// Display color, if the author picked one.
    pub color: Option<String>,
    /// Display emoji, if the author picked one.
    pub emoji: Option<String>,
}

impl ProposalOption {
    pub fn new(id: OptionId, proposal_id: ProposalId, text: impl Into<String>) -> Self {
        Self {
            id,
            proposal_id,
            text: text.into(),
            color: None,
            emoji: None,
        }
    }
}

/// A user's vote on one proposal option.
///
/// Keyed by `(user_id, option_id)` — at most one row per pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    pub proposal_id: ProposalId,
    pub option_id: OptionId,
    pub user_id: UserId,
    pub cast_at: Timestamp,
}
