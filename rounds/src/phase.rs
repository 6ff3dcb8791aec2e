//! The funding round phase clock.
//!
//! Phase is derived, never stored: the schedule timestamps and the
//! distribution flag are the source of truth. A missing timestamp means that
//! boundary has not been passed — a round whose closing time was cleared
//! stays open.

use agora_types::{FundingRound, RoundPhase, Timestamp};

/// Derive the phase of a round at a given time.
///
/// Once `tokens_distributed_at` is set the only reachable phases are
/// `VotingOpen` (while the voting window is open, so allocations keep
/// flowing) and `Distributed`. Editing timestamps backward can never
/// resurrect a pre-voting phase of a distributed round.
pub fn phase_at(round: &FundingRound, now: Timestamp) -> RoundPhase {
    let windowed = window_phase(round, now);
    if round.tokens_distributed_at.is_some() && windowed != RoundPhase::VotingOpen {
        return RoundPhase::Distributed;
    }
    windowed
}

/// The purely time-derived ladder, ignoring distribution.
fn window_phase(round: &FundingRound, now: Timestamp) -> RoundPhase {
    let opens = match round.submissions_open_at {
        None => return RoundPhase::Draft,
        Some(t) => t,
    };
    if now < opens {
        return RoundPhase::Draft;
    }
    match round.submissions_close_at {
        Some(t) if now >= t => {}
        _ => return RoundPhase::SubmissionsOpen,
    }
    match round.voting_opens_at {
        Some(t) if now >= t => {}
        _ => return RoundPhase::SubmissionsClosed,
    }
    match round.voting_closes_at {
        Some(t) if now >= t => RoundPhase::VotingClosed,
        _ => RoundPhase::VotingOpen,
    }
}
