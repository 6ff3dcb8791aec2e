//! Allocation planning — the pure budget math of the token ledger.
//!
//! Setting an allocation *replaces* the previous amount for the
//! `(participant, submission)` pair; the participant's remaining budget and
//! the submission aggregate move by the signed difference. All arithmetic is
//! checked.

use crate::error::RoundError;
use agora_types::{FundingRound, Participant};

/// A validated allocation write, ready to commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationPlan {
    /// The new absolute amount.
    pub amount: u64,
    /// The amount previously held by this pair.
    pub previous: u64,
    /// The participant's budget after the write.
    pub new_tokens_remaining: u64,
}

/// Validate an amount against the round's configured bounds.
///
/// Zero is always accepted — it removes the allocation and is exempt from
/// the minimum.
pub fn check_bounds(round: &FundingRound, amount: u64) -> Result<(), RoundError> {
    if amount == 0 {
        return Ok(());
    }
    if let Some(min) = round.min_token_allocation {
        if amount < min {
            return Err(RoundError::BelowMinimum { amount, min });
        }
    }
    if let Some(max) = round.max_token_allocation {
        if amount > max {
            return Err(RoundError::AboveMaximum { amount, max });
        }
    }
    Ok(())
}

/// Plan replacing the pair's allocation with `amount`.
///
/// The previous amount is freed before the new one is charged, so lowering
/// an allocation always succeeds and shrinking frees budget for other
/// submissions.
pub fn plan_allocation(
    round: &FundingRound,
    participant: &Participant,
    previous: u64,
    amount: u64,
) -> Result<AllocationPlan, RoundError> {
    check_bounds(round, amount)?;

    let freed = participant
        .tokens_remaining
        .checked_add(previous)
        .ok_or(RoundError::Overflow)?;
    let new_tokens_remaining =
        freed
            .checked_sub(amount)
            .ok_or(RoundError::InsufficientTokens {
                requested: amount,
                available: freed,
            })?;

    Ok(AllocationPlan {
        amount,
        previous,
        new_tokens_remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{GroupId, RoundId, Timestamp, UserId};

    fn round_with_bounds(min: u64, max: u64) -> FundingRound {
        FundingRound::new(RoundId::new(1), GroupId::new(1), "Grants", 100)
            .with_allocation_bounds(min, max)
    }

    fn participant(remaining: u64) -> Participant {
        let mut p = Participant::granted(
            RoundId::new(1),
            UserId::new(7),
            100,
            Timestamp::new(0),
        );
        p.tokens_remaining = remaining;
        p
    }

    #[test]
    fn fresh_allocation_charges_the_full_amount() {
        let plan = plan_allocation(&round_with_bounds(0, 0), &participant(100), 0, 40).unwrap();
        assert_eq!(plan.new_tokens_remaining, 60);
    }

    #[test]
    fn replacement_charges_only_the_difference() {
        // 40 → 30 frees 10.
        let plan = plan_allocation(&round_with_bounds(0, 0), &participant(60), 40, 30).unwrap();
        assert_eq!(plan.new_tokens_remaining, 70);

        // 30 → 70 charges 40 more.
        let plan = plan_allocation(&round_with_bounds(0, 0), &participant(70), 30, 70).unwrap();
        assert_eq!(plan.new_tokens_remaining, 30);
    }

    #[test]
    fn zero_clears_and_refunds() {
        let plan = plan_allocation(&round_with_bounds(0, 0), &participant(50), 50, 0).unwrap();
        assert_eq!(plan.new_tokens_remaining, 100);
    }

    #[test]
    fn zero_bypasses_the_minimum() {
        let round = round_with_bounds(10, 50);
        assert!(check_bounds(&round, 0).is_ok());
        assert!(matches!(
            check_bounds(&round, 5),
            Err(RoundError::BelowMinimum { amount: 5, min: 10 })
        ));
        assert!(matches!(
            check_bounds(&round, 51),
            Err(RoundError::AboveMaximum { amount: 51, max: 50 })
        ));
        assert!(check_bounds(&round, 10).is_ok());
        assert!(check_bounds(&round, 50).is_ok());
    }

    #[test]
    fn over_budget_is_rejected_with_the_freed_total() {
        let err = plan_allocation(&round_with_bounds(0, 0), &participant(60), 0, 70).unwrap_err();
        match err {
            RoundError::InsufficientTokens {
                requested,
                available,
            } => {
                assert_eq!(requested, 70);
                assert_eq!(available, 60);
            }
            other => panic!("unexpected error: {other}"),
        }

        // With 40 already on this pair, raising to 110 still fails: only
        // 60 + 40 = 100 is reachable.
        let err =
            plan_allocation(&round_with_bounds(0, 0), &participant(60), 40, 110).unwrap_err();
        assert!(matches!(
            err,
            RoundError::InsufficientTokens {
                requested: 110,
                available: 100
            }
        ));
    }
}
