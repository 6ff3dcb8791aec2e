use proptest::prelude::*;

use agora_types::{ManualClock, OptionId, ProposalId, RoundId, SubmissionId, UserId};
use agora_types::{Clock, Timestamp};

proptest! {
    /// Identifier roundtrip: new -> get produces the raw value.
    #[test]
    fn id_roundtrip(raw in any::<u64>()) {
        prop_assert_eq!(UserId::new(raw).get(), raw);
        prop_assert_eq!(ProposalId::new(raw).get(), raw);
        prop_assert_eq!(OptionId::new(raw).get(), raw);
        prop_assert_eq!(RoundId::new(raw).get(), raw);
        prop_assert_eq!(SubmissionId::new(raw).get(), raw);
    }

    /// Timestamp ordering matches the ordering of the underlying seconds.
    #[test]
    fn timestamp_ordering_matches_secs(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Timestamp::new(a) < Timestamp::new(b), a < b);
    }

    /// elapsed_since never underflows and is exact when `now` is later.
    #[test]
    fn elapsed_since_saturates(start in any::<u64>(), delta in 0u64..1_000_000) {
        let t = Timestamp::new(start);
        let now = Timestamp::new(start.saturating_add(delta));
        prop_assert_eq!(t.elapsed_since(now), now.as_secs() - start);
        // The reverse direction saturates to zero rather than underflowing.
        prop_assert_eq!(now.elapsed_since(t), 0);
    }

    /// A manual clock advanced by n reads n seconds later.
    #[test]
    fn manual_clock_advance_is_additive(initial in 0u64..1_000_000, step in 0u64..10_000) {
        let clock = ManualClock::new(initial);
        clock.advance(step);
        prop_assert_eq!(clock.now(), Timestamp::new(initial + step));
    }
}
