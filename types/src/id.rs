//! Identifier newtypes.
//!
//! Every entity is referenced by a dedicated `u64` newtype so that a round id
//! can never be passed where a proposal id is expected. Identifiers are
//! assigned by the surrounding application; this engine only consumes them.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// A user (voter, participant, or submitter).
    UserId
);
define_id!(
    /// A group whose membership determines voter eligibility.
    GroupId
);
define_id!(
    /// A proposal post.
    ProposalId
);
define_id!(
    /// One votable option of a proposal.
    OptionId
);
define_id!(
    /// A funding round.
    RoundId
);
define_id!(
    /// A submission post within a funding round.
    SubmissionId
);
