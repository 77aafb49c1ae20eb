//! Identifier newtypes
//!
//! Every row the engine touches is addressed by a typed `u64` identifier so
//! that a member id can never be passed where a motion id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

identifier!(
    /// Tenant (organisation) owning members, policies and meetings
    TenantId,
    "tenant"
);
identifier!(
    /// Operator account acting on the system
    UserId,
    "user"
);
identifier!(
    /// Voting member of the assembly
    MemberId,
    "member"
);
identifier!(MeetingId, "meeting");
identifier!(MotionId, "motion");
identifier!(
    /// Quorum or vote policy row
    PolicyId,
    "policy"
);
