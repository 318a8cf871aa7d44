//! Typed row identifiers
//!
//! Every table has its own id newtype so a task id can never be passed
//! where a group id is expected.

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value
            #[inline]
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

row_id!(
    /// User identifier
    UserId,
    "user"
);
row_id!(
    /// Team identifier
    TeamId,
    "team"
);
row_id!(
    /// Client company identifier
    ClientCompanyId,
    "company"
);
row_id!(
    /// Project identifier
    ProjectId,
    "project"
);
row_id!(
    /// Task group identifier
    TaskGroupId,
    "group"
);
row_id!(
    /// Task identifier
    TaskId,
    "task"
);
row_id!(
    /// Label identifier
    LabelId,
    "label"
);
row_id!(
    /// Comment identifier
    CommentId,
    "comment"
);
row_id!(
    /// Time log identifier
    TimeLogId,
    "timelog"
);
