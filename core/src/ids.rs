//! Stable identifiers for groups and filters.
//!
//! Every cross-reference in the tree is expressed with these ids, never with a
//! position. Positions change on every reorder; ids are assigned once at
//! creation and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::IdScheme;

/// Identifier of a [`Group`](crate::Group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

/// Identifier of a [`Filter`](crate::Filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(GroupId);
uuid_id!(FilterId);

/// Source of fresh identifiers for newly created nodes.
///
/// The session owns one generator; tests plug in a deterministic one.
pub trait IdGenerator {
    fn next_group_id(&mut self) -> GroupId;
    fn next_filter_id(&mut self) -> FilterId;
}

/// Random (v4) or time-ordered (v7) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator {
    scheme: IdScheme,
}

impl UuidGenerator {
    pub fn new(scheme: IdScheme) -> Self {
        Self { scheme }
    }

    fn fresh(&self) -> Uuid {
        match self.scheme {
            IdScheme::V4 => Uuid::new_v4(),
            IdScheme::V7 => Uuid::now_v7(),
        }
    }
}

impl IdGenerator for UuidGenerator {
    fn next_group_id(&mut self) -> GroupId {
        GroupId(self.fresh())
    }

    fn next_filter_id(&mut self) -> FilterId {
        FilterId(self.fresh())
    }
}

/// Counter-backed generator producing `00000000-0000-0000-0000-000000000001`, ...
///
/// Group and filter ids share one counter so no two nodes ever collide.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> Uuid {
        self.next += 1;
        Uuid::from_u128(self.next)
    }
}

impl IdGenerator for SequentialIds {
    fn next_group_id(&mut self) -> GroupId {
        GroupId(self.bump())
    }

    fn next_filter_id(&mut self) -> FilterId {
        FilterId(self.bump())
    }
}
