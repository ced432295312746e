//! Errors reported by the rule tree engines.
//!
//! None of these are fatal. A rejected command leaves the caller's snapshot
//! exactly as it was.

use crate::ids::{FilterId, GroupId};
use crate::reorder::MoveScope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Filter not found: {0}")]
    FilterNotFound(FilterId),

    #[error("Parent group not found: {0}")]
    ParentNotFound(GroupId),

    #[error("Invalid move: different parent ({dragged} -> {target})")]
    ScopeMismatch { dragged: MoveScope, target: MoveScope },

    #[error("Index {index} out of range for {len} element(s)")]
    OutOfRange { index: usize, len: usize },

    #[error("{field} is required")]
    Blank { field: &'static str },

    #[error("Identifier already in use: {0}")]
    DuplicateId(String),

    #[error("Group would sit at nesting level {depth}; the limit is {max}")]
    TooDeep { depth: usize, max: usize },
}

impl RuleError {
    /// Stable category name for the presentation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleError::GroupNotFound(_)
            | RuleError::FilterNotFound(_)
            | RuleError::ParentNotFound(_) => "not_found",
            RuleError::ScopeMismatch { .. } => "scope_mismatch",
            RuleError::OutOfRange { .. } => "out_of_range",
            RuleError::Blank { .. } | RuleError::DuplicateId(_) | RuleError::TooDeep { .. } => {
                "invalid_input"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
