//! Reorder engine: moves a node within one ordered collection.
//!
//! A collection is either the top-level order or one group's children.
//! Moves never cross collections; a drag that started in one scope and was
//! dropped in another is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, RuleError};
use crate::ids::GroupId;
use crate::store::{Entity, RuleStore};
use crate::types::NodeRef;

/// The ordered collection a move operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<GroupId>", into = "Option<GroupId>")]
pub enum MoveScope {
    TopLevel,
    Parent(GroupId),
}

impl From<Option<GroupId>> for MoveScope {
    fn from(parent: Option<GroupId>) -> Self {
        parent.map_or(MoveScope::TopLevel, MoveScope::Parent)
    }
}

impl From<MoveScope> for Option<GroupId> {
    fn from(scope: MoveScope) -> Self {
        match scope {
            MoveScope::TopLevel => None,
            MoveScope::Parent(id) => Some(id),
        }
    }
}

impl fmt::Display for MoveScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveScope::TopLevel => f.write_str("root"),
            MoveScope::Parent(id) => write!(f, "{}", id),
        }
    }
}

/// A resolved drag-and-drop.
///
/// `dragged_scope` is captured when the drag starts, `target_scope` belongs
/// to the node it was dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from_index: usize,
    pub to_index: usize,
    pub dragged_scope: MoveScope,
    pub target_scope: MoveScope,
}

impl MoveRequest {
    /// A move whose source and destination share `scope`.
    pub fn within(scope: MoveScope, from_index: usize, to_index: usize) -> Self {
        Self {
            from_index,
            to_index,
            dragged_scope: scope,
            target_scope: scope,
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reordered {
    pub store: RuleStore,
    /// `false` when `from_index == to_index`.
    pub changed: bool,
}

impl RuleStore {
    /// The scope a node is reordered in: top-level order or its parent's children.
    pub fn scope_of(&self, node: NodeRef) -> Option<MoveScope> {
        match self.get(node)? {
            Entity::Group(group) => Some(group.parent_id.into()),
            Entity::Filter(filter) => Some(MoveScope::Parent(filter.parent_id)),
        }
    }

    /// Number of entries in the collection named by `scope`.
    pub fn scope_len(&self, scope: MoveScope) -> Result<usize> {
        match scope {
            MoveScope::TopLevel => Ok(self.top_level.len()),
            MoveScope::Parent(id) => self
                .groups
                .get(&id)
                .map(|g| g.children.len())
                .ok_or(RuleError::ParentNotFound(id)),
        }
    }

    /// Remove the entry at `from_index` and insert it at `to_index` of the
    /// shortened collection.
    pub fn reorder(&self, request: MoveRequest) -> Result<Reordered> {
        if request.dragged_scope != request.target_scope {
            return Err(RuleError::ScopeMismatch {
                dragged: request.dragged_scope,
                target: request.target_scope,
            });
        }

        let scope = request.target_scope;
        let len = self.scope_len(scope)?;
        for index in [request.from_index, request.to_index] {
            if index >= len {
                return Err(RuleError::OutOfRange { index, len });
            }
        }

        if request.from_index == request.to_index {
            return Ok(Reordered {
                store: self.clone(),
                changed: false,
            });
        }

        let mut next = self.clone();
        match scope {
            MoveScope::TopLevel => splice_move(&mut next.top_level, request.from_index, request.to_index),
            MoveScope::Parent(id) => splice_move(
                &mut next.groups[&id].children,
                request.from_index,
                request.to_index,
            ),
        }
        next.revision = self.next_revision();
        Ok(Reordered {
            store: next,
            changed: true,
        })
    }
}

fn splice_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}
