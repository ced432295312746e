//! State projection: the read-only tree view the editor renders.
//!
//! Nothing here is stored. Display indices, cascaded block/pause state,
//! sibling counts and control gating are recomputed from the store and the
//! local flag map on every call.

use serde::Serialize;
use std::collections::HashMap;

use crate::ids::GroupId;
use crate::store::{Entity, RuleStore};
use crate::types::{ChildRef, Logic, NodeRef, Operator};

/// Per-group toggles owned by the session, never written into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupFlags {
    pub blocked: bool,
    pub paused: bool,
}

/// Local block/pause overrides keyed by group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFlags {
    flags: HashMap<GroupId, GroupFlags>,
}

impl LocalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &GroupId) -> GroupFlags {
        self.flags.get(id).copied().unwrap_or_default()
    }

    pub fn set_blocked(&mut self, id: GroupId, blocked: bool) {
        self.update(id, |f| f.blocked = blocked);
    }

    pub fn set_paused(&mut self, id: GroupId, paused: bool) {
        self.update(id, |f| f.paused = paused);
    }

    fn update(&mut self, id: GroupId, change: impl FnOnce(&mut GroupFlags)) {
        let entry = self.flags.entry(id).or_default();
        change(entry);
        if *entry == GroupFlags::default() {
            self.flags.remove(&id);
        }
    }
}

/// Which interactive controls the editor should enable for a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub can_reorder: bool,
    pub can_edit: bool,
    pub can_open_actions: bool,
    pub can_toggle_logic: bool,
    pub can_toggle_block: bool,
    pub can_toggle_pause: bool,
    pub can_create_child: bool,
    pub can_expand: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeContent {
    Group { title: String, logic: Logic },
    Filter { field: String, operator: Operator, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub node: NodeRef,
    pub content: NodeContent,
    /// Dotted 1-based path, e.g. `"3.2"`.
    pub display_index: String,
    /// 0-based position among siblings.
    pub position: usize,
    pub sibling_count: usize,
    pub is_last: bool,
    pub local: GroupFlags,
    pub effective_blocked: bool,
    pub effective_paused: bool,
    pub controls: Controls,
    pub children: Vec<NodeView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub revision: u64,
    pub roots: Vec<NodeView>,
}

impl TreeView {
    /// Depth-first, pre-order walk over every node.
    pub fn iter(&self) -> impl Iterator<Item = &NodeView> {
        let mut stack: Vec<&NodeView> = self.roots.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn find(&self, node: NodeRef) -> Option<&NodeView> {
        self.iter().find(|view| view.node == node)
    }
}

/// Ancestor state threaded down the recursion.
#[derive(Clone, Copy, Default)]
struct Inherited {
    blocked: bool,
    paused: bool,
}

/// Build the tree view for `store` with the given local toggles.
pub fn project(store: &RuleStore, flags: &LocalFlags) -> TreeView {
    let top: Vec<NodeRef> = store.top_level().iter().copied().map(ChildRef::Group).collect();
    TreeView {
        revision: store.revision(),
        roots: project_level(store, flags, &top, "", Inherited::default()),
    }
}

fn project_level(
    store: &RuleStore,
    flags: &LocalFlags,
    level: &[NodeRef],
    prefix: &str,
    parent: Inherited,
) -> Vec<NodeView> {
    let sibling_count = level.len();
    level
        .iter()
        .enumerate()
        .filter_map(|(position, child)| {
            let display_index = if prefix.is_empty() {
                (position + 1).to_string()
            } else {
                format!("{}.{}", prefix, position + 1)
            };
            let is_last = position + 1 == sibling_count;
            let can_reorder = sibling_count >= 2 && !parent.blocked;

            let view = match store.get(*child)? {
                Entity::Group(group) => {
                    let local = flags.get(&group.group_id);
                    let effective = Inherited {
                        blocked: local.blocked || parent.blocked,
                        paused: local.paused || parent.paused,
                    };
                    let children =
                        project_level(store, flags, &group.children, &display_index, effective);

                    NodeView {
                        node: *child,
                        content: NodeContent::Group {
                            title: group.title.clone(),
                            logic: group.logic,
                        },
                        display_index,
                        position,
                        sibling_count,
                        is_last,
                        local,
                        effective_blocked: effective.blocked,
                        effective_paused: effective.paused,
                        controls: Controls {
                            can_reorder,
                            can_edit: !effective.blocked,
                            can_open_actions: !parent.blocked,
                            can_toggle_logic: !effective.blocked,
                            can_toggle_block: !parent.blocked,
                            can_toggle_pause: !effective.blocked && !parent.paused,
                            can_create_child: !effective.blocked,
                            can_expand: !group.children.is_empty(),
                        },
                        children,
                    }
                }
                Entity::Filter(filter) => NodeView {
                    node: *child,
                    content: NodeContent::Filter {
                        field: filter.field.clone(),
                        operator: filter.operator,
                        value: filter.value.clone(),
                    },
                    display_index,
                    position,
                    sibling_count,
                    is_last,
                    local: GroupFlags::default(),
                    effective_blocked: parent.blocked,
                    effective_paused: parent.paused,
                    controls: Controls {
                        can_reorder,
                        can_edit: !parent.blocked,
                        can_open_actions: !parent.blocked,
                        ..Controls::default()
                    },
                    children: Vec::new(),
                },
            };
            Some(view)
        })
        .collect()
}
