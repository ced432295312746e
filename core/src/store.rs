//! Entity store: every group and filter keyed by id, plus top-level order.
//!
//! A `RuleStore` is a value. The engines never modify one in place; they
//! clone, change the clone, and hand it back, so any snapshot a caller holds
//! stays valid.

use indexmap::IndexMap;

use crate::ids::{FilterId, GroupId};
use crate::types::{ChildKind, ChildRef, Filter, Group, NodeRef};

/// A resolved node borrowed from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Group(&'a Group),
    Filter(&'a Filter),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStore {
    pub(crate) groups: IndexMap<GroupId, Group>,
    pub(crate) filters: IndexMap<FilterId, Filter>,
    pub(crate) top_level: Vec<GroupId>,
    pub(crate) revision: u64,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn filter(&self, id: &FilterId) -> Option<&Filter> {
        self.filters.get(id)
    }

    /// Resolve a reference of either kind.
    pub fn get(&self, node: NodeRef) -> Option<Entity<'_>> {
        match node {
            ChildRef::Group(id) => self.group(&id).map(Entity::Group),
            ChildRef::Filter(id) => self.filter(&id).map(Entity::Filter),
        }
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.get(node).is_some()
    }

    /// All ids of one kind, in creation order.
    pub fn list(&self, kind: ChildKind) -> Vec<NodeRef> {
        match kind {
            ChildKind::Group => self.groups.keys().copied().map(ChildRef::Group).collect(),
            ChildKind::Filter => self.filters.keys().copied().map(ChildRef::Filter).collect(),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.values()
    }

    /// Ordered ids of groups without a parent.
    pub fn top_level(&self) -> &[GroupId] {
        &self.top_level
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of committed mutations that produced this snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Group ids from the top-level group down to `node`'s direct parent.
    ///
    /// Empty for top-level groups and for unknown nodes.
    pub fn ancestors(&self, node: NodeRef) -> Vec<GroupId> {
        let mut parent = match self.get(node) {
            Some(Entity::Group(group)) => group.parent_id,
            Some(Entity::Filter(filter)) => Some(filter.parent_id),
            None => None,
        };

        let mut chain = Vec::new();
        while let Some(id) = parent {
            chain.push(id);
            parent = self.groups.get(&id).and_then(|g| g.parent_id);
        }
        chain.reverse();
        chain
    }

    /// Child references that do not resolve to an entity of the declared kind.
    ///
    /// Always empty for stores produced by the engines.
    pub fn dangling_refs(&self) -> Vec<ChildRef> {
        let mut dangling: Vec<ChildRef> = self
            .top_level
            .iter()
            .filter(|id| !self.groups.contains_key(*id))
            .copied()
            .map(ChildRef::Group)
            .collect();

        for group in self.groups.values() {
            dangling.extend(group.children.iter().filter(|c| !self.contains(**c)).copied());
        }
        dangling
    }

    pub(crate) fn next_revision(&self) -> u64 {
        self.revision + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FilterFields, GroupFields, Logic, Operator};
    use uuid::Uuid;

    fn gid(n: u128) -> GroupId {
        GroupId::from_uuid(Uuid::from_u128(n))
    }

    fn fid(n: u128) -> FilterId {
        FilterId::from_uuid(Uuid::from_u128(n))
    }

    fn sample() -> RuleStore {
        let mut store = RuleStore::new();
        let mut root = Group::new(gid(1), GroupFields::new("root", Logic::And), None);
        let mut mid = Group::new(gid(2), GroupFields::new("mid", Logic::Or), Some(gid(1)));
        let leaf = Filter::new(fid(3), FilterFields::new("a", Operator::Equals, "b"), gid(2));
        root.children.push(ChildRef::Group(gid(2)));
        mid.children.push(ChildRef::Filter(fid(3)));
        store.groups.insert(gid(1), root);
        store.groups.insert(gid(2), mid);
        store.filters.insert(fid(3), leaf);
        store.top_level.push(gid(1));
        store
    }

    #[test]
    fn test_lookup_by_kind() {
        let store = sample();
        assert!(matches!(store.get(ChildRef::Group(gid(2))), Some(Entity::Group(g)) if g.title() == "mid"));
        assert!(matches!(store.get(ChildRef::Filter(fid(3))), Some(Entity::Filter(f)) if f.field() == "a"));
        assert!(store.get(ChildRef::Filter(fid(2))).is_none());
    }

    #[test]
    fn test_list_keeps_creation_order() {
        let store = sample();
        assert_eq!(
            store.list(ChildKind::Group),
            vec![ChildRef::Group(gid(1)), ChildRef::Group(gid(2))]
        );
        assert_eq!(store.list(ChildKind::Filter), vec![ChildRef::Filter(fid(3))]);
    }

    #[test]
    fn test_ancestors_root_first() {
        let store = sample();
        assert_eq!(store.ancestors(ChildRef::Filter(fid(3))), vec![gid(1), gid(2)]);
        assert_eq!(store.ancestors(ChildRef::Group(gid(2))), vec![gid(1)]);
        assert!(store.ancestors(ChildRef::Group(gid(1))).is_empty());
    }

    #[test]
    fn test_dangling_refs_detected() {
        let mut store = sample();
        assert!(store.dangling_refs().is_empty());

        store.groups[&gid(2)].children.push(ChildRef::Group(gid(9)));
        assert_eq!(store.dangling_refs(), vec![ChildRef::Group(gid(9))]);
    }
}
