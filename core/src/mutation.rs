//! Mutation engine: create, sub-create and edit for groups and filters.
//!
//! Every operation validates first and only then builds the next snapshot,
//! so a rejected command never leaves a half-applied store behind.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::ids::{FilterId, GroupId, IdGenerator};
use crate::store::RuleStore;
use crate::types::{ChildRef, Filter, FilterFields, Group, GroupFields, NodeRef};

/// Group commands issued by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupCommand {
    /// New top-level group, appended to the top-level order.
    Create {
        #[serde(flatten)]
        fields: GroupFields,
    },
    /// New subgroup, appended to the parent's children.
    #[serde(rename_all = "camelCase")]
    SubCreate {
        parent_id: GroupId,
        #[serde(flatten)]
        fields: GroupFields,
    },
    /// Replace title and logic of an existing group.
    #[serde(rename_all = "camelCase")]
    Edit {
        group_id: GroupId,
        #[serde(flatten)]
        fields: GroupFields,
    },
}

/// Filter commands issued by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterCommand {
    #[serde(rename_all = "camelCase")]
    Create {
        parent_id: GroupId,
        #[serde(flatten)]
        fields: FilterFields,
    },
    #[serde(rename_all = "camelCase")]
    Edit {
        filter_id: FilterId,
        #[serde(flatten)]
        fields: FilterFields,
    },
}

/// Result of a committed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub store: RuleStore,
    /// The node a create command added; `None` for edits.
    pub created: Option<NodeRef>,
}

/// Deepest nesting level a group may sit at; top-level groups are level 1.
///
/// Projection walks the tree recursively, so the depth is bounded here.
pub const MAX_DEPTH: usize = 32;

impl RuleStore {
    /// Insert a group with id `id`, top-level when `parent` is `None`.
    pub fn create_group(
        &self,
        id: GroupId,
        fields: GroupFields,
        parent: Option<GroupId>,
    ) -> Result<RuleStore> {
        let fields = self.check_group_create(fields, parent)?;
        self.insert_group(id, fields, parent)
    }

    /// Replace the title and logic of `id`. Parent and children are untouched.
    pub fn edit_group(&self, id: GroupId, fields: GroupFields) -> Result<RuleStore> {
        let fields = fields.normalized()?;
        if !self.groups.contains_key(&id) {
            return Err(RuleError::GroupNotFound(id));
        }

        let mut next = self.clone();
        let group = &mut next.groups[&id];
        group.title = fields.title;
        group.logic = fields.logic;
        next.revision = self.next_revision();
        Ok(next)
    }

    /// Insert a filter with id `id` at the end of `parent`'s children.
    pub fn create_filter(
        &self,
        id: FilterId,
        fields: FilterFields,
        parent: GroupId,
    ) -> Result<RuleStore> {
        let fields = self.check_filter_create(fields, parent)?;
        self.insert_filter(id, fields, parent)
    }

    /// Replace field, operator and value of `id`. The owning group is untouched.
    pub fn edit_filter(&self, id: FilterId, fields: FilterFields) -> Result<RuleStore> {
        let fields = fields.normalized()?;
        if !self.filters.contains_key(&id) {
            return Err(RuleError::FilterNotFound(id));
        }

        let mut next = self.clone();
        let filter = &mut next.filters[&id];
        filter.field = fields.field;
        filter.operator = fields.operator;
        filter.value = fields.value;
        next.revision = self.next_revision();
        Ok(next)
    }

    /// Apply a group command, drawing a fresh id from `ids` for creates.
    pub fn apply_group(&self, command: GroupCommand, ids: &mut dyn IdGenerator) -> Result<Applied> {
        let (fields, parent) = match command {
            GroupCommand::Create { fields } => (fields, None),
            GroupCommand::SubCreate { parent_id, fields } => (fields, Some(parent_id)),
            GroupCommand::Edit { group_id, fields } => {
                return Ok(Applied {
                    store: self.edit_group(group_id, fields)?,
                    created: None,
                })
            }
        };
        let (id, store) = self.create_group_with(fields, parent, ids)?;
        Ok(Applied {
            store,
            created: Some(ChildRef::Group(id)),
        })
    }

    /// Apply a filter command, drawing a fresh id from `ids` for creates.
    pub fn apply_filter(&self, command: FilterCommand, ids: &mut dyn IdGenerator) -> Result<Applied> {
        match command {
            FilterCommand::Create { parent_id, fields } => {
                let (id, store) = self.create_filter_with(fields, parent_id, ids)?;
                Ok(Applied {
                    store,
                    created: Some(ChildRef::Filter(id)),
                })
            }
            FilterCommand::Edit { filter_id, fields } => Ok(Applied {
                store: self.edit_filter(filter_id, fields)?,
                created: None,
            }),
        }
    }

    /// Create a group under an id drawn from `ids`.
    ///
    /// The id is drawn only once the command has passed validation, so a
    /// rejected create leaves the generator where it was.
    pub(crate) fn create_group_with(
        &self,
        fields: GroupFields,
        parent: Option<GroupId>,
        ids: &mut dyn IdGenerator,
    ) -> Result<(GroupId, RuleStore)> {
        let fields = self.check_group_create(fields, parent)?;
        let id = ids.next_group_id();
        Ok((id, self.insert_group(id, fields, parent)?))
    }

    /// Filter counterpart of [`create_group_with`](Self::create_group_with).
    pub(crate) fn create_filter_with(
        &self,
        fields: FilterFields,
        parent: GroupId,
        ids: &mut dyn IdGenerator,
    ) -> Result<(FilterId, RuleStore)> {
        let fields = self.check_filter_create(fields, parent)?;
        let id = ids.next_filter_id();
        Ok((id, self.insert_filter(id, fields, parent)?))
    }

    fn check_group_create(&self, fields: GroupFields, parent: Option<GroupId>) -> Result<GroupFields> {
        let fields = fields.normalized()?;
        if let Some(parent_id) = parent {
            if !self.groups.contains_key(&parent_id) {
                return Err(RuleError::ParentNotFound(parent_id));
            }
            // The parent's own ancestors, the parent, then the new group.
            let depth = self.ancestors(ChildRef::Group(parent_id)).len() + 2;
            if depth > MAX_DEPTH {
                return Err(RuleError::TooDeep { depth, max: MAX_DEPTH });
            }
        }
        Ok(fields)
    }

    fn check_filter_create(&self, fields: FilterFields, parent: GroupId) -> Result<FilterFields> {
        let fields = fields.normalized()?;
        if !self.groups.contains_key(&parent) {
            return Err(RuleError::ParentNotFound(parent));
        }
        Ok(fields)
    }

    /// `fields` must already be normalized and `parent` checked.
    fn insert_group(&self, id: GroupId, fields: GroupFields, parent: Option<GroupId>) -> Result<RuleStore> {
        self.ensure_fresh(*id.as_uuid())?;

        let mut next = self.clone();
        next.groups.insert(id, Group::new(id, fields, parent));
        match parent {
            None => next.top_level.push(id),
            Some(parent_id) => next.groups[&parent_id].children.push(ChildRef::Group(id)),
        }
        next.revision = self.next_revision();
        Ok(next)
    }

    fn insert_filter(&self, id: FilterId, fields: FilterFields, parent: GroupId) -> Result<RuleStore> {
        self.ensure_fresh(*id.as_uuid())?;

        let mut next = self.clone();
        next.filters.insert(id, Filter::new(id, fields, parent));
        next.groups[&parent].children.push(ChildRef::Filter(id));
        next.revision = self.next_revision();
        Ok(next)
    }

    /// Group and filter ids share the UUID space; reject reuse across both.
    fn ensure_fresh(&self, uuid: uuid::Uuid) -> Result<()> {
        let group_id = GroupId::from_uuid(uuid);
        let filter_id = FilterId::from_uuid(uuid);
        if self.groups.contains_key(&group_id) || self.filters.contains_key(&filter_id) {
            return Err(RuleError::DuplicateId(uuid.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::types::{Logic, Operator};

    fn group(title: &str) -> GroupFields {
        GroupFields::new(title, Logic::And)
    }

    fn filter(field: &str) -> FilterFields {
        FilterFields::new(field, Operator::Equals, "x")
    }

    fn created_group(applied: &Applied) -> GroupId {
        match applied.created {
            Some(ChildRef::Group(id)) => id,
            other => panic!("expected a created group, got {:?}", other),
        }
    }

    #[test]
    fn test_create_top_level_appends_to_order() {
        let mut ids = SequentialIds::new();
        let store = RuleStore::new();

        let a = store.apply_group(GroupCommand::Create { fields: group("a") }, &mut ids).unwrap();
        let b = a.store.apply_group(GroupCommand::Create { fields: group("b") }, &mut ids).unwrap();

        assert_eq!(b.store.top_level(), &[created_group(&a), created_group(&b)]);
        assert_eq!(b.store.revision(), 2);
        // Earlier snapshots are untouched.
        assert_eq!(a.store.top_level().len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_sub_create_appends_one_child_reference() {
        let mut ids = SequentialIds::new();
        let root = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("root") }, &mut ids)
            .unwrap();
        let parent = created_group(&root);

        let with_filter = root
            .store
            .apply_filter(FilterCommand::Create { parent_id: parent, fields: filter("f") }, &mut ids)
            .unwrap();
        let before = with_filter.store.group(&parent).unwrap().children().to_vec();

        let sub = with_filter
            .store
            .apply_group(GroupCommand::SubCreate { parent_id: parent, fields: group("sub") }, &mut ids)
            .unwrap();
        let sub_id = created_group(&sub);
        let after = sub.store.group(&parent).unwrap().children();

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.last(), Some(&ChildRef::Group(sub_id)));
        assert_eq!(sub.store.group(&sub_id).unwrap().parent_id(), Some(parent));
        // Subgroups are not top-level.
        assert_eq!(sub.store.top_level(), &[parent]);
    }

    #[test]
    fn test_create_under_missing_parent_is_rejected() {
        let mut ids = SequentialIds::new();
        let store = RuleStore::new();
        let ghost = GroupId::from_uuid(uuid::Uuid::from_u128(99));

        let err = store
            .apply_group(GroupCommand::SubCreate { parent_id: ghost, fields: group("x") }, &mut ids)
            .unwrap_err();
        assert_eq!(err, RuleError::ParentNotFound(ghost));

        let err = store
            .apply_filter(FilterCommand::Create { parent_id: ghost, fields: filter("x") }, &mut ids)
            .unwrap_err();
        assert_eq!(err, RuleError::ParentNotFound(ghost));
        assert_eq!(store, RuleStore::new());
    }

    #[test]
    fn test_edit_group_keeps_structure() {
        let mut ids = SequentialIds::new();
        let root = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("root") }, &mut ids)
            .unwrap();
        let id = created_group(&root);
        let with_child = root
            .store
            .apply_filter(FilterCommand::Create { parent_id: id, fields: filter("f") }, &mut ids)
            .unwrap();

        let edited = with_child
            .store
            .edit_group(id, GroupFields::new(" renamed ", Logic::Or))
            .unwrap();
        let g = edited.group(&id).unwrap();
        assert_eq!(g.title(), "renamed");
        assert_eq!(g.logic(), Logic::Or);
        assert_eq!(g.children(), with_child.store.group(&id).unwrap().children());
        assert_eq!(g.parent_id(), None);
    }

    #[test]
    fn test_edit_missing_group_leaves_store_unchanged() {
        let mut ids = SequentialIds::new();
        let store = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("root") }, &mut ids)
            .unwrap()
            .store;
        let ghost = GroupId::from_uuid(uuid::Uuid::from_u128(42));

        let err = store.edit_group(ghost, group("nope")).unwrap_err();
        assert_eq!(err, RuleError::GroupNotFound(ghost));
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_edit_filter_replaces_fields() {
        let mut ids = SequentialIds::new();
        let root = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("root") }, &mut ids)
            .unwrap();
        let parent = created_group(&root);
        let created = root
            .store
            .apply_filter(FilterCommand::Create { parent_id: parent, fields: filter("country") }, &mut ids)
            .unwrap();
        let Some(ChildRef::Filter(fid)) = created.created else {
            panic!("expected filter");
        };

        let edited = created
            .store
            .apply_filter(
                FilterCommand::Edit {
                    filter_id: fid,
                    fields: FilterFields::new("date", Operator::IsAfter, "2024-01-01"),
                },
                &mut ids,
            )
            .unwrap();
        assert!(edited.created.is_none());
        let f = edited.store.filter(&fid).unwrap();
        assert_eq!(f.field(), "date");
        assert_eq!(f.operator(), Operator::IsAfter);
        assert_eq!(f.value(), "2024-01-01");
        assert_eq!(f.parent_id(), parent);
    }

    #[test]
    fn test_edit_missing_filter_is_not_found() {
        let ghost = FilterId::from_uuid(uuid::Uuid::from_u128(5));
        let err = RuleStore::new().edit_filter(ghost, filter("x")).unwrap_err();
        assert_eq!(err, RuleError::FilterNotFound(ghost));
    }

    #[test]
    fn test_duplicate_id_rejected_across_kinds() {
        let mut ids = SequentialIds::new();
        let root = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("root") }, &mut ids)
            .unwrap();
        let id = created_group(&root);

        let err = root.store.create_group(id, group("again"), None).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");

        let clash = FilterId::from_uuid(*id.as_uuid());
        assert!(root.store.create_filter(clash, filter("f"), id).is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let err = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("  ") }, &mut SequentialIds::new())
            .unwrap_err();
        assert!(matches!(err, RuleError::Blank { field: "title" }));
    }

    #[test]
    fn test_nesting_stops_at_max_depth() {
        let mut ids = SequentialIds::new();
        let root = RuleStore::new()
            .apply_group(GroupCommand::Create { fields: group("level 1") }, &mut ids)
            .unwrap();
        let mut deepest = created_group(&root);
        let mut store = root.store;
        for level in 2..=MAX_DEPTH {
            let sub = store
                .apply_group(
                    GroupCommand::SubCreate { parent_id: deepest, fields: group(&format!("level {}", level)) },
                    &mut ids,
                )
                .unwrap();
            deepest = created_group(&sub);
            store = sub.store;
        }
        assert_eq!(store.ancestors(ChildRef::Group(deepest)).len(), MAX_DEPTH - 1);

        let before = store.clone();
        let err = store
            .apply_group(GroupCommand::SubCreate { parent_id: deepest, fields: group("too deep") }, &mut ids)
            .unwrap_err();
        assert_eq!(err, RuleError::TooDeep { depth: MAX_DEPTH + 1, max: MAX_DEPTH });
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(store, before);

        // Filters still fit under the deepest group.
        let with_filter = store
            .apply_filter(FilterCommand::Create { parent_id: deepest, fields: filter("leaf") }, &mut ids)
            .unwrap();
        assert_eq!(with_filter.store.filter_count(), 1);
    }

    #[test]
    fn test_rejected_create_draws_no_id() {
        let mut ids = SequentialIds::new();
        let ghost = GroupId::from_uuid(uuid::Uuid::from_u128(99));
        let store = RuleStore::new();

        assert!(store
            .apply_group(GroupCommand::SubCreate { parent_id: ghost, fields: group("x") }, &mut ids)
            .is_err());
        assert!(store
            .apply_group(GroupCommand::Create { fields: group(" ") }, &mut ids)
            .is_err());

        let root = store.apply_group(GroupCommand::Create { fields: group("root") }, &mut ids).unwrap();
        assert_eq!(created_group(&root), GroupId::from_uuid(uuid::Uuid::from_u128(1)));
    }

    #[test]
    fn test_command_json_shape() {
        let json = r#"{"action":"SUB_CREATE","parentId":"00000000-0000-0000-0000-000000000001","title":"Sub","logic":"OR"}"#;
        let command: GroupCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            command,
            GroupCommand::SubCreate {
                parent_id: GroupId::from_uuid(uuid::Uuid::from_u128(1)),
                fields: GroupFields::new("Sub", Logic::Or),
            }
        );

        let json = r#"{"action":"EDIT","filterId":"00000000-0000-0000-0000-000000000002","field":"a","operator":"is before","value":"b"}"#;
        let command: FilterCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(command, FilterCommand::Edit { fields, .. } if fields.operator == Operator::IsBefore));
    }
}
