//! Entity types for the rule tree.
//!
//! These mirror the editor's group/filter shapes so the JS side can
//! read snapshots without a translation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RuleError;
use crate::ids::{FilterId, GroupId};

// ============================================================================
// Enumerations
// ============================================================================

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Logic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Logic {
    pub fn all() -> &'static [Logic] {
        &[Logic::And, Logic::Or]
    }

    /// The other connective.
    pub fn toggled(self) -> Logic {
        match self {
            Logic::And => Logic::Or,
            Logic::Or => Logic::And,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

/// Comparison a filter applies between its field and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "not equals")]
    NotEquals,
    #[serde(rename = "is after")]
    IsAfter,
    #[serde(rename = "is before")]
    IsBefore,
}

impl Operator {
    pub fn all() -> &'static [Operator] {
        &[
            Operator::Equals,
            Operator::NotEquals,
            Operator::IsAfter,
            Operator::IsBefore,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not equals",
            Operator::IsAfter => "is after",
            Operator::IsBefore => "is before",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Discriminates the two entity kinds a child reference can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChildKind {
    Group,
    Filter,
}

// ============================================================================
// References
// ============================================================================

/// An entry in a group's ordered `children` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "UPPERCASE")]
pub enum ChildRef {
    Group(GroupId),
    Filter(FilterId),
}

impl ChildRef {
    pub fn kind(&self) -> ChildKind {
        match self {
            ChildRef::Group(_) => ChildKind::Group,
            ChildRef::Filter(_) => ChildKind::Filter,
        }
    }
}

/// Any node in the tree, addressed by id.
pub type NodeRef = ChildRef;

// ============================================================================
// Entities
// ============================================================================

/// A logical node owning an ordered list of child references.
///
/// Only the mutation and reorder engines change a stored group; everything
/// else sees it through shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub(crate) group_id: GroupId,
    pub(crate) title: String,
    pub(crate) logic: Logic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<GroupId>,
    pub(crate) children: Vec<ChildRef>,
}

impl Group {
    pub(crate) fn new(group_id: GroupId, fields: GroupFields, parent_id: Option<GroupId>) -> Self {
        Self {
            group_id,
            title: fields.title,
            logic: fields.logic,
            parent_id,
            children: Vec::new(),
        }
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    /// Owning group, `None` for top-level groups.
    pub fn parent_id(&self) -> Option<GroupId> {
        self.parent_id
    }

    pub fn children(&self) -> &[ChildRef] {
        &self.children
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A leaf predicate. Always owned by exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub(crate) filter_id: FilterId,
    pub(crate) field: String,
    pub(crate) operator: Operator,
    pub(crate) value: String,
    pub(crate) parent_id: GroupId,
}

impl Filter {
    pub(crate) fn new(filter_id: FilterId, fields: FilterFields, parent_id: GroupId) -> Self {
        Self {
            filter_id,
            field: fields.field,
            operator: fields.operator,
            value: fields.value,
            parent_id,
        }
    }

    pub fn filter_id(&self) -> FilterId {
        self.filter_id
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn parent_id(&self) -> GroupId {
        self.parent_id
    }
}

// ============================================================================
// Editable fields
// ============================================================================

/// The user-editable part of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFields {
    pub title: String,
    #[serde(default)]
    pub logic: Logic,
}

impl GroupFields {
    pub fn new(title: impl Into<String>, logic: Logic) -> Self {
        Self {
            title: title.into(),
            logic,
        }
    }

    /// Trim the title and reject it if nothing is left.
    pub fn normalized(self) -> Result<Self, RuleError> {
        Ok(Self {
            title: non_blank("title", self.title)?,
            logic: self.logic,
        })
    }
}

/// The user-editable part of a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFields {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl FilterFields {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Trim field and value and reject either if blank.
    pub fn normalized(self) -> Result<Self, RuleError> {
        Ok(Self {
            field: non_blank("field", self.field)?,
            operator: self.operator,
            value: non_blank("value", self.value)?,
        })
    }
}

fn non_blank(name: &'static str, raw: String) -> Result<String, RuleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RuleError::Blank { field: name });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_operator_wire_names() {
        let json = serde_json::to_string(&Operator::NotEquals).unwrap();
        assert_eq!(json, "\"not equals\"");

        let op: Operator = serde_json::from_str("\"is before\"").unwrap();
        assert_eq!(op, Operator::IsBefore);
    }

    #[test]
    fn test_logic_wire_names_and_toggle() {
        let logic: Logic = serde_json::from_str("\"OR\"").unwrap();
        assert_eq!(logic, Logic::Or);
        assert_eq!(logic.toggled(), Logic::And);
        assert_eq!(serde_json::to_string(&Logic::And).unwrap(), "\"AND\"");
    }

    #[test]
    fn test_child_ref_shape() {
        let child = ChildRef::Group(GroupId::from_uuid(Uuid::from_u128(3)));
        let json = serde_json::to_value(child).unwrap();
        assert_eq!(json["type"], "GROUP");
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000003");
        assert_eq!(child.kind(), ChildKind::Group);
    }

    #[test]
    fn test_group_fields_are_trimmed() {
        let fields = GroupFields::new("  Admins  ", Logic::Or).normalized().unwrap();
        assert_eq!(fields.title, "Admins");
        assert_eq!(fields.logic, Logic::Or);
    }

    #[test]
    fn test_blank_title_rejected() {
        let err = GroupFields::new("   ", Logic::And).normalized().unwrap_err();
        assert!(matches!(err, RuleError::Blank { field: "title" }));
    }

    #[test]
    fn test_blank_filter_value_rejected() {
        let err = FilterFields::new("country", Operator::Equals, "\t")
            .normalized()
            .unwrap_err();
        assert!(matches!(err, RuleError::Blank { field: "value" }));
    }

    #[test]
    fn test_group_fields_logic_defaults_to_and() {
        let fields: GroupFields = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(fields.logic, Logic::And);
    }
}
