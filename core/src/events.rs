//! Notifications the session emits for the presentation layer.

use serde::Serialize;

use crate::ids::GroupId;
use crate::types::NodeRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleEvent {
    /// A node was created; expand `ancestors` (root first) so it is visible.
    /// An empty chain means a new top-level group at the end of the list.
    Reveal {
        node: NodeRef,
        ancestors: Vec<GroupId>,
    },
}
