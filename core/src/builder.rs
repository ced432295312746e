//! Rule builder session.
//!
//! Owns the current snapshot and is the only writer to it. Commands run to
//! completion one at a time (`&mut self`); each either commits a new
//! snapshot or leaves the old one in place and returns the error.

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::config::BuilderConfig;
use crate::error::{Result, RuleError};
use crate::events::RuleEvent;
use crate::ids::{FilterId, GroupId, IdGenerator, UuidGenerator};
use crate::mutation::{Applied, FilterCommand, GroupCommand};
use crate::projection::{project, GroupFlags, LocalFlags, TreeView};
use crate::reorder::{MoveRequest, MoveScope};
use crate::store::RuleStore;
use crate::types::{ChildRef, FilterFields, GroupFields, NodeRef};

pub struct RuleBuilder {
    store: RuleStore,
    flags: LocalFlags,
    ids: Box<dyn IdGenerator>,
    config: BuilderConfig,
    events: VecDeque<RuleEvent>,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl RuleBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        let ids = UuidGenerator::new(config.id_scheme);
        Self::with_ids(config, ids)
    }

    /// Session drawing identifiers from a caller-supplied generator.
    pub fn with_ids(config: BuilderConfig, ids: impl IdGenerator + 'static) -> Self {
        Self {
            store: RuleStore::new(),
            flags: LocalFlags::new(),
            ids: Box::new(ids),
            config,
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The current snapshot.
    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Create a group, top-level when `parent` is `None`.
    pub fn create_group(&mut self, fields: GroupFields, parent: Option<GroupId>) -> Result<GroupId> {
        let (id, store) = self
            .store
            .create_group_with(fields, parent, self.ids.as_mut())
            .map_err(|err| rejected("group", err))?;
        self.install(
            "group",
            Applied {
                store,
                created: Some(ChildRef::Group(id)),
            },
        );
        Ok(id)
    }

    pub fn edit_group(&mut self, id: GroupId, fields: GroupFields) -> Result<()> {
        self.dispatch_group(GroupCommand::Edit { group_id: id, fields })
            .map(|_| ())
    }

    /// Flip the group's connective between AND and OR.
    pub fn toggle_logic(&mut self, id: GroupId) -> Result<()> {
        let group = self.store.group(&id).ok_or(RuleError::GroupNotFound(id))?;
        let fields = GroupFields::new(group.title(), group.logic().toggled());
        self.edit_group(id, fields)
    }

    /// Apply any group command. Returns the created node for creates.
    pub fn dispatch_group(&mut self, command: GroupCommand) -> Result<Option<NodeRef>> {
        let result = self.store.apply_group(command, self.ids.as_mut());
        self.commit("group", result)
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    pub fn create_filter(&mut self, fields: FilterFields, parent: GroupId) -> Result<FilterId> {
        let (id, store) = self
            .store
            .create_filter_with(fields, parent, self.ids.as_mut())
            .map_err(|err| rejected("filter", err))?;
        self.install(
            "filter",
            Applied {
                store,
                created: Some(ChildRef::Filter(id)),
            },
        );
        Ok(id)
    }

    pub fn edit_filter(&mut self, id: FilterId, fields: FilterFields) -> Result<()> {
        self.dispatch_filter(FilterCommand::Edit { filter_id: id, fields })
            .map(|_| ())
    }

    pub fn dispatch_filter(&mut self, command: FilterCommand) -> Result<Option<NodeRef>> {
        let result = self.store.apply_filter(command, self.ids.as_mut());
        self.commit("filter", result)
    }

    // ------------------------------------------------------------------
    // Reordering
    // ------------------------------------------------------------------

    /// Apply a drag-and-drop. Returns whether the order changed.
    pub fn move_node(&mut self, request: MoveRequest) -> Result<bool> {
        match self.store.reorder(request) {
            Ok(reordered) => {
                if reordered.changed {
                    self.store = reordered.store;
                    debug!(
                        from = request.from_index,
                        to = request.to_index,
                        scope = %request.target_scope,
                        revision = self.store.revision(),
                        "Reordered"
                    );
                }
                Ok(reordered.changed)
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "Move rejected");
                Err(err)
            }
        }
    }

    /// Convenience for a move whose source and target share `scope`.
    pub fn move_within(&mut self, scope: MoveScope, from_index: usize, to_index: usize) -> Result<bool> {
        self.move_node(MoveRequest::within(scope, from_index, to_index))
    }

    // ------------------------------------------------------------------
    // Local block / pause toggles
    // ------------------------------------------------------------------

    pub fn set_blocked(&mut self, id: GroupId, blocked: bool) -> Result<()> {
        self.ensure_group(id)?;
        self.flags.set_blocked(id, blocked);
        debug!(group = %id, blocked, "Block toggled");
        Ok(())
    }

    pub fn set_paused(&mut self, id: GroupId, paused: bool) -> Result<()> {
        self.ensure_group(id)?;
        self.flags.set_paused(id, paused);
        debug!(group = %id, paused, "Pause toggled");
        Ok(())
    }

    /// The group's own toggles, without ancestors.
    pub fn local_flags(&self, id: &GroupId) -> GroupFlags {
        self.flags.get(id)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    pub fn project(&self) -> TreeView {
        project(&self.store, &self.flags)
    }

    /// Take every event queued by commands that have already committed.
    pub fn drain_events(&mut self) -> Vec<RuleEvent> {
        self.events.drain(..).collect()
    }

    fn ensure_group(&self, id: GroupId) -> Result<()> {
        if self.store.group(&id).is_none() {
            warn!(group = %id, "Toggle on unknown group");
            return Err(RuleError::GroupNotFound(id));
        }
        Ok(())
    }

    fn commit(&mut self, entity: &'static str, result: Result<Applied>) -> Result<Option<NodeRef>> {
        let applied = result.map_err(|err| rejected(entity, err))?;
        Ok(self.install(entity, applied))
    }

    fn install(&mut self, entity: &'static str, applied: Applied) -> Option<NodeRef> {
        self.store = applied.store;
        debug!(entity, revision = self.store.revision(), created = ?applied.created, "Command applied");

        // Queued only after the new snapshot is in place.
        if let Some(node) = applied.created {
            if self.config.reveal_on_create {
                let ancestors = self.store.ancestors(node);
                self.events.push_back(RuleEvent::Reveal { node, ancestors });
            }
        }
        applied.created
    }
}

fn rejected(entity: &'static str, err: RuleError) -> RuleError {
    warn!(entity, kind = err.kind(), error = %err, "Command rejected");
    err
}
