//! WASM bindings for rule-builder-core.
//!
//! Exposes the rule builder command surface and its tree projection to
//! JavaScript. Ids cross the boundary as UUID strings.

use wasm_bindgen::prelude::*;

use crate::{
    BuilderConfig, FilterCommand, FilterFields, FilterId, GroupCommand, GroupFields, GroupId,
    Logic, MoveRequest, MoveScope, NodeRef, Operator, RuleBuilder, RuleError,
};

fn js_err(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

fn rule_err(err: RuleError) -> JsError {
    JsError::new(&format!("[{}] {}", err.kind(), err))
}

// ═══════════════════════════════════════════════════════════════════════════
// Builder API
// ═══════════════════════════════════════════════════════════════════════════

/// A wrapper around RuleBuilder for WASM.
#[wasm_bindgen]
pub struct WasmRuleBuilder {
    inner: RuleBuilder,
}

#[wasm_bindgen]
impl WasmRuleBuilder {
    /// Create an empty session. `config_json` is an optional BuilderConfig document.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmRuleBuilder, JsError> {
        let config = match config_json.as_deref() {
            Some(json) => BuilderConfig::from_json(json)
                .map_err(|e| JsError::new(&format!("Invalid config JSON: {}", e)))?,
            None => BuilderConfig::default(),
        };
        Ok(WasmRuleBuilder {
            inner: RuleBuilder::new(config),
        })
    }

    /// Revision of the current snapshot, as a plain JS number like the
    /// `revision` field of `project()`.
    #[wasm_bindgen(getter)]
    pub fn revision(&self) -> f64 {
        self.inner.store().revision() as f64
    }

    /// Create a group. Returns the new group id.
    #[wasm_bindgen(js_name = createGroup)]
    pub fn create_group(
        &mut self,
        title: &str,
        logic: &str,
        parent_id: Option<String>,
    ) -> Result<String, JsError> {
        let logic = parse_logic(logic).map_err(js_err)?;
        let parent = parse_optional_group_id(parent_id.as_deref()).map_err(js_err)?;
        let id = self
            .inner
            .create_group(GroupFields::new(title, logic), parent)
            .map_err(rule_err)?;
        Ok(id.to_string())
    }

    #[wasm_bindgen(js_name = editGroup)]
    pub fn edit_group(&mut self, group_id: &str, title: &str, logic: &str) -> Result<(), JsError> {
        let id = parse_group_id(group_id).map_err(js_err)?;
        let logic = parse_logic(logic).map_err(js_err)?;
        self.inner
            .edit_group(id, GroupFields::new(title, logic))
            .map_err(rule_err)
    }

    /// Flip a group between AND and OR.
    #[wasm_bindgen(js_name = toggleLogic)]
    pub fn toggle_logic(&mut self, group_id: &str) -> Result<(), JsError> {
        let id = parse_group_id(group_id).map_err(js_err)?;
        self.inner.toggle_logic(id).map_err(rule_err)
    }

    /// Create a filter under `parent_id`. Returns the new filter id.
    #[wasm_bindgen(js_name = createFilter)]
    pub fn create_filter(
        &mut self,
        field: &str,
        operator: &str,
        value: &str,
        parent_id: &str,
    ) -> Result<String, JsError> {
        let operator = parse_operator(operator).map_err(js_err)?;
        let parent = parse_group_id(parent_id).map_err(js_err)?;
        let id = self
            .inner
            .create_filter(FilterFields::new(field, operator, value), parent)
            .map_err(rule_err)?;
        Ok(id.to_string())
    }

    #[wasm_bindgen(js_name = editFilter)]
    pub fn edit_filter(
        &mut self,
        filter_id: &str,
        field: &str,
        operator: &str,
        value: &str,
    ) -> Result<(), JsError> {
        let id: FilterId = filter_id
            .parse()
            .map_err(|e| JsError::new(&format!("Invalid filter id: {}", e)))?;
        let operator = parse_operator(operator).map_err(js_err)?;
        self.inner
            .edit_filter(id, FilterFields::new(field, operator, value))
            .map_err(rule_err)
    }

    /// Apply a group command given as JSON (`{"action": "CREATE" | "SUB_CREATE" | "EDIT", ...}`).
    /// Returns the created node as JSON, or `null` for edits.
    #[wasm_bindgen(js_name = dispatchGroup)]
    pub fn dispatch_group(&mut self, command_json: &str) -> Result<String, JsError> {
        let command: GroupCommand = serde_json::from_str(command_json)
            .map_err(|e| JsError::new(&format!("Invalid group command JSON: {}", e)))?;
        let created = self.inner.dispatch_group(command).map_err(rule_err)?;
        created_json(created)
    }

    /// Apply a filter command given as JSON (`{"action": "CREATE" | "EDIT", ...}`).
    #[wasm_bindgen(js_name = dispatchFilter)]
    pub fn dispatch_filter(&mut self, command_json: &str) -> Result<String, JsError> {
        let command: FilterCommand = serde_json::from_str(command_json)
            .map_err(|e| JsError::new(&format!("Invalid filter command JSON: {}", e)))?;
        let created = self.inner.dispatch_filter(command).map_err(rule_err)?;
        created_json(created)
    }

    /// Apply a drop. Parent ids are `undefined` for the top-level list.
    /// Returns whether the order changed.
    #[wasm_bindgen(js_name = moveNode)]
    pub fn move_node(
        &mut self,
        from_index: usize,
        to_index: usize,
        dragged_parent_id: Option<String>,
        target_parent_id: Option<String>,
    ) -> Result<bool, JsError> {
        let dragged = parse_optional_group_id(dragged_parent_id.as_deref()).map_err(js_err)?;
        let target = parse_optional_group_id(target_parent_id.as_deref()).map_err(js_err)?;
        let request = MoveRequest {
            from_index,
            to_index,
            dragged_scope: MoveScope::from(dragged),
            target_scope: MoveScope::from(target),
        };
        self.inner.move_node(request).map_err(rule_err)
    }

    #[wasm_bindgen(js_name = setBlocked)]
    pub fn set_blocked(&mut self, group_id: &str, blocked: bool) -> Result<(), JsError> {
        let id = parse_group_id(group_id).map_err(js_err)?;
        self.inner.set_blocked(id, blocked).map_err(rule_err)
    }

    #[wasm_bindgen(js_name = setPaused)]
    pub fn set_paused(&mut self, group_id: &str, paused: bool) -> Result<(), JsError> {
        let id = parse_group_id(group_id).map_err(js_err)?;
        self.inner.set_paused(id, paused).map_err(rule_err)
    }

    /// The tree view as a JS object.
    #[wasm_bindgen]
    pub fn project(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.inner.project()).map_err(js_err)
    }

    /// The tree view as a JSON string.
    #[wasm_bindgen(js_name = projectJson)]
    pub fn project_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.inner.project()).map_err(js_err)
    }

    /// Pending reveal events as a JSON array. Clears the queue.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsError> {
        serde_json::to_string(&self.inner.drain_events()).map_err(js_err)
    }
}

fn created_json(created: Option<NodeRef>) -> Result<String, JsError> {
    serde_json::to_string(&created).map_err(js_err)
}

// ═══════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════

fn parse_group_id(raw: &str) -> Result<GroupId, String> {
    raw.parse().map_err(|e| format!("Invalid group id '{}': {}", raw, e))
}

fn parse_optional_group_id(raw: Option<&str>) -> Result<Option<GroupId>, String> {
    match raw {
        None | Some("") | Some("root") => Ok(None),
        Some(id) => parse_group_id(id).map(Some),
    }
}

fn parse_logic(raw: &str) -> Result<Logic, String> {
    match raw {
        "AND" | "and" | "And" => Ok(Logic::And),
        "OR" | "or" | "Or" => Ok(Logic::Or),
        _ => Err(format!("Invalid logic '{}'. Use: AND or OR", raw)),
    }
}

fn parse_operator(raw: &str) -> Result<Operator, String> {
    Operator::all()
        .iter()
        .copied()
        .find(|op| op.display_name() == raw)
        .ok_or_else(|| {
            format!("Invalid operator '{}'. Use: equals, not equals, is after, or is before", raw)
        })
}

// ═══════════════════════════════════════════════════════════════════════════
// Schema/Metadata API (for UI building)
// ═══════════════════════════════════════════════════════════════════════════

/// Get all logic types as JSON array.
#[wasm_bindgen(js_name = getLogicTypes)]
pub fn get_logic_types() -> Result<String, JsError> {
    let types: Vec<_> = Logic::all()
        .iter()
        .map(|l| serde_json::json!({
            "value": l,
            "display_name": l.display_name(),
        }))
        .collect();
    serde_json::to_string(&types).map_err(js_err)
}

/// Get all filter operators as JSON array.
#[wasm_bindgen(js_name = getOperators)]
pub fn get_operators() -> Result<String, JsError> {
    let ops: Vec<_> = Operator::all()
        .iter()
        .map(|o| serde_json::json!({
            "value": o,
            "display_name": o.display_name(),
        }))
        .collect();
    serde_json::to_string(&ops).map_err(js_err)
}

/// Route `tracing` output to the browser console. Call once at startup.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    tracing_wasm::set_as_global_default();
}
