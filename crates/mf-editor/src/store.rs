//! Flow document store with undo/redo.
//!
//! Wraps a [`FlowDocument`] with a bounded snapshot [`History`]. Every
//! significant mutation appends a snapshot with a description. Two
//! exceptions:
//!
//! - the throughput simulation tick never touches history;
//! - node drags from the graph canvas are coalesced: positions apply
//!   immediately, and one "Node position changed" snapshot is pushed once
//!   no further move has arrived for `drag_settle_ms` (see [`FlowStore::tick`]).
//!
//! Undo/redo replace the whole document with the snapshot under the
//! cursor.

use crate::history::History;
use crate::input::Modifiers;
use crate::shortcuts::{ShortcutAction, ShortcutMap, ShortcutScope};
use chrono::{DateTime, Utc};
use mf_core::persist::export_file_name;
use mf_core::{
    Clock, Connection, EdgeChange, EditorConfig, Error, FLOW_KEY, FlowDocument, FlowNode, Id,
    MachineDataUpdate, NodeChange, Position, Result, SavedFlow, Storage, ViewMode,
};
use rand::Rng;

const POSITION_CHANGED: &str = "Node position changed";

pub struct FlowStore {
    doc: FlowDocument,
    history: History<FlowDocument>,
    selected_node: Option<Id>,
    view_mode: ViewMode,
    /// Time of the last unrecorded position change.
    pending_drag: Option<i64>,
    config: EditorConfig,
    clock: Box<dyn Clock>,
    revision: u64,
    last_saved: Option<DateTime<Utc>>,
}

impl FlowStore {
    /// A store holding `doc`, recorded as the first history entry.
    pub fn new(doc: FlowDocument, config: EditorConfig, clock: Box<dyn Clock>) -> Self {
        let mut history = History::new(config.history_limit);
        history.push(doc.clone(), "Initial state", clock.now());
        Self {
            doc,
            history,
            selected_node: None,
            view_mode: ViewMode::default(),
            pending_drag: None,
            config,
            clock,
            revision: 0,
            last_saved: None,
        }
    }

    /// A store holding the sample production line.
    pub fn demo(config: EditorConfig, clock: Box<dyn Clock>) -> Self {
        Self::new(FlowDocument::demo(), config, clock)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn document(&self) -> &FlowDocument {
        &self.doc
    }

    pub fn node(&self, id: Id) -> Option<&FlowNode> {
        self.doc.node(id)
    }

    pub fn selected_node(&self) -> Option<Id> {
        self.selected_node
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Increases on every change that needs a redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn history(&self) -> &History<FlowDocument> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Description of the snapshot under the cursor.
    pub fn history_description(&self) -> &str {
        self.history
            .current()
            .map_or("No actions", |s| s.description.as_str())
    }

    pub fn has_pending_drag(&self) -> bool {
        self.pending_drag.is_some()
    }

    // ─── History plumbing ────────────────────────────────────────────────

    fn record(&mut self, description: impl Into<String>) {
        self.history.push(self.doc.clone(), description, self.clock.now());
        self.revision += 1;
    }

    /// Record a pending drag now, ahead of another history operation.
    fn flush_pending(&mut self) {
        if self.pending_drag.take().is_some() {
            self.record(POSITION_CHANGED);
        }
    }

    /// Commit a settled drag. Returns whether a snapshot was recorded.
    pub fn tick(&mut self) -> bool {
        let Some(last) = self.pending_drag else {
            return false;
        };
        let settle = i64::try_from(self.config.drag_settle_ms).unwrap_or(i64::MAX);
        if self.clock.now_ms().saturating_sub(last) < settle {
            return false;
        }
        self.flush_pending();
        true
    }

    fn restore(&mut self, doc: FlowDocument) {
        self.doc = doc;
        if let Some(id) = self.selected_node
            && self.doc.node(id).is_none()
        {
            self.selected_node = None;
        }
        self.revision += 1;
    }

    pub fn undo(&mut self) -> bool {
        self.flush_pending();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        log::debug!("undo to: {}", snapshot.description);
        let doc = snapshot.state.clone();
        self.restore(doc);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        log::debug!("redo to: {}", snapshot.description);
        let doc = snapshot.state.clone();
        self.restore(doc);
        true
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Add an idle machine node labelled after `kind`.
    pub fn add_node(&mut self, kind: &str, position: Position) -> Id {
        self.flush_pending();
        let id = self
            .doc
            .add_node(Id::fresh("m"), kind, position, self.clock.today())
            .id;
        self.record(format!("Added {kind}"));
        id
    }

    pub fn update_node_data(&mut self, id: Id, update: &MachineDataUpdate) -> Result<()> {
        self.flush_pending();
        self.doc.update_node_data(id, update)?;
        let label = self.doc.node(id).map_or("node", |n| n.data.label.as_str()).to_string();
        let description = match update.status {
            Some(status) => format!("Set {label} status to {}", status.as_str()),
            None => format!("Updated {label}"),
        };
        self.record(description);
        Ok(())
    }

    /// Remove a node with its edges and template assignment.
    pub fn delete_node(&mut self, id: Id) -> bool {
        self.flush_pending();
        let Some(node) = self.doc.delete_node(id) else {
            return false;
        };
        if self.selected_node == Some(id) {
            self.selected_node = None;
        }
        self.record(format!("Deleted {}", node.data.label));
        true
    }

    /// Connect two nodes. Ignored connections leave history untouched.
    pub fn connect(&mut self, connection: &Connection) -> Option<Id> {
        self.flush_pending();
        let id = self.doc.connect(connection)?.id;
        self.record("Connected nodes");
        Some(id)
    }

    pub fn delete_edge(&mut self, id: Id) -> bool {
        self.flush_pending();
        if self.doc.delete_edge(id).is_none() {
            return false;
        }
        self.record("Removed connection");
        true
    }

    /// Assign `template` to a node, or clear its assignment with `None`.
    /// The caller checks that the template exists.
    pub fn assign_template(&mut self, node: Id, template: Option<Id>) -> Result<()> {
        self.flush_pending();
        if self.doc.template_of(node) == template && self.doc.node(node).is_some() {
            return Ok(());
        }
        self.doc.assign_template(node, template)?;
        self.record(match template {
            Some(_) => "Assigned template",
            None => "Cleared template",
        });
        Ok(())
    }

    pub fn set_frame_rotation(&mut self, node: Id, rotation: Option<f64>) -> Result<()> {
        self.flush_pending();
        self.doc.set_frame_rotation(node, rotation)?;
        self.record("Rotated frame");
        Ok(())
    }

    /// Clear every node's assignment to `template`, as one history entry.
    pub fn clear_template(&mut self, template: Id) -> Vec<Id> {
        self.flush_pending();
        let affected = self.doc.clear_template(template);
        if !affected.is_empty() {
            self.record("Cleared deleted template");
        }
        affected
    }

    pub fn clear_all(&mut self) {
        self.flush_pending();
        self.doc.clear();
        self.selected_node = None;
        self.record("Cleared flow");
    }

    /// Replace the whole document, as one history entry.
    pub fn replace_document(&mut self, doc: FlowDocument, description: &str) {
        self.flush_pending();
        self.restore(doc);
        self.record(description);
    }

    /// Drop assignments to templates `is_known` rejects. Not recorded in history.
    pub fn prune_template_refs(&mut self, is_known: impl Fn(Id) -> bool) -> usize {
        let removed = self.doc.prune_template_refs(is_known);
        if removed > 0 {
            log::warn!("dropped {removed} assignment(s) to missing templates");
            self.revision += 1;
        }
        removed
    }

    /// Jitter active nodes' throughput. Not recorded in history.
    pub fn simulate_throughput<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let changed = self.doc.simulate_throughput(rng);
        if changed > 0 {
            self.revision += 1;
        }
        changed
    }

    // ─── Graph canvas callbacks ──────────────────────────────────────────

    /// Apply node changes reported by the graph canvas.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        let mut removed = Vec::new();
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if self.doc.set_position(*id, *position).is_ok() {
                        self.pending_drag = Some(self.clock.now_ms());
                        self.revision += 1;
                    } else {
                        log::debug!("position change for unknown node {id}");
                    }
                }
                NodeChange::Remove { id } => removed.push(*id),
            }
        }
        if removed.is_empty() {
            return;
        }
        self.flush_pending();
        let mut any = false;
        for id in removed {
            if self.doc.delete_node(id).is_some() {
                any = true;
                if self.selected_node == Some(id) {
                    self.selected_node = None;
                }
            }
        }
        if any {
            self.record("Deleted nodes");
        }
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        self.flush_pending();
        let mut any = false;
        for change in changes {
            let EdgeChange::Remove { id } = change;
            any |= self.doc.delete_edge(*id).is_some();
        }
        if any {
            self.record("Removed connection");
        }
    }

    pub fn node_click(&mut self, id: Id) {
        self.select(Some(id));
    }

    pub fn pane_click(&mut self) {
        self.select(None);
    }

    pub fn select(&mut self, id: Option<Id>) {
        let id = id.filter(|id| self.doc.node(*id).is_some());
        if self.selected_node != id {
            self.selected_node = id;
            self.revision += 1;
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.revision += 1;
        }
    }

    /// Flow canvas keyboard bindings: undo/redo, delete the selected node,
    /// Escape to deselect.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(ShortcutScope::Flow, key, modifiers)?;
        let applied = match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => match self.selected_node {
                Some(id) => self.delete_node(id),
                None => false,
            },
            ShortcutAction::Deselect => {
                let had = self.selected_node.is_some();
                self.pane_click();
                had
            }
            ShortcutAction::Duplicate | ShortcutAction::ZoomIn | ShortcutAction::ZoomOut => false,
        };
        applied.then_some(action)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Write the document under [`FLOW_KEY`].
    pub fn save<S: Storage + ?Sized>(&mut self, storage: &mut S) -> Result<()> {
        let at = self.clock.now();
        let json = SavedFlow::capture(&self.doc, at).to_json()?;
        storage.write(FLOW_KEY, &json)?;
        self.last_saved = Some(at);
        log::debug!("flow saved ({} nodes)", self.doc.nodes.len());
        Ok(())
    }

    /// Replace the document with the saved one. `Ok(false)` when nothing was saved.
    pub fn load<S: Storage + ?Sized>(&mut self, storage: &S) -> Result<bool> {
        let Some(json) = storage.read(FLOW_KEY)? else {
            return Ok(false);
        };
        let doc = SavedFlow::parse(&json)?.into_document();
        self.replace_document(doc, "Loaded saved flow");
        Ok(true)
    }

    /// Replace the document with an exported file's contents. On failure
    /// the current document is untouched.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let doc = SavedFlow::parse(json)?.into_document();
        self.replace_document(doc, "Imported flow");
        Ok(())
    }

    pub fn export_json(&self) -> Result<String> {
        if self.doc.is_empty() {
            return Err(Error::InvalidFormat("nothing to export".to_string()));
        }
        SavedFlow::capture(&self.doc, self.clock.now()).to_json()
    }

    pub fn export_file_name(&self) -> String {
        export_file_name(self.clock.now())
    }
}
