//! Application workspace: the flow store, the template library, the
//! storage they persist to, and the periodic timers.
//!
//! Timers are polled, not scheduled: the host calls [`Workspace::tick`]
//! from its own animation frame or interval and the workspace decides,
//! against its clock, what is due.

use crate::editor::TemplateEditor;
use crate::input::Modifiers;
use crate::shortcuts::ShortcutAction;
use crate::store::FlowStore;
use mf_core::{
    EditorConfig, Error, FLOW_KEY, FlowDocument, Id, Result, Storage, TEMPLATES_KEY, Template,
    TemplateLibrary,
};
use mf_render::canvas::Canvas2d;
use mf_render::paint::render_template_preview;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A fixed-period timer polled against a millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    interval_ms: i64,
    next_due: i64,
}

impl Ticker {
    pub fn new(interval_ms: u64, now_ms: i64) -> Self {
        let interval_ms = i64::try_from(interval_ms).unwrap_or(i64::MAX).max(1);
        Self {
            interval_ms,
            next_due: now_ms.saturating_add(interval_ms),
        }
    }

    /// Whether the timer fired. Fires at most once per poll; missed
    /// periods are skipped, not replayed.
    pub fn poll(&mut self, now_ms: i64) -> bool {
        if now_ms < self.next_due {
            return false;
        }
        self.next_due = now_ms.saturating_add(self.interval_ms);
        true
    }
}

/// What one [`Workspace::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub drag_committed: bool,
    /// Nodes whose throughput changed.
    pub simulated: usize,
    pub autosaved: bool,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.drag_committed || self.simulated > 0 || self.autosaved
    }
}

pub struct Workspace<S: Storage> {
    store: FlowStore,
    library: TemplateLibrary,
    storage: S,
    config: EditorConfig,
    rng: StdRng,
    simulation: Ticker,
    autosave: Option<Ticker>,
}

impl<S: Storage> Workspace<S> {
    /// Open a workspace over `store`, loading the template library from
    /// `storage`. A missing or unreadable library starts empty.
    pub fn new(store: FlowStore, storage: S, config: EditorConfig, seed: u64) -> Self {
        let library = match storage.read(TEMPLATES_KEY) {
            Ok(Some(json)) => TemplateLibrary::from_json(&json).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable template library: {e}");
                TemplateLibrary::new()
            }),
            Ok(None) => TemplateLibrary::new(),
            Err(e) => {
                log::warn!("template library unavailable: {e}");
                TemplateLibrary::new()
            }
        };
        let now = store.clock().now_ms();
        let simulation = Ticker::new(config.simulation_interval_ms, now);
        let autosave = config.autosave_interval_ms.map(|ms| Ticker::new(ms, now));
        let mut workspace = Self {
            store,
            library,
            storage,
            config,
            rng: StdRng::seed_from_u64(seed),
            simulation,
            autosave,
        };
        workspace.prune_template_refs();
        workspace
    }

    pub fn store(&self) -> &FlowStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FlowStore {
        &mut self.store
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ─── Templates ───────────────────────────────────────────────────────

    /// Write `library` and adopt it only once the write succeeded, so a
    /// failed save leaves both storage and memory as they were.
    fn commit_library(&mut self, library: TemplateLibrary) -> Result<()> {
        let json = library.to_json()?;
        self.storage.write(TEMPLATES_KEY, &json)?;
        self.library = library;
        Ok(())
    }

    /// Store `template` in the library (replacing one with the same id)
    /// and persist the library.
    pub fn save_template(&mut self, template: Template) -> Result<()> {
        let mut next = self.library.clone();
        next.save(template)?;
        self.commit_library(next)
    }

    /// Remove a template and clear every node assignment to it. Returns
    /// the nodes that lost their template.
    pub fn delete_template(&mut self, id: Id) -> Result<Vec<Id>> {
        let mut next = self.library.clone();
        if next.remove(id).is_none() {
            return Err(Error::TemplateNotFound(id));
        }
        self.commit_library(next)?;
        let affected = self.store.clear_template(id);
        log::debug!("template {id} deleted; {} node(s) reset", affected.len());
        Ok(affected)
    }

    pub fn duplicate_template(&mut self, id: Id) -> Result<Id> {
        let now = self.store.clock().now_ms();
        let mut next = self.library.clone();
        let copy = next.duplicate(id, Id::fresh("template"), now)?.id;
        self.commit_library(next)?;
        Ok(copy)
    }

    /// A template editor on a new, unsaved template.
    pub fn new_editor(&self) -> TemplateEditor {
        TemplateEditor::create(self.config.clone(), self.store.clock())
    }

    /// A template editor on a copy of saved template `id`.
    pub fn open_editor(&self, id: Id) -> Result<TemplateEditor> {
        let template = self.library.get(id).ok_or(Error::TemplateNotFound(id))?;
        Ok(TemplateEditor::open(template.clone(), self.config.clone()))
    }

    /// Save an editor session into the library and persist the library.
    pub fn save_editor(&mut self, editor: &mut TemplateEditor) -> Result<()> {
        let now = self.store.clock().now_ms();
        let mut next = self.library.clone();
        next.save(editor.saved_copy(now)?)?;
        self.commit_library(next)?;
        editor.mark_saved(now);
        Ok(())
    }

    /// Assign a saved template to a node, or clear the assignment.
    pub fn assign_template(&mut self, node: Id, template: Option<Id>) -> Result<()> {
        if let Some(t) = template
            && !self.library.contains(t)
        {
            return Err(Error::TemplateNotFound(t));
        }
        self.store.assign_template(node, template)
    }

    /// Draw node `node`'s template, honouring its frame rotation override.
    /// Returns `false` when the node has no (known) template.
    pub fn render_node(&self, canvas: &mut impl Canvas2d, node: Id) -> bool {
        let Some(flow_node) = self.store.node(node) else {
            return false;
        };
        let Some(template) = self
            .store
            .document()
            .template_of(node)
            .and_then(|t| self.library.get(t))
        else {
            return false;
        };
        render_template_preview(canvas, template, flow_node.data.frame_rotation);
        true
    }

    fn prune_template_refs(&mut self) -> usize {
        let library = &self.library;
        self.store.prune_template_refs(|t| library.contains(t))
    }

    // ─── Flow ────────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let undone = self.store.undo();
        if undone {
            self.prune_template_refs();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.store.redo();
        if redone {
            self.prune_template_refs();
        }
        redone
    }

    /// Flow canvas keyboard bindings; undo/redo also drop assignments to
    /// templates deleted since the restored snapshot.
    pub fn handle_flow_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = self.store.handle_key(key, modifiers);
        if matches!(action, Some(ShortcutAction::Undo | ShortcutAction::Redo)) {
            self.prune_template_refs();
        }
        action
    }

    pub fn save_flow(&mut self) -> Result<()> {
        self.store.save(&mut self.storage)
    }

    pub fn load_flow(&mut self) -> Result<bool> {
        let loaded = self.store.load(&self.storage)?;
        if loaded {
            self.prune_template_refs();
        }
        Ok(loaded)
    }

    pub fn import_flow(&mut self, json: &str) -> Result<()> {
        self.store.import_json(json)?;
        self.prune_template_refs();
        Ok(())
    }

    pub fn export_flow(&self) -> Result<String> {
        self.store.export_json()
    }

    /// Replace the flow with an empty document and forget the saved one.
    pub fn reset_flow(&mut self) -> Result<()> {
        self.store.replace_document(FlowDocument::new(), "Reset flow");
        self.storage.remove(FLOW_KEY)?;
        Ok(())
    }

    // ─── Timers ──────────────────────────────────────────────────────────

    /// Run whatever is due: commit a settled drag, step the throughput
    /// simulation, autosave. A failed autosave is logged and retried on
    /// the next period.
    pub fn tick(&mut self) -> TickReport {
        let now = self.store.clock().now_ms();
        let mut report = TickReport {
            drag_committed: self.store.tick(),
            ..Default::default()
        };
        if self.simulation.poll(now) {
            report.simulated = self.store.simulate_throughput(&mut self.rng);
        }
        if let Some(autosave) = self.autosave.as_mut()
            && autosave.poll(now)
        {
            match self.store.save(&mut self.storage) {
                Ok(()) => report.autosaved = true,
                Err(e) => log::warn!("autosave failed: {e}"),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::{ManualClock, MemoryStorage, StorageError};
    use pretty_assertions::assert_eq;

    #[test]
    fn ticker_fires_once_per_period() {
        let mut t = Ticker::new(2_000, 0);
        assert!(!t.poll(1_999));
        assert!(t.poll(2_000));
        assert!(!t.poll(2_001));
        // Far behind: one fire, then a full period again.
        assert!(t.poll(10_000));
        assert!(!t.poll(11_999));
        assert!(t.poll(12_000));
    }

    fn workspace(storage: MemoryStorage) -> (Workspace<MemoryStorage>, ManualClock) {
        let clock = ManualClock::new(0);
        let config = EditorConfig {
            autosave_interval_ms: Some(5_000),
            ..Default::default()
        };
        let store = FlowStore::demo(config.clone(), Box::new(clock.clone()));
        (Workspace::new(store, storage, config, 42), clock)
    }

    #[test]
    fn corrupt_library_starts_empty() {
        let mut storage = MemoryStorage::new();
        storage.write(TEMPLATES_KEY, "{ not json").unwrap();
        let (ws, _) = workspace(storage);
        assert!(ws.library().is_empty());
    }

    #[test]
    fn tick_simulates_and_autosaves_on_schedule() {
        let (mut ws, clock) = workspace(MemoryStorage::new());
        assert_eq!(ws.tick(), TickReport::default());
        clock.advance(2_000);
        let report = ws.tick();
        assert_eq!(report.simulated, 1);
        assert!(!report.autosaved);
        assert_eq!(ws.store().history().len(), 1);
        clock.advance(3_000);
        assert!(ws.tick().autosaved);
        assert!(ws.storage().read(FLOW_KEY).unwrap().is_some());
    }

    #[test]
    fn failing_autosave_is_reported_by_log_only() {
        let (mut ws, clock) = workspace(MemoryStorage::with_quota(8));
        clock.advance(5_000);
        let report = ws.tick();
        assert!(!report.autosaved);
        assert_eq!(ws.store().document().nodes.len(), 2);
    }

    #[test]
    fn assigning_unknown_template_fails() {
        let (mut ws, _) = workspace(MemoryStorage::new());
        let err = ws
            .assign_template(Id::intern("m-1"), Some(Id::intern("template-missing")))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(_)));
        assert_eq!(ws.store().history().len(), 1);
    }

    #[test]
    fn duplicate_template_persists() {
        let (mut ws, _) = workspace(MemoryStorage::new());
        let mut editor = ws.new_editor();
        editor.set_name("Mixer");
        ws.save_editor(&mut editor).unwrap();
        let copy = ws.duplicate_template(editor.template().id).unwrap();
        assert_eq!(ws.library().get(copy).unwrap().name, "Mixer (Copy)");

        let stored = ws.storage().read(TEMPLATES_KEY).unwrap().unwrap();
        assert_eq!(TemplateLibrary::from_json(&stored).unwrap().len(), 2);
    }

    /// Storage that serves its contents but rejects every write.
    struct ReadOnly(MemoryStorage);

    impl Storage for ReadOnly {
        fn read(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.0.read(key)
        }

        fn write(&mut self, _: &str, _: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }

        fn remove(&mut self, _: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }
    }

    fn read_only_with(template: Template) -> Workspace<ReadOnly> {
        let mut inner = MemoryStorage::new();
        let json = TemplateLibrary::from_templates(vec![template]).to_json().unwrap();
        inner.write(TEMPLATES_KEY, &json).unwrap();
        let store = FlowStore::demo(EditorConfig::default(), Box::new(ManualClock::new(0)));
        Workspace::new(store, ReadOnly(inner), EditorConfig::default(), 7)
    }

    #[test]
    fn failed_editor_save_keeps_session_dirty() {
        let (mut ws, clock) = workspace(MemoryStorage::with_quota(8));
        let mut editor = ws.new_editor();
        editor.set_name("Kiln");
        clock.advance(250);

        let err = ws.save_editor(&mut editor).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::QuotaExceeded)));
        assert!(editor.is_dirty());
        assert_eq!(editor.template().updated_at, 0);
        assert!(ws.library().is_empty());
        assert_eq!(ws.storage().read(TEMPLATES_KEY).unwrap(), None);
    }

    #[test]
    fn failed_delete_keeps_template_and_node_reference() {
        let id = Id::intern("template-kiln");
        let mut template = Template::new(id, 0);
        template.name = "Kiln".to_string();
        let mut ws = read_only_with(template);
        let node = Id::intern("m-1");
        ws.assign_template(node, Some(id)).unwrap();
        let history = ws.store().history().len();

        let err = ws.delete_template(id).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(ws.library().contains(id));
        assert_eq!(ws.store().document().template_of(node), Some(id));
        assert_eq!(ws.store().history().len(), history);
    }

    #[test]
    fn failed_duplicate_adds_nothing() {
        let id = Id::intern("template-vat");
        let mut template = Template::new(id, 0);
        template.name = "Vat".to_string();
        let mut ws = read_only_with(template);
        assert!(ws.duplicate_template(id).is_err());
        assert_eq!(ws.library().len(), 1);

        let mut renamed = ws.library().get(id).unwrap().clone();
        renamed.name = "Big vat".to_string();
        assert!(ws.save_template(renamed).is_err());
        assert_eq!(ws.library().get(id).unwrap().name, "Vat");
    }

    #[test]
    fn reset_flow_forgets_the_save() {
        let (mut ws, _) = workspace(MemoryStorage::new());
        ws.save_flow().unwrap();
        ws.reset_flow().unwrap();
        assert!(ws.store().document().is_empty());
        assert!(!ws.load_flow().unwrap());
        assert!(ws.undo());
        assert_eq!(ws.store().document().nodes.len(), 2);
    }
}
