//! WASM bridge for Machine Flow: exposes the Rust editing engine to the
//! browser front end.
//!
//! Compiled via `wasm-pack build --target web`. Structured results cross
//! the boundary as JSON strings; fallible calls answer
//! `{"ok":true,...}` or `{"ok":false,"error":"..."}`.

mod render2d;
mod storage;

use mf_core::{
    Clock, Connection, EdgeChange, EditorConfig, FrameKind, FrameSize, Id, MachineDataUpdate,
    NodeChange, Position, ShapeKind, ShapePatch, ViewMode,
};
use mf_editor::{FlowStore, FrameUpdate, InputEvent, Modifiers, TemplateEditor, Workspace};
use mf_render::paint::CanvasTheme;
use render2d::WebCanvas;
use serde::Serialize;
use serde::de::DeserializeOwned;
use storage::LocalStorage;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// `Date.now()` as a [`Clock`].
struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

/// The main WASM-facing application controller.
///
/// Holds the workspace (flow store, template library, localStorage) and
/// at most one open template editor session.
#[wasm_bindgen]
pub struct FlowApp {
    workspace: Workspace<LocalStorage>,
    editor: Option<TemplateEditor>,
    theme: CanvasTheme,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryInfo<'a> {
    index: usize,
    length: usize,
    description: &'a str,
    can_undo: bool,
    can_redo: bool,
}

#[wasm_bindgen]
impl FlowApp {
    /// Create the app over `localStorage`, opening on the demo flow.
    /// `config_json` overrides any subset of the editor settings.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> FlowApp {
        console_error_panic_hook_setup();
        console_logger_setup();

        let config = match config_json.as_deref().map(EditorConfig::from_json) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                log::warn!("ignoring editor config: {e}");
                EditorConfig::default()
            }
            None => EditorConfig::default(),
        };
        let store = FlowStore::demo(config.clone(), Box::new(JsClock));
        let seed = js_sys::Date::now() as u64;
        Self {
            workspace: Workspace::new(store, LocalStorage::open(), config, seed),
            editor: None,
            theme: CanvasTheme::light(),
        }
    }

    // ─── Flow document ───────────────────────────────────────────────────

    /// `{nodes, edges, nodeTemplates}` of the current flow.
    pub fn document_json(&self) -> String {
        serde_json::to_string(self.workspace.store().document()).unwrap_or_default()
    }

    /// Changes whenever the flow needs a redraw.
    pub fn revision(&self) -> f64 {
        self.workspace.store().revision() as f64
    }

    pub fn add_node(&mut self, kind: &str, x: f64, y: f64) -> String {
        self.workspace
            .store_mut()
            .add_node(kind, Position::new(x, y))
            .to_string()
    }

    /// Merge a partial `MachineData` JSON object into node `id`.
    pub fn update_node_data(&mut self, id: &str, data_json: &str) -> String {
        let result = parse_json::<MachineDataUpdate>(data_json).and_then(|update| {
            self.workspace
                .store_mut()
                .update_node_data(Id::intern(id), &update)
        });
        outcome(result)
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        Id::existing(id).is_some_and(|id| self.workspace.store_mut().delete_node(id))
    }

    /// Connect two nodes from a `{source, target, sourceHandle?, targetHandle?}`
    /// JSON object. Returns the new edge id, or nothing when ignored.
    pub fn connect(&mut self, connection_json: &str) -> Option<String> {
        let connection: Connection = parse_json(connection_json).ok()?;
        self.workspace
            .store_mut()
            .connect(&connection)
            .map(|id| id.to_string())
    }

    /// Apply a JSON array of node changes from the graph canvas.
    pub fn apply_node_changes(&mut self, changes_json: &str) -> bool {
        match parse_json::<Vec<NodeChange>>(changes_json) {
            Ok(changes) => {
                self.workspace.store_mut().apply_node_changes(&changes);
                true
            }
            Err(e) => {
                log::warn!("node changes rejected: {e}");
                false
            }
        }
    }

    pub fn apply_edge_changes(&mut self, changes_json: &str) -> bool {
        match parse_json::<Vec<EdgeChange>>(changes_json) {
            Ok(changes) => {
                self.workspace.store_mut().apply_edge_changes(&changes);
                true
            }
            Err(e) => {
                log::warn!("edge changes rejected: {e}");
                false
            }
        }
    }

    pub fn node_click(&mut self, id: &str) {
        let id = Id::existing(id);
        self.workspace.store_mut().select(id);
    }

    pub fn pane_click(&mut self) {
        self.workspace.store_mut().pane_click();
    }

    pub fn selected_node(&self) -> Option<String> {
        self.workspace.store().selected_node().map(|id| id.to_string())
    }

    pub fn view_mode(&self) -> String {
        match self.workspace.store().view_mode() {
            ViewMode::Default => "default".to_string(),
            ViewMode::Shapes => "shapes".to_string(),
        }
    }

    pub fn set_view_mode(&mut self, mode: &str) -> bool {
        match parse_name::<ViewMode>(mode) {
            Some(mode) => {
                self.workspace.store_mut().set_view_mode(mode);
                true
            }
            None => false,
        }
    }

    /// Assign a saved template to a node; an absent template clears it.
    pub fn assign_template(&mut self, node: &str, template: Option<String>) -> String {
        let template = template.as_deref().map(Id::intern);
        outcome(self.workspace.assign_template(Id::intern(node), template))
    }

    pub fn set_frame_rotation(&mut self, node: &str, rotation: Option<f64>) -> String {
        outcome(
            self.workspace
                .store_mut()
                .set_frame_rotation(Id::intern(node), rotation),
        )
    }

    pub fn clear_all(&mut self) {
        self.workspace.store_mut().clear_all();
    }

    /// Draw node `node`'s template onto its preview canvas.
    pub fn render_node(&self, ctx: &CanvasRenderingContext2d, node: &str) -> bool {
        let Some(id) = Id::existing(node) else {
            return false;
        };
        self.workspace.render_node(&mut WebCanvas::new(ctx), id)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.workspace.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.workspace.redo()
    }

    /// `{index, length, description, canUndo, canRedo}`.
    pub fn history_json(&self) -> String {
        let store = self.workspace.store();
        let info = HistoryInfo {
            index: store.history().index(),
            length: store.history().len(),
            description: store.history_description(),
            can_undo: store.can_undo(),
            can_redo: store.can_redo(),
        };
        serde_json::to_string(&info).unwrap_or_default()
    }

    /// Flow canvas keyboard handling. Returns `{"changed":bool,"action":"<name>"}`.
    pub fn handle_flow_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let action = self
            .workspace
            .handle_flow_key(key, Modifiers { ctrl, shift, alt, meta });
        key_result(action)
    }

    /// Run due timers: drag commit, throughput simulation, autosave.
    /// Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        self.workspace.tick().changed()
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn save_flow(&mut self) -> String {
        outcome(self.workspace.save_flow())
    }

    /// `{"ok":true,"loaded":bool}`; `loaded` is false when nothing was saved.
    pub fn load_flow(&mut self) -> String {
        match self.workspace.load_flow() {
            Ok(loaded) => serde_json::json!({ "ok": true, "loaded": loaded }).to_string(),
            Err(e) => error_json(&e),
        }
    }

    pub fn import_flow(&mut self, json: &str) -> String {
        outcome(self.workspace.import_flow(json))
    }

    /// `{"ok":true,"fileName":"...","data":"..."}` for a download.
    pub fn export_flow(&self) -> String {
        match self.workspace.export_flow() {
            Ok(data) => {
                let file_name = self.workspace.store().export_file_name();
                serde_json::json!({ "ok": true, "fileName": file_name, "data": data }).to_string()
            }
            Err(e) => error_json(&e),
        }
    }

    // ─── Template library ────────────────────────────────────────────────

    pub fn templates_json(&self) -> String {
        self.workspace.library().to_json().unwrap_or_else(|_| "[]".to_string())
    }

    pub fn delete_template(&mut self, id: &str) -> String {
        match self.workspace.delete_template(Id::intern(id)) {
            Ok(affected) => {
                let nodes: Vec<&str> = affected.iter().map(Id::as_str).collect();
                serde_json::json!({ "ok": true, "clearedNodes": nodes }).to_string()
            }
            Err(e) => error_json(&e),
        }
    }

    pub fn duplicate_template(&mut self, id: &str) -> String {
        match self.workspace.duplicate_template(Id::intern(id)) {
            Ok(copy) => serde_json::json!({ "ok": true, "id": copy.as_str() }).to_string(),
            Err(e) => error_json(&e),
        }
    }

    // ─── Template editor session ─────────────────────────────────────────

    /// Open an editor on a new template, replacing any open session.
    pub fn editor_new(&mut self) {
        self.editor = Some(self.workspace.new_editor());
    }

    /// Open an editor on saved template `id`.
    pub fn editor_open(&mut self, id: &str) -> String {
        match self.workspace.open_editor(Id::intern(id)) {
            Ok(editor) => {
                self.editor = Some(editor);
                outcome(Ok(()))
            }
            Err(e) => error_json(&e),
        }
    }

    pub fn editor_close(&mut self) {
        self.editor = None;
    }

    pub fn editor_is_open(&self) -> bool {
        self.editor.is_some()
    }

    pub fn editor_is_dirty(&self) -> bool {
        self.editor.as_ref().is_some_and(TemplateEditor::is_dirty)
    }

    pub fn editor_revision(&self) -> f64 {
        self.editor.as_ref().map_or(0.0, |e| e.revision() as f64)
    }

    pub fn editor_template_json(&self) -> Option<String> {
        serde_json::to_string(self.editor.as_ref()?.template()).ok()
    }

    pub fn editor_add_shape(&mut self, kind: &str) -> Option<String> {
        let kind = ShapeKind::parse(kind)?;
        Some(self.editor.as_mut()?.add_shape(kind).to_string())
    }

    /// Apply a partial shape JSON object to shape `id`.
    pub fn editor_update_shape(&mut self, id: &str, patch_json: &str) -> bool {
        let (Some(editor), Some(id)) = (self.editor.as_mut(), Id::existing(id)) else {
            return false;
        };
        match parse_json::<ShapePatch>(patch_json) {
            Ok(patch) => editor.update_shape_patch(id, patch),
            Err(e) => {
                log::warn!("shape update rejected: {e}");
                false
            }
        }
    }

    pub fn editor_select(&mut self, id: Option<String>) {
        if let Some(editor) = self.editor.as_mut() {
            editor.select(id.as_deref().and_then(Id::existing));
        }
    }

    pub fn editor_selected(&self) -> Option<String> {
        self.editor.as_ref()?.selected().map(|id| id.to_string())
    }

    pub fn editor_delete_selected(&mut self) -> bool {
        self.editor.as_mut().is_some_and(TemplateEditor::delete_selected)
    }

    pub fn editor_duplicate_selected(&mut self) -> Option<String> {
        self.editor
            .as_mut()?
            .duplicate_selected()
            .map(|id| id.to_string())
    }

    pub fn editor_set_name(&mut self, name: &str) {
        if let Some(editor) = self.editor.as_mut() {
            editor.set_name(name);
        }
    }

    pub fn editor_set_description(&mut self, description: &str) {
        if let Some(editor) = self.editor.as_mut() {
            editor.set_description(description);
        }
    }

    pub fn editor_set_frame_kind(&mut self, kind: &str) -> bool {
        match (self.editor.as_mut(), parse_name::<FrameKind>(kind)) {
            (Some(editor), Some(kind)) => {
                editor.set_frame_kind(kind);
                true
            }
            _ => false,
        }
    }

    pub fn editor_set_frame_size(&mut self, size: &str) -> bool {
        match (self.editor.as_mut(), parse_name::<FrameSize>(size)) {
            (Some(editor), Some(size)) => {
                editor.set_frame_size(size);
                true
            }
            _ => false,
        }
    }

    pub fn editor_update_frame(&mut self, frame_json: &str) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            return false;
        };
        match parse_json::<FrameUpdate>(frame_json) {
            Ok(update) => {
                editor.update_frame(&update);
                true
            }
            Err(e) => {
                log::warn!("frame update rejected: {e}");
                false
            }
        }
    }

    pub fn editor_toggle_grid(&mut self) -> bool {
        self.editor.as_mut().is_some_and(TemplateEditor::toggle_grid)
    }

    pub fn editor_zoom_in(&mut self) -> f64 {
        self.editor.as_mut().map_or(1.0, TemplateEditor::zoom_in)
    }

    pub fn editor_zoom_out(&mut self) -> f64 {
        self.editor.as_mut().map_or(1.0, TemplateEditor::zoom_out)
    }

    /// Pointer pressed on the editor canvas. Returns whether a redraw is needed.
    pub fn editor_pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.editor_input(&InputEvent::PointerDown { x, y })
    }

    pub fn editor_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.editor_input(&InputEvent::PointerMove { x, y })
    }

    pub fn editor_pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.editor_input(&InputEvent::PointerUp { x, y })
    }

    pub fn editor_pointer_leave(&mut self) -> bool {
        self.editor_input(&InputEvent::PointerLeave)
    }

    /// Editor keyboard handling. Returns `{"changed":bool,"action":"<name>"}`.
    pub fn editor_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let action = self
            .editor
            .as_mut()
            .and_then(|e| e.handle_key(key, Modifiers { ctrl, shift, alt, meta }));
        key_result(action)
    }

    pub fn editor_render(&self, ctx: &CanvasRenderingContext2d) {
        if let Some(editor) = self.editor.as_ref() {
            editor.render(&mut WebCanvas::new(ctx), &self.theme);
        }
    }

    /// Save the open session into the template library.
    pub fn editor_save(&mut self) -> String {
        let Some(editor) = self.editor.as_mut() else {
            return serde_json::json!({ "ok": false, "error": "no template is open" }).to_string();
        };
        match self.workspace.save_editor(editor) {
            Ok(()) => {
                serde_json::json!({ "ok": true, "id": editor.template().id.as_str() }).to_string()
            }
            Err(e) => error_json(&e),
        }
    }
}

impl FlowApp {
    fn editor_input(&mut self, event: &InputEvent) -> bool {
        self.editor.as_mut().is_some_and(|e| e.handle_input(event))
    }
}

/// Set the console log level: `error`, `warn`, `info`, `debug` or `trace`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => {
            log::set_max_level(filter);
            true
        }
        Err(_) => false,
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────

fn parse_json<T: DeserializeOwned>(json: &str) -> mf_core::Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a serde enum from its bare wire name, e.g. `"rectangle2x1"`.
fn parse_name<T: DeserializeOwned>(name: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}

fn outcome(result: mf_core::Result<()>) -> String {
    match result {
        Ok(()) => r#"{"ok":true}"#.to_string(),
        Err(e) => error_json(&e),
    }
}

fn error_json(error: &mf_core::Error) -> String {
    serde_json::json!({ "ok": false, "error": error.to_string() }).to_string()
}

fn key_result(action: Option<mf_editor::ShortcutAction>) -> String {
    serde_json::json!({
        "changed": action.is_some(),
        "action": action.map_or("none", |a| a.name()),
    })
    .to_string()
}

// ─── Console logging and panic hook ──────────────────────────────────────

/// Route `log` records to the browser console. Later calls are no-ops.
fn console_logger_setup() {
    #[cfg(target_arch = "wasm32")]
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("console logger already installed");
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Machine Flow WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
