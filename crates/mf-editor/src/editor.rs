//! Template editor session.
//!
//! Owns one template while it is being edited, the shape selection, the
//! interaction controller and view state (grid, zoom). Every document
//! change bumps `revision` and marks the session dirty; `save` writes the
//! template into a [`TemplateLibrary`] and clears the dirty flag.

use crate::input::{InputEvent, Modifiers};
use crate::interaction::{InteractionController, ShapeMutation};
use crate::shortcuts::{ShortcutAction, ShortcutMap, ShortcutScope};
use mf_core::{
    Clock, EditorConfig, Error, FrameKind, FrameSize, Id, Result, Shape, ShapeKind, ShapePatch,
    ShapeUpdate, Template, TemplateLibrary,
};
use mf_render::canvas::Canvas2d;
use mf_render::hit::HitSettings;
use mf_render::paint::{CanvasTheme, RenderOptions, render_shapes};
use serde::Deserialize;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

/// Partial edit of the template frame's styling.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameUpdate {
    #[serde(alias = "frameColor")]
    pub fill_color: Option<String>,
    #[serde(alias = "frameStrokeColor")]
    pub stroke_color: Option<String>,
    #[serde(alias = "frameStrokeWidth")]
    pub stroke_width: Option<f64>,
    #[serde(alias = "frameRotation")]
    pub rotation: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TemplateEditor {
    template: Template,
    selected: Option<Id>,
    controller: InteractionController,
    config: EditorConfig,
    show_grid: bool,
    zoom: f64,
    dirty: bool,
    revision: u64,
}

impl TemplateEditor {
    /// Start a session on a brand-new template.
    pub fn create(config: EditorConfig, clock: &dyn Clock) -> Self {
        let template = Template::new(Id::fresh("template"), clock.now_ms());
        let mut editor = Self::open(template, config);
        editor.dirty = true;
        editor
    }

    /// Start a session on an existing template.
    pub fn open(template: Template, config: EditorConfig) -> Self {
        let controller = InteractionController::new(HitSettings::from(&config), config.snap_grid);
        Self {
            template,
            selected: None,
            controller,
            show_grid: config.show_grid,
            config,
            zoom: 1.0,
            dirty: false,
            revision: 0,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    pub fn selected(&self) -> Option<Id> {
        self.selected
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.template.shape(self.selected?)
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Increases on every change that needs a redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a shape, or clear the selection with `None`. Unknown ids clear it too.
    pub fn select(&mut self, id: Option<Id>) {
        let id = id.filter(|id| self.template.shape(*id).is_some());
        if self.selected != id {
            self.selected = id;
            self.revision += 1;
        }
    }

    // ─── Shapes ──────────────────────────────────────────────────────────

    /// Add a default shape of `kind` on top of the stack and select it.
    pub fn add_shape(&mut self, kind: ShapeKind) -> Id {
        let id = self.template.add_shape(kind, Id::fresh("shape")).id;
        log::debug!("template {}: added {kind} {id}", self.template.id);
        self.selected = Some(id);
        self.touch();
        id
    }

    pub fn update_shape(&mut self, id: Id, update: &ShapeUpdate) -> bool {
        let changed = self.template.update_shape(id, update);
        if changed {
            self.touch();
        }
        changed
    }

    /// Apply a loosely typed edit, keeping only the fields valid for the shape's kind.
    pub fn update_shape_patch(&mut self, id: Id, patch: ShapePatch) -> bool {
        let Some(kind) = self.template.shape(id).map(Shape::kind) else {
            return false;
        };
        let update = patch.resolve(kind);
        self.update_shape(id, &update)
    }

    pub fn delete_shape(&mut self, id: Id) -> bool {
        if self.template.remove_shape(id).is_none() {
            return false;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.controller.state().shape() == Some(id) {
            self.controller.reset();
        }
        self.touch();
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.delete_shape(id),
            None => false,
        }
    }

    /// Copy a shape, offset from the original and on top of the stack. The
    /// copy becomes the selection.
    pub fn duplicate_shape(&mut self, id: Id) -> Option<Id> {
        let copy = self
            .template
            .duplicate_shape(id, Id::fresh("shape"), self.config.duplicate_offset)?
            .id;
        self.selected = Some(copy);
        self.touch();
        Some(copy)
    }

    pub fn duplicate_selected(&mut self) -> Option<Id> {
        self.duplicate_shape(self.selected?)
    }

    // ─── Template properties ─────────────────────────────────────────────

    pub fn set_name(&mut self, name: &str) {
        if self.template.name != name {
            self.template.name = name.to_string();
            self.touch();
        }
    }

    pub fn set_description(&mut self, description: &str) {
        if self.template.description != description {
            self.template.description = description.to_string();
            self.touch();
        }
    }

    /// Change the frame kind; the canvas resets to the kind's medium preset.
    pub fn set_frame_kind(&mut self, kind: FrameKind) {
        self.template.set_frame_kind(kind);
        self.touch();
    }

    pub fn set_frame_size(&mut self, size: FrameSize) {
        self.template.set_frame_size(size);
        self.touch();
    }

    pub fn update_frame(&mut self, update: &FrameUpdate) {
        let frame = &mut self.template.frame;
        if let Some(fill) = &update.fill_color {
            frame.fill_color.clone_from(fill);
        }
        if let Some(stroke) = &update.stroke_color {
            frame.stroke_color.clone_from(stroke);
        }
        match update.stroke_width {
            Some(w) if w.is_finite() => frame.stroke_width = w.max(0.0),
            Some(w) => log::warn!("template {}: dropping frame stroke width {w}", self.template.id),
            None => {}
        }
        match update.rotation {
            Some(r) if r.is_finite() => frame.rotation = r,
            Some(r) => log::warn!("template {}: dropping frame rotation {r}", self.template.id),
            None => {}
        }
        self.touch();
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.revision += 1;
        self.show_grid
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    /// Clamp to the zoom range, rounded to one decimal so steps never drift.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            let zoom = ((zoom * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM);
            if zoom != self.zoom {
                self.zoom = zoom;
                self.revision += 1;
            }
        }
        self.zoom
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event. Returns whether anything visible changed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if let InputEvent::Key { key, modifiers } = event {
            return self.handle_key(key, *modifiers).is_some();
        }
        let before = self.revision;
        let hovered = self.controller.hovered_handle();
        let mutations = self
            .controller
            .handle(event, &self.template.shapes, self.selected);
        for mutation in mutations {
            match mutation {
                ShapeMutation::Select(id) => self.select(id),
                ShapeMutation::Update { id, update } => {
                    self.update_shape(id, &update);
                }
            }
        }
        if self.controller.hovered_handle() != hovered {
            self.revision += 1;
        }
        self.revision != before
    }

    /// Apply the template editor's keyboard bindings. Returns the action
    /// when one was bound and took effect.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(ShortcutScope::Template, key, modifiers)?;
        let applied = match action {
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::Duplicate => self.duplicate_selected().is_some(),
            ShortcutAction::Deselect => {
                let had = self.selected.is_some();
                self.select(None);
                had
            }
            ShortcutAction::ZoomIn => {
                let before = self.zoom;
                self.zoom_in() != before
            }
            ShortcutAction::ZoomOut => {
                let before = self.zoom;
                self.zoom_out() != before
            }
            ShortcutAction::Undo | ShortcutAction::Redo => false,
        };
        applied.then_some(action)
    }

    // ─── Output ──────────────────────────────────────────────────────────

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.template.width,
            height: self.template.height,
            show_grid: self.show_grid,
            grid_spacing: self.config.grid_spacing,
            selected: self.selected,
            hovered_handle: self.controller.hovered_handle(),
            hit: *self.controller.settings(),
        }
    }

    pub fn render(&self, canvas: &mut impl Canvas2d, theme: &CanvasTheme) {
        render_shapes(canvas, &self.template.shapes, &self.render_options(), theme);
    }

    /// Validate, stamp and store the template in `library`.
    pub fn save(&mut self, library: &mut TemplateLibrary, clock: &dyn Clock) -> Result<()> {
        let now = clock.now_ms();
        library.save(self.saved_copy(now)?)?;
        self.mark_saved(now);
        Ok(())
    }

    /// The template as it would be saved at `now_ms`. Leaves the session
    /// untouched, so a failed write can be reported with nothing changed.
    pub fn saved_copy(&self, now_ms: i64) -> Result<Template> {
        if self.template.name.trim().is_empty() {
            return Err(Error::EmptyTemplateName);
        }
        let mut saved = self.template.clone();
        saved.updated_at = now_ms;
        Ok(saved)
    }

    /// Record that [`saved_copy`](Self::saved_copy) at `now_ms` was stored.
    pub fn mark_saved(&mut self, now_ms: i64) {
        self.template.updated_at = now_ms;
        self.dirty = false;
        log::debug!("template {} saved", self.template.id);
    }
}
