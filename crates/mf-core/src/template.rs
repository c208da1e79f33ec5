//! Templates: named compositions of shapes inside an outer frame, and
//! the library they are saved to.

use crate::error::{Error, Result};
use crate::id::Id;
use crate::shape::{Shape, ShapeKind, ShapeUpdate, create_default_shape, merge_shape_update};
use serde::{Deserialize, Serialize};

// ─── Frame ───────────────────────────────────────────────────────────────

/// Outer silhouette of a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    #[default]
    #[serde(rename = "rectangle")]
    Square,
    /// Twice as wide as tall.
    #[serde(rename = "rectangle2x1")]
    Wide,
    /// Twice as tall as wide.
    #[serde(rename = "rectangle1x2")]
    Tall,
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "triangle")]
    Triangle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FrameKind {
    pub const ALL: [FrameKind; 5] = [
        FrameKind::Square,
        FrameKind::Wide,
        FrameKind::Tall,
        FrameKind::Circle,
        FrameKind::Triangle,
    ];

    /// Canvas `(width, height)` for a size preset.
    pub fn dimensions(self, size: FrameSize) -> (f64, f64) {
        let step = match size {
            FrameSize::Small => 0,
            FrameSize::Medium => 1,
            FrameSize::Large => 2,
        };
        let table: [(f64, f64); 3] = match self {
            FrameKind::Square | FrameKind::Circle => {
                [(100.0, 100.0), (150.0, 150.0), (200.0, 200.0)]
            }
            FrameKind::Wide => [(160.0, 80.0), (240.0, 120.0), (320.0, 160.0)],
            FrameKind::Tall => [(80.0, 160.0), (120.0, 240.0), (160.0, 320.0)],
            FrameKind::Triangle => [(120.0, 104.0), (180.0, 156.0), (240.0, 208.0)],
        };
        table[step]
    }

    /// Whether the frame is drawn as a rounded rectangle.
    pub fn is_rectangular(self) -> bool {
        matches!(self, FrameKind::Square | FrameKind::Wide | FrameKind::Tall)
    }
}

/// Frame styling. Serialised flat into the template object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    #[serde(rename = "frameType")]
    pub kind: FrameKind,
    #[serde(rename = "frameColor")]
    pub fill_color: String,
    #[serde(rename = "frameStrokeColor")]
    pub stroke_color: String,
    #[serde(rename = "frameStrokeWidth")]
    pub stroke_width: f64,
    /// Degrees.
    #[serde(rename = "frameRotation")]
    pub rotation: f64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            kind: FrameKind::Square,
            fill_color: "#f8fafc".to_string(),
            stroke_color: "#3b82f6".to_string(),
            stroke_width: 2.0,
            rotation: 0.0,
        }
    }
}

// ─── Template ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub frame: Frame,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Template {
    /// An empty template with the default frame at its medium size.
    pub fn new(id: Id, now_ms: i64) -> Self {
        let frame = Frame::default();
        let (width, height) = frame.kind.dimensions(FrameSize::Medium);
        Self {
            id,
            name: "New Template".to_string(),
            description: String::new(),
            thumbnail: None,
            shapes: Vec::new(),
            width,
            height,
            frame,
            created_at: now_ms,
            updated_at: now_ms,
            tags: Vec::new(),
        }
    }

    pub fn shape(&self, id: Id) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    fn next_z(&self) -> i32 {
        i32::try_from(self.shapes.len()).unwrap_or(i32::MAX)
    }

    /// Append a default shape of `kind`, centred in the canvas and stacked on top.
    pub fn add_shape(&mut self, kind: ShapeKind, id: Id) -> &Shape {
        let mut shape = create_default_shape(kind, id);
        let (cx, cy) = (self.width / 2.0, self.height / 2.0);
        (shape.x, shape.y) = match kind {
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Triangle => {
                (cx - 25.0, cy - 25.0)
            }
            ShapeKind::Line => (cx - 40.0, cy),
            ShapeKind::Text => (cx - 30.0, cy),
        };
        shape.z_index = self.next_z();
        self.shapes.push(shape);
        let last = self.shapes.len() - 1;
        &self.shapes[last]
    }

    /// Merge `update` into shape `id`. Returns `false` when no such shape exists.
    pub fn update_shape(&mut self, id: Id, update: &ShapeUpdate) -> bool {
        match self.shapes.iter_mut().find(|s| s.id == id) {
            Some(shape) => {
                *shape = merge_shape_update(shape, update);
                true
            }
            None => false,
        }
    }

    pub fn remove_shape(&mut self, id: Id) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        Some(self.shapes.remove(index))
    }

    /// Copy shape `id` under `new_id`, offset and placed on top of the stack.
    pub fn duplicate_shape(&mut self, id: Id, new_id: Id, offset: f64) -> Option<&Shape> {
        let copy = self.shape(id)?.duplicate(new_id, offset, self.next_z());
        self.shapes.push(copy);
        self.shapes.last()
    }

    /// Switch the frame kind and reset the canvas to that kind's medium preset.
    pub fn set_frame_kind(&mut self, kind: FrameKind) {
        self.frame.kind = kind;
        self.set_frame_size(FrameSize::Medium);
    }

    pub fn set_frame_size(&mut self, size: FrameSize) {
        (self.width, self.height) = self.frame.kind.dimensions(size);
    }

    /// Deep copy under a new id, named "{name} (Copy)" with fresh timestamps.
    pub fn duplicate(&self, id: Id, now_ms: i64) -> Template {
        Template {
            id,
            name: format!("{} (Copy)", self.name),
            created_at: now_ms,
            updated_at: now_ms,
            ..self.clone()
        }
    }
}

// ─── Library ─────────────────────────────────────────────────────────────

/// The saved template collection, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn get(&self, id: Id) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Insert, or replace in place when a template with the same id exists.
    ///
    /// Rejects a blank name.
    pub fn save(&mut self, template: Template) -> Result<()> {
        if template.name.trim().is_empty() {
            return Err(Error::EmptyTemplateName);
        }
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
        Ok(())
    }

    pub fn remove(&mut self, id: Id) -> Option<Template> {
        let index = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(index))
    }

    /// Append a copy of template `id` under `new_id`.
    pub fn duplicate(&mut self, id: Id, new_id: Id, now_ms: i64) -> Result<&Template> {
        let copy = self
            .get(id)
            .ok_or(Error::TemplateNotFound(id))?
            .duplicate(new_id, now_ms);
        self.templates.push(copy);
        Ok(&self.templates[self.templates.len() - 1])
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
