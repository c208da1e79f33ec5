//! Pointer-driven direct manipulation of template shapes.
//!
//! The controller is a small gesture state machine. It reads the current
//! shapes and selection, and answers each input event with the mutations
//! the editor should apply. Positions and vertices follow the pointer
//! unsnapped while a gesture runs; the release (or the pointer leaving
//! the canvas) snaps the result to the grid and returns to `Idle`.

use crate::input::InputEvent;
use kurbo::Point;
use mf_core::geometry::{angle_from, polyline_midpoint, rotate_points, snap, snap_points};
use mf_core::shape::LinePoints;
use mf_core::{Id, Shape, ShapeUpdate};
use mf_render::hit::{Handle, HitSettings, handle_at_point, hit_test};

/// The gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    /// Moving a whole shape. `offset` is pointer minus shape position at grab time.
    Dragging { shape: Id, offset: Point },
    /// Moving one vertex of a line.
    ResizingLinePoint { shape: Id, index: usize },
    /// Spinning a line about its midpoint. `last_angle` is the pointer
    /// angle seen by the previous event, in radians.
    RotatingLine { shape: Id, last_angle: f64 },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn shape(&self) -> Option<Id> {
        match *self {
            InteractionState::Idle => None,
            InteractionState::Dragging { shape, .. }
            | InteractionState::ResizingLinePoint { shape, .. }
            | InteractionState::RotatingLine { shape, .. } => Some(shape),
        }
    }
}

/// A change the controller asks the editor to make.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeMutation {
    Select(Option<Id>),
    Update { id: Id, update: ShapeUpdate },
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    settings: HitSettings,
    snap_grid: f64,
    /// Handle of the selected line under the pointer while idle.
    hovered: Option<Handle>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(HitSettings::default(), 10.0)
    }
}

impl InteractionController {
    pub fn new(settings: HitSettings, snap_grid: f64) -> Self {
        Self {
            state: InteractionState::Idle,
            settings,
            snap_grid,
            hovered: None,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn hovered_handle(&self) -> Option<Handle> {
        self.hovered
    }

    pub fn settings(&self) -> &HitSettings {
        &self.settings
    }

    /// Drop any gesture without committing it.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
        self.hovered = None;
    }

    /// Handle one input event against the current shapes and selection.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        shapes: &[Shape],
        selected: Option<Id>,
    ) -> Vec<ShapeMutation> {
        match *event {
            InputEvent::PointerDown { x, y } => {
                self.pointer_down(Point::new(x, y), shapes, selected)
            }
            InputEvent::PointerMove { x, y } => {
                self.pointer_move(Point::new(x, y), shapes, selected)
            }
            InputEvent::PointerUp { .. } | InputEvent::PointerLeave => self.release(shapes),
            InputEvent::Key { .. } => Vec::new(),
        }
    }

    fn pointer_down(
        &mut self,
        p: Point,
        shapes: &[Shape],
        selected: Option<Id>,
    ) -> Vec<ShapeMutation> {
        // Handles of the selected line take priority over shapes beneath them.
        if let Some(shape) = selected.and_then(|id| find(shapes, id))
            && let Some(handle) = handle_at_point(p.x, p.y, shape, &self.settings)
        {
            self.state = match handle {
                Handle::Vertex(index) => InteractionState::ResizingLinePoint {
                    shape: shape.id,
                    index,
                },
                Handle::Rotate => {
                    let mid = shape.line_midpoint().unwrap_or(p);
                    InteractionState::RotatingLine {
                        shape: shape.id,
                        last_angle: angle_from(mid, p),
                    }
                }
            };
            log::debug!("interaction: {:?}", self.state);
            return Vec::new();
        }

        match hit_test(shapes, p.x, p.y, &self.settings).and_then(|id| find(shapes, id)) {
            Some(shape) => {
                self.state = InteractionState::Dragging {
                    shape: shape.id,
                    offset: p - shape.position().to_vec2(),
                };
                self.hovered = None;
                log::debug!("interaction: {:?}", self.state);
                vec![ShapeMutation::Select(Some(shape.id))]
            }
            None => {
                self.state = InteractionState::Idle;
                self.hovered = None;
                vec![ShapeMutation::Select(None)]
            }
        }
    }

    fn pointer_move(
        &mut self,
        p: Point,
        shapes: &[Shape],
        selected: Option<Id>,
    ) -> Vec<ShapeMutation> {
        let Some(id) = self.state.shape() else {
            self.hovered = selected
                .and_then(|id| find(shapes, id))
                .and_then(|shape| handle_at_point(p.x, p.y, shape, &self.settings));
            return Vec::new();
        };
        let Some(shape) = find(shapes, id) else {
            log::debug!("interaction: shape {id} vanished mid-gesture");
            self.reset();
            return Vec::new();
        };

        match self.state {
            InteractionState::Idle => Vec::new(),
            InteractionState::Dragging { offset, .. } => {
                let pos = Point::new(p.x - offset.x, p.y - offset.y);
                vec![ShapeMutation::Update {
                    id,
                    update: ShapeUpdate::position(pos.x, pos.y),
                }]
            }
            InteractionState::ResizingLinePoint { index, .. } => {
                let Some(points) = shape.line_points() else {
                    return Vec::new();
                };
                if 2 * index + 1 >= points.len() {
                    return Vec::new();
                }
                let mut points = LinePoints::from_slice(points);
                points[2 * index] = p.x - shape.x;
                points[2 * index + 1] = p.y - shape.y;
                vec![ShapeMutation::Update {
                    id,
                    update: ShapeUpdate::line_points(points),
                }]
            }
            InteractionState::RotatingLine { last_angle, .. } => {
                let (Some(points), Some(mid)) = (shape.line_points(), shape.line_midpoint()) else {
                    return Vec::new();
                };
                let angle = angle_from(mid, p);
                self.state = InteractionState::RotatingLine {
                    shape: id,
                    last_angle: angle,
                };
                let mut points = LinePoints::from_slice(points);
                let Some(local_mid) = polyline_midpoint(&points) else {
                    return Vec::new();
                };
                rotate_points(&mut points, local_mid, angle - last_angle);
                vec![ShapeMutation::Update {
                    id,
                    update: ShapeUpdate::line_points(points),
                }]
            }
        }
    }

    fn release(&mut self, shapes: &[Shape]) -> Vec<ShapeMutation> {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let Some(shape) = state.shape().and_then(|id| find(shapes, id)) else {
            return Vec::new();
        };
        log::debug!("interaction: commit {state:?}");

        let update = match state {
            InteractionState::Idle => return Vec::new(),
            InteractionState::Dragging { .. } => ShapeUpdate::position(
                snap(shape.x, self.snap_grid),
                snap(shape.y, self.snap_grid),
            ),
            InteractionState::ResizingLinePoint { .. } | InteractionState::RotatingLine { .. } => {
                let Some(points) = shape.line_points() else {
                    return Vec::new();
                };
                let mut points = LinePoints::from_slice(points);
                snap_points(&mut points, self.snap_grid);
                ShapeUpdate::line_points(points)
            }
        };
        vec![ShapeMutation::Update {
            id: shape.id,
            update,
        }]
    }
}

fn find(shapes: &[Shape], id: Id) -> Option<&Shape> {
    shapes.iter().find(|s| s.id == id)
}
