pub mod clock;
pub mod config;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod id;
pub mod persist;
pub mod shape;
pub mod storage;
pub mod template;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EditorConfig;
pub use error::{Error, Result, StorageError};
pub use flow::{
    Connection, EdgeChange, FlowDocument, FlowEdge, FlowNode, MachineData, MachineDataUpdate,
    MachineStatus, NodeChange, Position, ViewMode,
};
pub use id::Id;
pub use persist::{FLOW_KEY, SavedFlow, TEMPLATES_KEY};
pub use shape::{
    Geometry, GeometryUpdate, Shape, ShapeKind, ShapePatch, ShapeUpdate, StrokeStyle, TextAlign,
    create_default_shape, merge_shape_update, paint_order,
};
pub use storage::{MemoryStorage, Storage};
pub use template::{Frame, FrameKind, FrameSize, Template, TemplateLibrary};
