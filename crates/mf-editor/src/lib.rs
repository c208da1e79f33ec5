//! Editing layer for Machine Flow: pointer interaction on the template
//! canvas, the template editor session, and the flow store with its
//! snapshot history.

pub mod editor;
pub mod history;
pub mod input;
pub mod interaction;
pub mod shortcuts;
pub mod store;
pub mod workspace;

pub use editor::{FrameUpdate, TemplateEditor};
pub use history::{History, Snapshot};
pub use input::{InputEvent, Modifiers};
pub use interaction::{InteractionController, InteractionState, ShapeMutation};
pub use shortcuts::{ShortcutAction, ShortcutMap, ShortcutScope};
pub use store::FlowStore;
pub use workspace::{TickReport, Ticker, Workspace};
