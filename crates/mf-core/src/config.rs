//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the template editor, the flow store and the workspace timers.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Grid unit that positions and line vertices snap to on release.
    pub snap_grid: f64,
    /// Spacing of the visual grid lines.
    pub grid_spacing: f64,
    /// Pixel radius for line hits and handle grabs.
    pub hit_tolerance: f64,
    /// Distance of the line rotate handle above the line midpoint.
    pub rotate_handle_offset: f64,
    /// Offset applied to a duplicated shape.
    pub duplicate_offset: f64,
    /// Maximum number of history snapshots kept by the flow store.
    pub history_limit: usize,
    /// Quiet period after the last node drag before a history snapshot is taken.
    pub drag_settle_ms: u64,
    /// Period of the throughput simulation tick.
    pub simulation_interval_ms: u64,
    /// Period of the autosave tick. `None` disables autosave.
    pub autosave_interval_ms: Option<u64>,
    /// Whether the template editor starts with the grid visible.
    pub show_grid: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_grid: 10.0,
            grid_spacing: 20.0,
            hit_tolerance: 10.0,
            rotate_handle_offset: 30.0,
            duplicate_offset: 20.0,
            history_limit: 50,
            drag_settle_ms: 500,
            simulation_interval_ms: 2000,
            autosave_interval_ms: None,
            show_grid: true,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
