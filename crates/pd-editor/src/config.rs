//! Editor configuration.
//!
//! Every field has a default; a JSON config only needs the keys it
//! overrides.

use crate::error::EditorError;
use pd_core::model::{DEFAULT_Z_INDEX, PagePreset};
use pd_core::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.2,
            max: 3.0,
            step: 0.1,
            initial: 0.6,
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Screen offsets of the floating text toolbar relative to the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    /// Distance above the element's top edge.
    pub above: f64,
    /// Distance below the element's bottom edge when flipped.
    pub below: f64,
    /// Flip below when the toolbar top would fall under this.
    pub min_top: f64,
    pub min_left: f64,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            above: 80.0,
            below: 20.0,
            min_top: 10.0,
            min_left: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomConfig,
    pub page_width: f64,
    pub page_height: f64,
    /// Frame of newly inserted elements: `[left, top, width, height]`.
    pub new_element: [f64; 4],
    pub default_z_index: i32,
    pub shape_size: f64,
    pub paste_offset: f64,
    /// Smallest box extent while cropping.
    pub crop_min_extent: f64,
    /// Smallest box extent while resizing.
    pub min_extent: f64,
    /// Width of the border band (screen px) that drags a text box.
    pub edge_grab_band: f64,
    pub handle_size: f64,
    /// Distance of the rotate handle above the element's top edge.
    pub rotate_handle_offset: f64,
    /// Quiet period after the last keystroke before a text edit is committed.
    pub text_edit_quiet_ms: f64,
    pub history_limit: usize,
    pub thumbnail_scale: f64,
    pub export_scale: f64,
    pub toolbar: ToolbarConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let (page_width, page_height) = PagePreset::A4.size();
        Self {
            zoom: ZoomConfig::default(),
            page_width,
            page_height,
            new_element: [50.0, 50.0, 200.0, 100.0],
            default_z_index: DEFAULT_Z_INDEX,
            shape_size: 100.0,
            paste_offset: 20.0,
            crop_min_extent: 10.0,
            min_extent: 1.0,
            edge_grab_band: 15.0,
            handle_size: 10.0,
            rotate_handle_offset: 25.0,
            text_edit_quiet_ms: 1000.0,
            history_limit: 200,
            thumbnail_scale: 0.2,
            export_scale: 2.0,
            toolbar: ToolbarConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: EditorConfig = serde_json::from_str(json).map_err(EditorError::Config)?;
        if config.zoom.min <= 0.0 || config.zoom.min > config.zoom.max {
            return Err(EditorError::InvalidConfig(format!(
                "zoom range {}..{}",
                config.zoom.min, config.zoom.max
            )));
        }
        if config.history_limit == 0 {
            return Err(EditorError::InvalidConfig("history_limit must be at least 1".into()));
        }
        Ok(config)
    }

    pub fn new_element_frame(&self) -> Rect {
        let [left, top, width, height] = self.new_element;
        Rect::new(left, top, left + width, top + height)
    }
}
