use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{StageError, StageResult};

/// Editor tuning knobs. Every field has a default so partial JSON files are accepted.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub snap: SnapSettings,
    pub interaction: InteractionSettings,
    pub handles: HandleSettings,
    pub render: RenderSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Canvas pixels; not scaled by display zoom.
    pub threshold_px: f64,
    pub rotation_step_deg: f64,
    pub rotation_threshold_deg: f64,
    /// Scale floor; snapped scales at or below it are rejected.
    pub min_scale: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            threshold_px: 10.0,
            rotation_step_deg: 90.0,
            rotation_threshold_deg: 5.0,
            min_scale: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    pub min_drag_distance_px: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_drag_distance_px: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HandleSettings {
    pub handle_size_px: f64,
    pub rotation_handle_offset_px: f64,
    pub rotation_handle_radius_px: f64,
    pub corner_hit_area_px: f64,
}

impl Default for HandleSettings {
    fn default() -> Self {
        Self {
            handle_size_px: 10.0,
            rotation_handle_offset_px: 24.0,
            rotation_handle_radius_px: 10.0,
            corner_hit_area_px: 18.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Straight RGBA8 clear color; the project background is used when absent.
    pub clear_rgba: Option<[u8; 4]>,
    pub sticker_raster_px: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_rgba: None,
            sticker_raster_px: 200,
        }
    }
}

impl EditorSettings {
    pub fn from_reader<R: std::io::Read>(r: R) -> StageResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| StageError::serde(format!("parse settings JSON: {e}")))
    }

    #[tracing::instrument]
    pub fn from_json_file(path: &Path) -> StageResult<Self> {
        let f = File::open(path).map_err(|e| {
            StageError::validation(format!("open settings JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Apply `STAGECRAFT_*` environment overrides. Unparseable or non-positive values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("STAGECRAFT_SNAP_THRESHOLD_PX")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&v| v.is_finite() && v > 0.0)
        {
            self.snap.threshold_px = v;
        }
        if let Some(v) = lookup("STAGECRAFT_MIN_DRAG_DISTANCE_PX")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&v| v.is_finite() && v > 0.0)
        {
            self.interaction.min_drag_distance_px = v;
        }
        if let Some(v) = lookup("STAGECRAFT_STICKER_RASTER_PX")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.render.sticker_raster_px = v;
        }
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
