use crate::config::settings::HandleSettings;
use crate::foundation::core::{Point, Size};
use crate::geometry::coords::Viewport;
use crate::geometry::rotated::{Bounds, Corner};

/// A grabbable transform handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    Corner(Corner),
    Rotation,
}

/// Overlay-space placement of the selection outline and its handles.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleLayout {
    pub center: Point,
    /// Outline size in overlay pixels, before rotation.
    pub outline: Size,
    pub rotation: f64,
    pub corners: [(Corner, Point); 4],
    pub rotation_handle: Point,
    hit_area: f64,
    rotation_radius: f64,
}

impl HandleLayout {
    pub fn new(bounds: &Bounds, viewport: &Viewport, cfg: &HandleSettings) -> Self {
        let scale = viewport.display_scale();
        let corners = Corner::ALL.map(|c| (c, viewport.canvas_to_overlay(bounds.corner(c))));
        Self {
            center: viewport.canvas_to_overlay(bounds.center()),
            outline: Size::new(bounds.width * scale.x, bounds.height * scale.y),
            rotation: bounds.rotation,
            corners,
            rotation_handle: viewport
                .canvas_to_overlay(bounds.rotation_handle(cfg.rotation_handle_offset_px)),
            hit_area: cfg.corner_hit_area_px,
            rotation_radius: cfg.rotation_handle_radius_px,
        }
    }

    /// Handle under an overlay point. The rotation handle is checked first.
    pub fn handle_at(&self, p: Point) -> Option<Handle> {
        if (p - self.rotation_handle).hypot() <= self.rotation_radius {
            return Some(Handle::Rotation);
        }
        let half = self.hit_area / 2.0;
        self.corners
            .iter()
            .find(|(_, at)| (p.x - at.x).abs() <= half && (p.y - at.y).abs() <= half)
            .map(|(c, _)| Handle::Corner(*c))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/handles.rs"]
mod tests;
