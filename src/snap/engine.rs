//! Threshold-gated snapping for position, scale and rotation.
//!
//! Guides and positions are canvas pixels relative to the canvas center, the same space as
//! [`Transform::position`](crate::Transform). Every function is pure: it snaps one raw proposed
//! value and reports the guides it is honoring.

use smallvec::SmallVec;

use crate::config::settings::SnapSettings;
use crate::foundation::core::{Canvas, Size, Vec2};

/// Edge distance under which a guide counts as active after a scale snap.
const ACTIVE_GUIDE_TOLERANCE_PX: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapLineKind {
    Vertical,
    Horizontal,
}

/// An active guide at `position` (x for vertical lines, y for horizontal ones).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapLine {
    #[serde(rename = "type")]
    pub kind: SnapLineKind,
    pub position: f64,
}

impl SnapLine {
    pub fn vertical(position: f64) -> Self {
        Self {
            kind: SnapLineKind::Vertical,
            position,
        }
    }

    pub fn horizontal(position: f64) -> Self {
        Self {
            kind: SnapLineKind::Horizontal,
            position,
        }
    }
}

pub type SnapLines = SmallVec<[SnapLine; 4]>;

#[derive(Clone, Debug, PartialEq)]
pub struct PositionSnap {
    pub position: Vec2,
    pub lines: SnapLines,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleSnap {
    pub scale: f64,
    pub lines: SnapLines,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationSnap {
    pub rotation: f64,
    pub snapped: bool,
}

/// Near edge, center and far edge of one canvas axis.
fn axis_guides(extent: f64) -> [f64; 3] {
    let half = extent / 2.0;
    [-half, 0.0, half]
}

/// Best guide for one axis: `(snapped_value, guide)`.
fn snap_axis(value: f64, half: f64, guides: [f64; 3], threshold: f64) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64, f64)> = None;
    for guide in guides {
        // center on guide, near edge on guide, far edge on guide
        for snapped in [guide, guide + half, guide - half] {
            let distance = (value - snapped).abs();
            if distance > threshold {
                continue;
            }
            if best.is_none_or(|(d, _, _)| distance < d) {
                best = Some((distance, snapped, guide));
            }
        }
    }
    best.map(|(_, snapped, guide)| (snapped, guide))
}

/// Snap a proposed element center so its center or an edge lands on a canvas guide.
///
/// `element_size` is the element's on-canvas (scaled) size. Axes snap independently.
pub fn snap_position(
    proposed: Vec2,
    canvas: Canvas,
    element_size: Size,
    cfg: &SnapSettings,
) -> PositionSnap {
    let cs = canvas.size();
    let mut position = proposed;
    let mut lines = SnapLines::new();

    if let Some((x, guide)) = snap_axis(
        proposed.x,
        element_size.width / 2.0,
        axis_guides(cs.width),
        cfg.threshold_px,
    ) {
        position.x = x;
        lines.push(SnapLine::vertical(guide));
    }
    if let Some((y, guide)) = snap_axis(
        proposed.y,
        element_size.height / 2.0,
        axis_guides(cs.height),
        cfg.threshold_px,
    ) {
        position.y = y;
        lines.push(SnapLine::horizontal(guide));
    }

    PositionSnap { position, lines }
}

/// Snap a proposed uniform scale so an edge of the element lands on a canvas guide.
///
/// The element stays centered at `position`; `base_size` is its unscaled size. The returned lines
/// are every guide within a pixel of a snapped edge, vertical guides first.
pub fn snap_scale(
    proposed: f64,
    position: Vec2,
    base_size: Size,
    canvas: Canvas,
    cfg: &SnapSettings,
) -> ScaleSnap {
    snap_scale_anchored(proposed, position, Vec2::ZERO, base_size, canvas, cfg)
}

/// [`snap_scale`] for a box whose center moves with the scale: at scale `s` the box is centered
/// at `position + anchor * s`.
pub fn snap_scale_anchored(
    proposed: f64,
    position: Vec2,
    anchor: Vec2,
    base_size: Size,
    canvas: Canvas,
    cfg: &SnapSettings,
) -> ScaleSnap {
    let cs = canvas.size();
    let x_guides = axis_guides(cs.width);
    let y_guides = axis_guides(cs.height);

    // Edge coordinate at scale s is `origin + s * rate`.
    let x_rates = [anchor.x - base_size.width / 2.0, anchor.x + base_size.width / 2.0];
    let y_rates = [anchor.y - base_size.height / 2.0, anchor.y + base_size.height / 2.0];

    let mut best: Option<(f64, f64)> = None;
    let mut consider = |origin: f64, rate: f64, guide: f64| {
        if rate.abs() <= f64::EPSILON {
            return;
        }
        let distance = (origin + proposed * rate - guide).abs();
        let scale = (guide - origin) / rate;
        if distance <= cfg.threshold_px
            && scale > cfg.min_scale
            && best.is_none_or(|(d, _)| distance < d)
        {
            best = Some((distance, scale));
        }
    };

    if base_size.width > 0.0 {
        for guide in x_guides {
            for rate in x_rates {
                consider(position.x, rate, guide);
            }
        }
    }
    if base_size.height > 0.0 {
        for guide in y_guides {
            for rate in y_rates {
                consider(position.y, rate, guide);
            }
        }
    }

    let Some((_, scale)) = best else {
        return ScaleSnap {
            scale: proposed,
            lines: SnapLines::new(),
        };
    };

    let mut lines = SnapLines::new();
    let x_edges = x_rates.map(|r| position.x + scale * r);
    let y_edges = y_rates.map(|r| position.y + scale * r);
    for guide in x_guides {
        if x_edges
            .iter()
            .any(|e| (e - guide).abs() <= ACTIVE_GUIDE_TOLERANCE_PX)
        {
            push_unique(&mut lines, SnapLine::vertical(guide));
        }
    }
    for guide in y_guides {
        if y_edges
            .iter()
            .any(|e| (e - guide).abs() <= ACTIVE_GUIDE_TOLERANCE_PX)
        {
            push_unique(&mut lines, SnapLine::horizontal(guide));
        }
    }

    ScaleSnap { scale, lines }
}

fn push_unique(lines: &mut SnapLines, line: SnapLine) {
    if !lines.contains(&line) {
        lines.push(line);
    }
}

/// Snap a rotation in degrees to the nearest multiple of the configured step.
pub fn snap_rotation(proposed: f64, cfg: &SnapSettings) -> RotationSnap {
    if cfg.rotation_step_deg <= 0.0 {
        return RotationSnap {
            rotation: proposed,
            snapped: false,
        };
    }
    let target = (proposed / cfg.rotation_step_deg).round() * cfg.rotation_step_deg;
    if (proposed - target).abs() <= cfg.rotation_threshold_deg {
        RotationSnap {
            rotation: target,
            snapped: true,
        }
    } else {
        RotationSnap {
            rotation: proposed,
            snapped: false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/snap/engine.rs"]
mod tests;
