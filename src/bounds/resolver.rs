use std::collections::BTreeMap;

use crate::foundation::core::{Canvas, Size, Vec2};
use crate::geometry::rotated::Bounds;
use crate::text::layout::{TextBlock, TextShaper, align_start};
use crate::timeline::model::{Element, ElementKind, ElementRef, MediaAsset, Track, Transform};

/// Logical intrinsic size of every sticker, before contain-fit.
pub const STICKER_INTRINSIC_SIZE: f64 = 200.0;

/// A visible element and its resolved canvas-space bounds.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ElementWithBounds {
    pub track_id: String,
    pub element_id: String,
    pub element: Element,
    pub bounds: Bounds,
}

impl ElementWithBounds {
    pub fn element_ref(&self) -> ElementRef {
        ElementRef::new(self.track_id.clone(), self.element_id.clone())
    }
}

/// Fit `source` inside the canvas preserving aspect, then apply the element transform.
pub fn contain_bounds(canvas: Canvas, source: Size, transform: &Transform) -> Bounds {
    let cs = canvas.size();
    let contain = (cs.width / source.width).min(cs.height / source.height);
    let center = canvas.center() + transform.position;
    Bounds {
        cx: center.x,
        cy: center.y,
        width: source.width * contain * transform.scale,
        height: source.height * contain * transform.scale,
        rotation: transform.rotate,
    }
}

/// Intrinsic source size of a media asset; unsized assets fill the canvas.
pub(crate) fn media_source_size(canvas: Canvas, asset: &MediaAsset) -> Size {
    match (asset.width, asset.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Size::new(f64::from(w), f64::from(h)),
        _ => canvas.size(),
    }
}

/// Bounds of a measured text block under `transform`.
///
/// The box is centered on the ink block: non-centered alignment shifts it along the element's
/// rotated x axis so that the selection outline matches rendered glyphs.
pub fn text_bounds(canvas: Canvas, block: &TextBlock, transform: &Transform) -> Bounds {
    let local_cx = align_start(block.max_width, block.align) + block.max_width / 2.0;
    let (sin, cos) = transform.rotate.to_radians().sin_cos();
    let shift = Vec2::new(local_cx * cos, local_cx * sin) * transform.scale;
    let center = canvas.center() + transform.position + shift;
    Bounds {
        cx: center.x,
        cy: center.y,
        width: block.max_width * transform.scale,
        height: block.height * transform.scale,
        rotation: transform.rotate,
    }
}

/// Canvas-space bounds of one element, or `None` when it occupies no visible space.
pub fn element_bounds(
    element: &Element,
    canvas: Canvas,
    media: Option<&MediaAsset>,
    shaper: &mut TextShaper,
) -> Option<Bounds> {
    if element.hidden || element.opacity <= 0.0 {
        return None;
    }
    match &element.kind {
        ElementKind::Video { .. } | ElementKind::Image { .. } => {
            let source = media_source_size(canvas, media?);
            Some(contain_bounds(canvas, source, &element.transform))
        }
        ElementKind::Sticker { .. } => Some(contain_bounds(
            canvas,
            Size::new(STICKER_INTRINSIC_SIZE, STICKER_INTRINSIC_SIZE),
            &element.transform,
        )),
        ElementKind::Text(text) => {
            let block = shaper.measure(text, f64::from(canvas.height));
            Some(text_bounds(canvas, &block, &element.transform))
        }
        ElementKind::Audio { .. } | ElementKind::Unsupported => None,
    }
}

/// Visible tracks in paint order: the main track first, then the others from last to first.
pub fn ordered_visible_tracks(tracks: &[Track]) -> Vec<&Track> {
    let visible = tracks.iter().filter(|t| !t.hidden);
    let mut ordered: Vec<&Track> = visible.clone().filter(|t| !t.is_main).collect();
    ordered.extend(visible.filter(|t| t.is_main));
    ordered.reverse();
    ordered
}

/// Non-hidden elements of `track` active at `time`, by start time then id.
pub fn active_elements(track: &Track, time: f64) -> Vec<&Element> {
    let mut out: Vec<&Element> = track
        .elements
        .iter()
        .filter(|e| !e.hidden && e.is_active_at(time))
        .collect();
    out.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

/// Resolve every visible element at `time`, farthest back first.
#[tracing::instrument(skip(tracks, media_assets, shaper))]
pub fn resolve_visible_bounds(
    tracks: &[Track],
    time: f64,
    canvas: Canvas,
    media_assets: &[MediaAsset],
    shaper: &mut TextShaper,
) -> Vec<ElementWithBounds> {
    let media: BTreeMap<&str, &MediaAsset> =
        media_assets.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut out = Vec::new();
    for track in ordered_visible_tracks(tracks) {
        for element in active_elements(track, time) {
            let asset = element.media_id().and_then(|id| media.get(id).copied());
            if matches!(
                element.kind,
                ElementKind::Video { .. } | ElementKind::Image { .. }
            ) && asset.is_none()
            {
                tracing::debug!(element = %element.id, "media asset missing; element skipped");
            }
            if let Some(bounds) = element_bounds(element, canvas, asset, shaper) {
                out.push(ElementWithBounds {
                    track_id: track.id.clone(),
                    element_id: element.id.clone(),
                    element: element.clone(),
                    bounds,
                });
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/bounds/resolver.rs"]
mod tests;
