//! Conversions between the three coordinate spaces an editor preview juggles.
//!
//! - **Screen**: host pointer coordinates (viewport pixels).
//! - **Canvas**: the fixed logical pixel grid of the output frame, origin top-left.
//!   Element positions are stored relative to the canvas center ("position space").
//! - **Overlay**: coordinates inside the container that hosts handles and guides. The container
//!   may not share the canvas origin (fullscreen wrappers, letterboxing).
//!
//! All maps are affine per axis, so each has an exact inverse. A zero-sized rectangle maps 1:1
//! rather than dividing by zero.

use crate::foundation::core::{Canvas, Point, Size, Vec2};

/// Axis-aligned rectangle in screen pixels, as reported by the host layout engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn origin(self) -> Point {
        Point::new(self.left, self.top)
    }
}

/// Rendered pixels per logical canvas pixel, per axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct DisplayScale {
    pub x: f64,
    pub y: f64,
}

impl Default for DisplayScale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

fn ratio(displayed: f64, logical: f64) -> f64 {
    if displayed > 0.0 && logical > 0.0 && displayed.is_finite() {
        displayed / logical
    } else {
        1.0
    }
}

/// Per-axis ratio of rendered pixels to logical canvas pixels.
pub fn display_scale(canvas_rect: ScreenRect, canvas: Canvas) -> DisplayScale {
    DisplayScale {
        x: ratio(canvas_rect.width, f64::from(canvas.width)),
        y: ratio(canvas_rect.height, f64::from(canvas.height)),
    }
}

/// Map a pointer position in screen space into canvas pixels.
pub fn screen_to_canvas(screen: Point, canvas_rect: ScreenRect, canvas: Canvas) -> Point {
    let s = display_scale(canvas_rect, canvas);
    Point::new(
        (screen.x - canvas_rect.left) / s.x,
        (screen.y - canvas_rect.top) / s.y,
    )
}

/// Inverse of [`screen_to_canvas`].
pub fn canvas_to_screen(p: Point, canvas_rect: ScreenRect, canvas: Canvas) -> Point {
    let s = display_scale(canvas_rect, canvas);
    Point::new(canvas_rect.left + p.x * s.x, canvas_rect.top + p.y * s.y)
}

/// Map an absolute canvas point into the overlay container's space.
pub fn canvas_to_overlay(
    p: Point,
    canvas_rect: ScreenRect,
    container_rect: ScreenRect,
    canvas: Canvas,
) -> Point {
    let s = display_scale(canvas_rect, canvas);
    Point::new(
        canvas_rect.left - container_rect.left + p.x * s.x,
        canvas_rect.top - container_rect.top + p.y * s.y,
    )
}

/// Inverse of [`canvas_to_overlay`].
pub fn overlay_to_canvas(
    p: Point,
    canvas_rect: ScreenRect,
    container_rect: ScreenRect,
    canvas: Canvas,
) -> Point {
    let s = display_scale(canvas_rect, canvas);
    Point::new(
        (p.x - (canvas_rect.left - container_rect.left)) / s.x,
        (p.y - (canvas_rect.top - container_rect.top)) / s.y,
    )
}

/// Map a center-relative element position into overlay space.
pub fn position_to_overlay(
    position: Vec2,
    canvas_rect: ScreenRect,
    container_rect: ScreenRect,
    canvas: Canvas,
) -> Point {
    canvas_to_overlay(
        canvas.center() + position,
        canvas_rect,
        container_rect,
        canvas,
    )
}

/// Inverse of [`position_to_overlay`].
pub fn overlay_to_position(
    p: Point,
    canvas_rect: ScreenRect,
    container_rect: ScreenRect,
    canvas: Canvas,
) -> Vec2 {
    overlay_to_canvas(p, canvas_rect, container_rect, canvas) - canvas.center()
}

/// Largest size with the canvas aspect ratio that fits inside `available`.
pub fn fit_display_size(canvas: Canvas, available: Size) -> Size {
    if available.width <= 0.0 || available.height <= 0.0 {
        return Size::ZERO;
    }
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    if available.width * ch > available.height * cw {
        Size::new(available.height * cw / ch, available.height)
    } else {
        Size::new(available.width, available.width * ch / cw)
    }
}

/// Snapshot of the preview layout used to convert between spaces.
///
/// The host refreshes this whenever the canvas element or the overlay container moves or resizes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub canvas: Canvas,
    pub canvas_rect: ScreenRect,
    pub container_rect: ScreenRect,
}

impl Viewport {
    /// Unscaled viewport: canvas rendered at 1:1 at the container origin.
    pub fn identity(canvas: Canvas) -> Self {
        let rect = ScreenRect::new(
            0.0,
            0.0,
            f64::from(canvas.width),
            f64::from(canvas.height),
        );
        Self {
            canvas,
            canvas_rect: rect,
            container_rect: rect,
        }
    }

    pub fn display_scale(&self) -> DisplayScale {
        display_scale(self.canvas_rect, self.canvas)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        screen_to_canvas(screen, self.canvas_rect, self.canvas)
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        canvas_to_screen(p, self.canvas_rect, self.canvas)
    }

    pub fn canvas_to_overlay(&self, p: Point) -> Point {
        canvas_to_overlay(p, self.canvas_rect, self.container_rect, self.canvas)
    }

    pub fn overlay_to_canvas(&self, p: Point) -> Point {
        overlay_to_canvas(p, self.canvas_rect, self.container_rect, self.canvas)
    }

    pub fn position_to_overlay(&self, position: Vec2) -> Point {
        position_to_overlay(position, self.canvas_rect, self.container_rect, self.canvas)
    }

    pub fn overlay_to_position(&self, p: Point) -> Vec2 {
        overlay_to_position(p, self.canvas_rect, self.container_rect, self.canvas)
    }

    /// Screen point to overlay point; differs from the canvas path only by the container origin.
    pub fn screen_to_overlay(&self, screen: Point) -> Point {
        self.canvas_to_overlay(self.screen_to_canvas(screen))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/coords.rs"]
mod tests;
