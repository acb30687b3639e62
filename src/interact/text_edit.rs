use crate::foundation::color::Color;
use crate::foundation::core::{Canvas, Point};
use crate::geometry::coords::Viewport;
use crate::text::layout::scaled_font_size;
use crate::timeline::model::{ElementRef, TextAlign, TextContent, Transform};

const VERTICAL_OFFSET_EM: f64 = 0.06;
const PADDING_X_PX: f64 = 8.0;
const PADDING_Y_PX: f64 = 4.0;

/// Placement of the editable text proxy shown while a text element is being edited.
#[derive(Clone, Debug, PartialEq)]
pub struct TextEditOverlay {
    pub target: ElementRef,
    /// Overlay-space anchor of the element's transform position.
    pub position: Point,
    /// Display font size: the render-time size times the horizontal display scale.
    pub font_size_px: f64,
    pub vertical_offset_px: f64,
    pub scale: f64,
    pub rotation: f64,
    pub align: TextAlign,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub color: Color,
    pub background: Option<Color>,
    pub content: String,
}

impl TextEditOverlay {
    pub fn new(
        target: ElementRef,
        text: &TextContent,
        transform: &Transform,
        canvas: Canvas,
        viewport: &Viewport,
    ) -> Self {
        let font_size_px = scaled_font_size(text.font_size, f64::from(canvas.height))
            * viewport.display_scale().x;
        let background = text.background_color.filter(|c| c.is_visible());
        let (padding_x, padding_y) = if background.is_some() {
            (PADDING_X_PX, PADDING_Y_PX)
        } else {
            (0.0, 0.0)
        };
        Self {
            target,
            position: viewport.position_to_overlay(transform.position),
            font_size_px,
            vertical_offset_px: font_size_px * VERTICAL_OFFSET_EM,
            scale: transform.scale,
            rotation: transform.rotate,
            align: text.text_align,
            line_height: text.line_height,
            padding_x,
            padding_y,
            color: text.color,
            background,
            content: text.content.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/text_edit.rs"]
mod tests;
