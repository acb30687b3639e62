//! Text node drawing.
//!
//! Everything is laid out in the element's local frame: origin at the element center, x to the
//! right, y down, before scale and rotation. Line geometry comes straight from the same
//! [`TextBlock`] the bounds resolver measured.

use crate::foundation::color::Color;
use crate::foundation::core::{Affine, Rect};
use crate::text::layout::{TextBlock, TextLine, align_start};
use crate::timeline::model::{TextContent, TextDecoration};

pub(crate) const BACKGROUND_PAD_X: f64 = 8.0;
pub(crate) const BACKGROUND_PAD_Y: f64 = 4.0;

/// Decoration stroke thickness for a given pixel font size.
pub(crate) fn decoration_thickness(font_size_px: f64) -> f64 {
    (font_size_px * 0.07).max(1.0)
}

/// Padded background box behind the whole block.
pub(crate) fn background_rect(block: &TextBlock) -> Rect {
    let left = align_start(block.max_width, block.align);
    Rect::new(
        left - BACKGROUND_PAD_X,
        -block.height / 2.0 - BACKGROUND_PAD_Y,
        left + block.max_width + BACKGROUND_PAD_X,
        block.height / 2.0 + BACKGROUND_PAD_Y,
    )
}

/// Underline or strike-through rect for one line, if the decoration draws anything.
pub(crate) fn decoration_rect(
    line: &TextLine,
    block: &TextBlock,
    decoration: TextDecoration,
) -> Option<Rect> {
    if line.width <= 0.0 {
        return None;
    }
    let thickness = decoration_thickness(block.font_size_px);
    let x0 = line.x_start(block.align);
    let y0 = match decoration {
        TextDecoration::None => return None,
        TextDecoration::Underline => line.baseline_y + line.descent + thickness,
        TextDecoration::LineThrough => {
            line.baseline_y - (line.ascent - line.descent) * 0.35 - thickness / 2.0
        }
    };
    Some(Rect::new(x0, y0, x0 + line.width, y0 + thickness))
}

fn set_color(ctx: &mut vello_cpu::RenderContext, c: Color) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

fn fill(ctx: &mut vello_cpu::RenderContext, r: Rect) {
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1));
}

/// Draw a measured text block under `transform` (local frame to canvas pixels).
pub(crate) fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    text: &TextContent,
    block: &TextBlock,
    font: Option<&vello_cpu::peniko::FontData>,
    transform: Affine,
) {
    ctx.set_transform(super::compositor::affine_to_cpu(transform));

    if let Some(bg) = text.background_color.filter(|c| c.is_visible()) {
        set_color(ctx, bg);
        fill(ctx, background_rect(block));
    }

    if !text.color.is_visible() {
        return;
    }
    set_color(ctx, text.color);

    if let Some(font) = font {
        let font_size = block.font_size_px as f32;
        for line in block.lines.iter().filter(|l| !l.glyphs.is_empty()) {
            let x0 = line.x_start(block.align) as f32;
            let y0 = line.baseline_y as f32;
            let glyphs = line.glyphs.iter().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: x0 + g.x,
                y: y0 + g.y,
            });
            ctx.glyph_run(font).font_size(font_size).fill_glyphs(glyphs);
        }
    }

    for line in &block.lines {
        if let Some(r) = decoration_rect(line, block, text.text_decoration) {
            fill(ctx, r);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
