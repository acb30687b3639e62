//! Text measurement shared by bounds resolution and rendering.
//!
//! Both sides go through [`TextShaper::measure`], so the selection box always matches the drawn
//! glyph block. Font size scales with canvas height: `font_size * canvas_h / 90`.
//!
//! Lines come from splitting on `\n`, and each line is shaped on its own. Line `i` has its
//! baseline at `i * line_height_px - visual_center_offset` relative to the block center. The
//! block's vertical extent is the tight union of per-line ascent/descent. When no registered font
//! resolves, advances are estimated and ascent/descent fall back to 0.8/0.2 of the font size.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{StageError, StageResult};
use crate::timeline::model::{FontStyle, FontWeight, TextAlign, TextContent};

/// Canvas height at which `font_size` maps 1:1 to pixels.
pub const FONT_SIZE_SCALE_REFERENCE: f64 = 90.0;
pub const DEFAULT_LINE_HEIGHT: f64 = 1.2;

const FALLBACK_ASCENT: f64 = 0.8;
const FALLBACK_DESCENT: f64 = 0.2;
const ESTIMATED_ADVANCE_EM: f64 = 0.55;

pub fn scaled_font_size(font_size: f64, canvas_height: f64) -> f64 {
    font_size * (canvas_height / FONT_SIZE_SCALE_REFERENCE)
}

/// Registered font face: detected family name plus the backing bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct FontFace {
    pub family: String,
    pub bytes: Arc<Vec<u8>>,
}

/// Explicit font registry, owned by the host and shared with shapers.
///
/// Lookups are case-insensitive on family name or alias. The first registered face is the
/// fallback unless another is chosen.
#[derive(Clone, Debug, Default)]
pub struct FontRegistry {
    faces: Vec<FontFace>,
    by_name: BTreeMap<String, usize>,
    fallback: Option<usize>,
}

fn detect_family_name(bytes: &[u8]) -> StageResult<String> {
    let mut ctx = parley::FontContext::default();
    let families = ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| StageError::asset("no font families registered from font bytes"))?;
    ctx.collection
        .family_name(family_id)
        .map(str::to_string)
        .ok_or_else(|| StageError::asset("registered font family has no name"))
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Register a font file's bytes and return its family name.
    pub fn register_bytes(&mut self, bytes: Vec<u8>) -> StageResult<String> {
        let family = detect_family_name(&bytes)?;
        let idx = self.faces.len();
        self.faces.push(FontFace {
            family: family.clone(),
            bytes: Arc::new(bytes),
        });
        self.by_name.entry(family.to_lowercase()).or_insert(idx);
        self.fallback.get_or_insert(idx);
        Ok(family)
    }

    pub fn register_file(&mut self, path: &Path) -> StageResult<String> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        self.register_bytes(bytes)
    }

    /// Register every `.ttf`/`.otf` file in `dir` (sorted by file name). Returns the count.
    pub fn load_dir(&mut self, dir: &Path) -> StageResult<usize> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("read font dir '{}'", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
            })
            .collect();
        paths.sort();
        let mut n = 0;
        for p in paths {
            match self.register_file(&p) {
                Ok(family) => {
                    tracing::debug!(family = %family, path = %p.display(), "registered font");
                    n += 1;
                }
                Err(err) => tracing::warn!(path = %p.display(), %err, "skipping unreadable font"),
            }
        }
        Ok(n)
    }

    /// Make `alias` resolve to an already registered family.
    pub fn alias(&mut self, alias: &str, family: &str) -> StageResult<()> {
        let idx = *self
            .by_name
            .get(&family.to_lowercase())
            .ok_or_else(|| StageError::validation(format!("unknown font family '{family}'")))?;
        self.by_name.insert(alias.to_lowercase(), idx);
        Ok(())
    }

    pub fn set_fallback(&mut self, family: &str) -> StageResult<()> {
        let idx = *self
            .by_name
            .get(&family.to_lowercase())
            .ok_or_else(|| StageError::validation(format!("unknown font family '{family}'")))?;
        self.fallback = Some(idx);
        Ok(())
    }

    pub fn resolve(&self, family: &str) -> Option<&FontFace> {
        self.by_name
            .get(&family.to_lowercase())
            .or(self.fallback.as_ref())
            .and_then(|&i| self.faces.get(i))
    }
}

/// One glyph positioned relative to its line's start (x) and baseline (y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Advance width including letter spacing.
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
    /// False when ascent/descent are the 0.8/0.2 fallback.
    pub native_metrics: bool,
    /// Baseline offset from the block's visual center.
    pub baseline_y: f64,
    pub glyphs: Vec<ShapedGlyph>,
}

impl TextLine {
    /// Left edge of the line for the given alignment around x = 0.
    pub fn x_start(&self, align: TextAlign) -> f64 {
        align_start(self.width, align)
    }
}

pub fn align_start(width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -width / 2.0,
        TextAlign::Right => -width,
    }
}

/// Measured multi-line text block in unscaled canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub font_size_px: f64,
    pub line_height_px: f64,
    pub max_width: f64,
    pub height: f64,
    pub visual_center_offset: f64,
    pub align: TextAlign,
    /// Face used for shaping, if a registered font resolved.
    pub font: Option<FontFace>,
}

/// Shapes text with parley against a [`FontRegistry`].
pub struct TextShaper {
    registry: Arc<FontRegistry>,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    loaded: BTreeSet<String>,
}

impl std::fmt::Debug for TextShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextShaper")
            .field("fonts", &self.registry.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new(Arc::new(FontRegistry::new()))
    }
}

struct LineShape {
    width: f64,
    ascent: f64,
    descent: f64,
    glyphs: Vec<ShapedGlyph>,
}

impl TextShaper {
    pub fn new(registry: Arc<FontRegistry>) -> Self {
        Self {
            registry,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            loaded: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &Arc<FontRegistry> {
        &self.registry
    }

    /// Measure `text` for a canvas of height `canvas_height`.
    pub fn measure(&mut self, text: &TextContent, canvas_height: f64) -> TextBlock {
        let font_size_px = scaled_font_size(text.font_size, canvas_height);
        let line_height_px = font_size_px * text.line_height;
        let face = self.registry.resolve(&text.font_family).cloned();

        let mut lines = Vec::new();
        let mut top = f64::INFINITY;
        let mut bottom = f64::NEG_INFINITY;
        let mut max_width = 0.0f64;

        for (i, line) in text.content.split('\n').enumerate() {
            let shaped = face
                .as_ref()
                .and_then(|f| self.shape_line(f, line, font_size_px, text));
            let native_metrics = shaped.is_some();
            let shape = shaped.unwrap_or_else(|| LineShape {
                width: estimate_width(line, font_size_px, text.letter_spacing),
                ascent: font_size_px * FALLBACK_ASCENT,
                descent: font_size_px * FALLBACK_DESCENT,
                glyphs: Vec::new(),
            });

            let y = i as f64 * line_height_px;
            top = top.min(y - shape.ascent);
            bottom = bottom.max(y + shape.descent);
            max_width = max_width.max(shape.width);
            lines.push(TextLine {
                text: line.to_string(),
                width: shape.width,
                ascent: shape.ascent,
                descent: shape.descent,
                native_metrics,
                baseline_y: y,
                glyphs: shape.glyphs,
            });
        }

        let any_native = lines.iter().any(|l| l.native_metrics);
        let height = bottom - top;
        let visual_center_offset = (top + bottom) / 2.0;
        for line in &mut lines {
            line.baseline_y -= visual_center_offset;
        }

        TextBlock {
            lines,
            font_size_px,
            line_height_px,
            max_width,
            height,
            visual_center_offset,
            align: text.text_align,
            font: face.filter(|_| any_native),
        }
    }

    fn ensure_loaded(&mut self, face: &FontFace) {
        if self.loaded.contains(&face.family) {
            return;
        }
        self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.bytes.as_ref().clone()),
            None,
        );
        self.loaded.insert(face.family.clone());
    }

    fn shape_line(
        &mut self,
        face: &FontFace,
        line: &str,
        font_size_px: f64,
        text: &TextContent,
    ) -> Option<LineShape> {
        if !font_size_px.is_finite() || font_size_px <= 0.0 {
            return None;
        }
        self.ensure_loaded(face);

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, line, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_size_px as f32));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            text.letter_spacing as f32,
        ));
        if text.font_weight == FontWeight::Bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::FontWeight::BOLD,
            ));
        }
        if text.font_style == FontStyle::Italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::FontStyle::Italic,
            ));
        }

        let mut layout: parley::Layout<()> = builder.build(line);
        layout.break_all_lines(None);

        let first = layout.lines().next()?;
        let m = first.metrics();
        let baseline = m.baseline;
        let mut glyphs = Vec::new();
        for item in first.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let mut x = run.offset();
            let y = run.baseline();
            for g in run.glyphs() {
                glyphs.push(ShapedGlyph {
                    id: g.id,
                    x: x + g.x,
                    y: y - g.y - baseline,
                });
                x += g.advance;
            }
        }

        Some(LineShape {
            width: f64::from(m.advance),
            ascent: f64::from(m.ascent),
            descent: f64::from(m.descent),
            glyphs,
        })
    }
}

fn estimate_width(line: &str, font_size_px: f64, letter_spacing: f64) -> f64 {
    let n = line.chars().count() as f64;
    n * (font_size_px * ESTIMATED_ADVANCE_EM + letter_spacing)
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
