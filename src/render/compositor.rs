use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::DecodedImage;
use crate::assets::loader::{ImageLoader, LoadState, VideoFrameSource};
use crate::bounds::resolver::{STICKER_INTRINSIC_SIZE, contain_bounds, media_source_size};
use crate::config::settings::RenderSettings;
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, Canvas, Size};
use crate::foundation::error::{StageError, StageResult};
use crate::geometry::rotated::Bounds;
use crate::render::blend::composite_over;
use crate::render::scene::{FrameGate, RenderNode, Scene};
use crate::render::surface::{Surface, pixmap_from_premul_bytes, surface_dims};
use crate::render::text::draw_text;
use crate::stickers::registry::{ResolveOptions, StickerRegistry};
use crate::text::layout::{TextBlock, TextShaper};
use crate::timeline::model::{Element, ElementKind, TextContent};

/// User-facing problem raised while rendering, e.g. a malformed sticker id.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub element_id: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// Same scene identity and frame as the previous gated pass.
    Skipped,
}

#[derive(Clone)]
struct RasterPaint {
    paint: vello_cpu::Image,
    width: u32,
    height: u32,
}

type PaintKey = (String, Option<(u32, u32)>);

enum Prepared<'a> {
    Raster { paint: RasterPaint, bounds: Bounds },
    Text {
        text: &'a TextContent,
        block: TextBlock,
        font: Option<vello_cpu::peniko::FontData>,
    },
}

/// Draws a [`Scene`] onto a [`Surface`] one node at a time.
///
/// Each node is rasterized into a transparent layer and then composited onto the surface with the
/// element's opacity and blend mode. Image and sticker sources decode out of band; until they are
/// ready the node draws nothing, and a failed source stays blank for the compositor's lifetime.
pub struct Compositor {
    settings: RenderSettings,
    stickers: StickerRegistry,
    loader: ImageLoader,
    shaper: TextShaper,
    video: Option<Box<dyn VideoFrameSource>>,

    ctx: Option<vello_cpu::RenderContext>,
    layer: Option<vello_cpu::Pixmap>,
    fonts: HashMap<String, vello_cpu::peniko::FontData>,
    paints: HashMap<PaintKey, Option<RasterPaint>>,
    sticker_urls: HashMap<String, Option<String>>,

    gate: FrameGate,
    notifications: Vec<Notification>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("settings", &self.settings)
            .field("loader", &self.loader)
            .field("gate", &self.gate)
            .field("notifications", &self.notifications.len())
            .finish()
    }
}

impl Compositor {
    pub fn new(
        loader: ImageLoader,
        stickers: StickerRegistry,
        shaper: TextShaper,
        settings: RenderSettings,
    ) -> Self {
        Self {
            settings,
            stickers,
            loader,
            shaper,
            video: None,
            ctx: None,
            layer: None,
            fonts: HashMap::new(),
            paints: HashMap::new(),
            sticker_urls: HashMap::new(),
            gate: FrameGate::new(),
            notifications: Vec::new(),
        }
    }

    pub fn with_video_source(mut self, source: Box<dyn VideoFrameSource>) -> Self {
        self.video = Some(source);
        self.gate.invalidate();
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn shaper_mut(&mut self) -> &mut TextShaper {
        &mut self.shaper
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// Force the next [`Compositor::render_frame`] to draw, e.g. after the target surface changed.
    pub fn invalidate(&mut self) {
        self.gate.invalidate();
    }

    /// Fold finished decodes in. Any settled load invalidates the gate.
    pub fn poll_assets(&mut self) -> usize {
        let settled = self.loader.poll();
        if settled > 0 {
            self.gate.invalidate();
        }
        settled
    }

    /// Block until every scheduled decode has settled.
    pub fn wait_for_assets(&mut self) -> usize {
        let settled = self.loader.wait_idle();
        if settled > 0 {
            self.gate.invalidate();
        }
        settled
    }

    /// Drain notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Gated render: skips the pass when scene identity and frame index are unchanged.
    #[tracing::instrument(skip(self, scene, surface), fields(scene = scene.identity()))]
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        time: f64,
        surface: &mut Surface,
    ) -> StageResult<RenderOutcome> {
        self.poll_assets();
        let frame = scene.frame_at(time);
        if self.gate.is_current(scene.identity(), frame) {
            return Ok(RenderOutcome::Skipped);
        }
        self.render(scene, time, surface)?;
        Ok(RenderOutcome::Rendered)
    }

    /// Draw every node active at `time`. Always draws, and records the pass in the gate.
    #[tracing::instrument(skip(self, scene, surface), fields(scene = scene.identity()))]
    pub fn render(&mut self, scene: &Scene, time: f64, surface: &mut Surface) -> StageResult<()> {
        if surface.width() != scene.canvas.width || surface.height() != scene.canvas.height {
            return Err(StageError::validation(format!(
                "surface {}x{} does not match canvas {}x{}",
                surface.width(),
                surface.height(),
                scene.canvas.width,
                scene.canvas.height
            )));
        }
        self.poll_assets();

        let clear = self
            .settings
            .clear_rgba
            .map(|[r, g, b, a]| Color::rgba(r, g, b, a))
            .unwrap_or(scene.background);
        surface.clear(clear);

        let mut drawn = 0usize;
        for node in scene.active_nodes(time) {
            if self.draw_node(scene, node, time, surface)? {
                drawn += 1;
            }
        }
        tracing::debug!(time, drawn, pending = self.loader.in_flight(), "render pass");

        self.gate.record(scene.identity(), scene.frame_at(time));
        Ok(())
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> StageResult<R>,
    ) -> StageResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_node(
        &mut self,
        scene: &Scene,
        node: &RenderNode,
        time: f64,
        surface: &mut Surface,
    ) -> StageResult<bool> {
        let el = &node.element;
        let opacity = el.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 {
            return Ok(false);
        }
        let Some(prepared) = self.prepare(scene, el, time) else {
            return Ok(false);
        };

        let (w, h) = surface_dims(surface.width(), surface.height())?;
        let mut layer = match self.layer.take() {
            Some(p) if p.width() == w && p.height() == h => p,
            _ => vello_cpu::Pixmap::new(w, h),
        };
        layer.data_as_u8_slice_mut().fill(0);

        self.with_ctx_mut(w, h, |_, ctx| {
            ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            match &prepared {
                Prepared::Raster { paint, bounds } => draw_raster(ctx, paint, bounds),
                Prepared::Text { text, block, font } => {
                    draw_text(
                        ctx,
                        text,
                        block,
                        font.as_ref(),
                        element_affine(scene.canvas, el),
                    );
                }
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut layer);
            Ok(())
        })?;

        composite_over(
            surface.data_mut(),
            layer.data_as_u8_slice(),
            opacity,
            el.blend_mode,
        )?;
        self.layer = Some(layer);
        Ok(true)
    }

    fn prepare<'a>(&mut self, scene: &Scene, el: &'a Element, time: f64) -> Option<Prepared<'a>> {
        let canvas = scene.canvas;
        match &el.kind {
            ElementKind::Text(text) => {
                let block = self.shaper.measure(text, f64::from(canvas.height));
                let font = block.font.as_ref().map(|face| {
                    self.fonts
                        .entry(face.family.clone())
                        .or_insert_with(|| {
                            vello_cpu::peniko::FontData::new(
                                vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
                                0,
                            )
                        })
                        .clone()
                });
                Some(Prepared::Text { text, block, font })
            }
            ElementKind::Image { media_id } => {
                let asset = scene.asset(media_id)?;
                let Some(source) = asset.source.as_deref() else {
                    tracing::debug!(element = %el.id, media_id, "image asset has no source");
                    return None;
                };
                let bounds = contain_bounds(
                    canvas,
                    media_source_size(canvas, asset),
                    &el.transform,
                );
                let paint = self.loaded_paint(source, None)?;
                Some(Prepared::Raster { paint, bounds })
            }
            ElementKind::Video { media_id } => {
                let asset = scene.asset(media_id)?;
                let source_time = el.trim_start + (time - el.start_time);
                let frame = self.video.as_ref()?.frame_at(media_id, source_time)?;
                let paint = match raster_paint(&frame) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(element = %el.id, error = %e, "video frame unusable");
                        return None;
                    }
                };
                let bounds = contain_bounds(
                    canvas,
                    media_source_size(canvas, asset),
                    &el.transform,
                );
                Some(Prepared::Raster { paint, bounds })
            }
            ElementKind::Sticker { sticker_id } => {
                let px = self.settings.sticker_raster_px.max(1);
                let url = self.sticker_url(&el.id, sticker_id, px)?;
                let bounds = contain_bounds(
                    canvas,
                    Size::new(STICKER_INTRINSIC_SIZE, STICKER_INTRINSIC_SIZE),
                    &el.transform,
                );
                let paint = self.loaded_paint(&url, Some((px, px)))?;
                Some(Prepared::Raster { paint, bounds })
            }
            ElementKind::Audio { .. } | ElementKind::Unsupported => None,
        }
    }

    /// Resolve a sticker id once. Malformed ids and unknown providers raise one notification.
    fn sticker_url(&mut self, element_id: &str, sticker_id: &str, px: u32) -> Option<String> {
        if let Some(cached) = self.sticker_urls.get(sticker_id) {
            return cached.clone();
        }
        let resolved = match self.stickers.resolve(sticker_id, ResolveOptions::square(px)) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(element = element_id, sticker_id, error = %e, "sticker unresolved");
                self.notifications.push(Notification {
                    element_id: element_id.to_string(),
                    message: e.to_string(),
                });
                None
            }
        };
        self.sticker_urls
            .insert(sticker_id.to_string(), resolved.clone());
        resolved
    }

    fn loaded_paint(&mut self, source: &str, raster: Option<(u32, u32)>) -> Option<RasterPaint> {
        let key = (source.to_string(), raster);
        if let Some(cached) = self.paints.get(&key) {
            return cached.clone();
        }
        let settled = match self.loader.request(source, raster) {
            LoadState::Pending => return None,
            LoadState::Failed(_) => None,
            LoadState::Ready(img) => match raster_paint(&img) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(source, error = %e, "decoded image unusable");
                    None
                }
            },
        };
        self.paints.insert(key, settled.clone());
        settled
    }
}

fn raster_paint(img: &Arc<DecodedImage>) -> StageResult<RasterPaint> {
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    Ok(RasterPaint {
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        width: img.width,
        height: img.height,
    })
}

/// Element-local frame: origin at `canvas_center + position`, then rotation, then uniform scale.
pub(crate) fn element_affine(canvas: Canvas, el: &Element) -> Affine {
    let t = &el.transform;
    Affine::translate(canvas.center().to_vec2() + t.position)
        * Affine::rotate(t.rotate.to_radians())
        * Affine::scale(t.scale)
}

/// Maps image pixels onto the rotated bounds rectangle.
fn raster_affine(bounds: &Bounds, width: u32, height: u32) -> Affine {
    Affine::translate((bounds.cx, bounds.cy))
        * Affine::rotate(bounds.rotation.to_radians())
        * Affine::translate((-bounds.width / 2.0, -bounds.height / 2.0))
        * Affine::scale_non_uniform(
            bounds.width / f64::from(width),
            bounds.height / f64::from(height),
        )
}

fn draw_raster(ctx: &mut vello_cpu::RenderContext, paint: &RasterPaint, bounds: &Bounds) {
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return;
    }
    ctx.set_transform(affine_to_cpu(raster_affine(
        bounds,
        paint.width,
        paint.height,
    )));
    ctx.set_paint(paint.paint.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(paint.width),
        f64::from(paint.height),
    ));
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
