use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::color::Color;
use crate::foundation::core::{Canvas, Fps, Vec2};
use crate::foundation::error::{StageError, StageResult};

/// Editable project snapshot: canvas settings plus the track/element timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    pub canvas: Canvas,
    #[serde(default)]
    pub fps: Fps,
    #[serde(default = "default_background")]
    pub background: Color,
    #[serde(default)]
    pub assets: Vec<MediaAsset>,
    pub tracks: Vec<Track>,
}

fn default_background() -> Color {
    Color::BLACK
}

impl Project {
    pub fn from_reader<R: std::io::Read>(r: R) -> StageResult<Self> {
        let project: Project = serde_json::from_reader(r)
            .map_err(|e| StageError::serde(format!("parse project JSON: {e}")))?;
        project.validate()?;
        Ok(project)
    }

    pub fn from_json_str(s: &str) -> StageResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    #[tracing::instrument]
    pub fn from_path(path: &Path) -> StageResult<Self> {
        let f = File::open(path).map_err(|e| {
            StageError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_json_pretty(&self) -> StageResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StageError::serde(format!("serialize project JSON: {e}")))
    }

    pub fn validate(&self) -> StageResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        Fps::new(self.fps.num, self.fps.den)?;
        for track in &self.tracks {
            let mut seen = std::collections::BTreeSet::new();
            for el in &track.elements {
                if !seen.insert(el.id.as_str()) {
                    return Err(StageError::validation(format!(
                        "track '{}' has duplicate element id '{}'",
                        track.id, el.id
                    )));
                }
                if !el.start_time.is_finite() || !el.duration.is_finite() || el.duration < 0.0 {
                    return Err(StageError::validation(format!(
                        "element '{}' must have finite start_time and duration >= 0",
                        el.id
                    )));
                }
            }
        }
        if self.tracks.iter().filter(|t| t.is_main).count() > 1 {
            return Err(StageError::validation("at most one track may be main"));
        }
        Ok(())
    }

    /// End time of the last element on any track.
    pub fn duration(&self) -> f64 {
        timeline_duration(&self.tracks)
    }

    pub fn asset(&self, id: &str) -> Option<&MediaAsset> {
        self.assets.iter().find(|a| a.id == id)
    }
}

pub fn timeline_duration(tracks: &[Track]) -> f64 {
    tracks
        .iter()
        .flat_map(|t| t.elements.iter())
        .map(Element::end_time)
        .fold(0.0, f64::max)
}

pub fn find_element<'a>(tracks: &'a [Track], r: &ElementRef) -> Option<&'a Element> {
    tracks
        .iter()
        .find(|t| t.id == r.track_id)?
        .elements
        .iter()
        .find(|e| e.id == r.element_id)
}

pub fn find_element_mut<'a>(tracks: &'a mut [Track], r: &ElementRef) -> Option<&'a mut Element> {
    tracks
        .iter_mut()
        .find(|t| t.id == r.track_id)?
        .elements
        .iter_mut()
        .find(|e| e.id == r.element_id)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Sticker,
    Image,
}

/// Ordered lane of time-bounded elements.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    /// The main track paints first (bottom of the visual stack).
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Track {
    pub fn new(id: impl Into<String>, kind: TrackKind, elements: Vec<Element>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind,
            is_main: false,
            hidden: false,
            elements,
        }
    }
}

/// Position (canvas-centered pixels), uniform scale, and rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Vec2,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub rotate: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
            rotate: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// Name of the equivalent 2D-canvas composite operation.
    pub fn composite_operation(self) -> &'static str {
        match self {
            BlendMode::Normal => "source-over",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
        }
    }
}

/// A single timed, transformable unit of content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub trim_start: f64,
    #[serde(default)]
    pub trim_end: f64,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Type-specific payload. Unknown `type` tags load as [`ElementKind::Unsupported`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Video {
        media_id: String,
    },
    Image {
        media_id: String,
    },
    Audio {
        #[serde(default)]
        media_id: Option<String>,
    },
    Text(TextContent),
    Sticker {
        sticker_id: String,
    },
    #[serde(other)]
    Unsupported,
}

impl Element {
    pub fn new(id: impl Into<String>, start_time: f64, duration: f64, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start_time,
            duration,
            trim_start: 0.0,
            trim_end: 0.0,
            hidden: false,
            transform: Transform::default(),
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            kind,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Half-open activity window `[start_time, start_time + duration)`.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }

    pub fn media_id(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Video { media_id } | ElementKind::Image { media_id } => {
                Some(media_id.as_str())
            }
            ElementKind::Audio { media_id } => media_id.as_deref(),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Whether the element occupies canvas space at all.
    pub fn is_visual(&self) -> bool {
        !matches!(
            self.kind,
            ElementKind::Audio { .. } | ElementKind::Unsupported
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_text_color")]
    pub color: Color,
    #[serde(default)]
    pub background_color: Option<Color>,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_decoration: TextDecoration,
    #[serde(default)]
    pub letter_spacing: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

fn default_font_size() -> f64 {
    15.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_text_color() -> Color {
    Color::WHITE
}

fn default_line_height() -> f64 {
    crate::text::layout::DEFAULT_LINE_HEIGHT
}

impl TextContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            color: default_text_color(),
            background_color: None,
            text_align: TextAlign::default(),
            font_weight: FontWeight::default(),
            font_style: FontStyle::default(),
            text_decoration: TextDecoration::default(),
            letter_spacing: 0.0,
            line_height: default_line_height(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
}

/// Imported media metadata. Decoding is out of band; only intrinsic size matters here.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    /// Path or `file://` URL of the encoded source.
    #[serde(default)]
    pub source: Option<String>,
}

/// Address of one element inside the track list.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ElementRef {
    pub track_id: String,
    pub element_id: String,
}

impl ElementRef {
    pub fn new(track_id: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            element_id: element_id.into(),
        }
    }
}

/// Partial element change carried by preview and direct mutations.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Replacement text content; ignored for non-text elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ElementPatch {
    pub fn apply_to(&self, el: &mut Element) {
        if let Some(t) = self.transform {
            el.transform = t;
        }
        if let Some(o) = self.opacity {
            el.opacity = o.clamp(0.0, 1.0);
        }
        if let (Some(c), ElementKind::Text(text)) = (&self.content, &mut el.kind) {
            text.content = c.clone();
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementUpdate {
    pub target: ElementRef,
    pub patch: ElementPatch,
}

impl ElementUpdate {
    pub fn transform(target: ElementRef, transform: Transform) -> Self {
        Self {
            target,
            patch: ElementPatch {
                transform: Some(transform),
                ..ElementPatch::default()
            },
        }
    }
}

/// Apply updates in order. Updates addressing missing elements are skipped.
pub fn apply_updates(tracks: &mut [Track], updates: &[ElementUpdate]) -> usize {
    let mut applied = 0;
    for u in updates {
        if let Some(el) = find_element_mut(tracks, &u.target) {
            u.patch.apply_to(el);
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
