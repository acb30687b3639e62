use crate::bounds::resolver::ordered_visible_tracks;
use crate::foundation::color::Color;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::math::Fnv1a64;
use crate::timeline::model::{Element, MediaAsset, Project, Track, timeline_duration};
use crate::timeline::store::TimelineStore;

/// One drawable element with the id of the track it came from.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderNode {
    pub track_id: String,
    pub element: Element,
}

/// Flattened render tree for a whole timeline, in paint order.
///
/// `identity` fingerprints everything that can change pixels, so two scenes with equal identity
/// render identically at the same frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub canvas: Canvas,
    pub fps: Fps,
    pub background: Color,
    assets: Vec<MediaAsset>,
    nodes: Vec<RenderNode>,
    identity: u64,
    duration: f64,
    /// Store revision this scene was built from, if any.
    revision: Option<u64>,
}

#[derive(serde::Serialize)]
struct SceneKey<'a> {
    canvas: Canvas,
    fps: Fps,
    background: Color,
    assets: &'a [MediaAsset],
    nodes: &'a [RenderNode],
}

impl Scene {
    #[tracing::instrument(skip(project), fields(tracks = project.tracks.len()))]
    pub fn build(project: &Project) -> Self {
        Self::from_parts(
            project.canvas,
            project.fps,
            project.background,
            &project.tracks,
            &project.assets,
        )
    }

    /// Scene for the store's current timeline state, previews included.
    pub fn from_store<S: TimelineStore>(store: &S, background: Color) -> Self {
        let mut scene = Self::from_parts(
            store.canvas(),
            store.fps(),
            background,
            store.tracks(),
            store.media_assets(),
        );
        scene.revision = Some(store.revision());
        scene
    }

    /// Rebuild from `store` only when its revision, canvas, fps or the background moved.
    ///
    /// Hosts call this every tick; unchanged timelines skip the flatten and fingerprint.
    /// Returns whether the scene was rebuilt.
    pub fn sync_with_store<S: TimelineStore>(&mut self, store: &S, background: Color) -> bool {
        if self.revision == Some(store.revision())
            && self.canvas == store.canvas()
            && self.fps == store.fps()
            && self.background == background
        {
            return false;
        }
        *self = Self::from_store(store, background);
        true
    }

    pub fn from_parts(
        canvas: Canvas,
        fps: Fps,
        background: Color,
        tracks: &[Track],
        assets: &[MediaAsset],
    ) -> Self {
        let mut nodes = Vec::new();
        for track in ordered_visible_tracks(tracks) {
            let mut elements: Vec<&Element> = track
                .elements
                .iter()
                .filter(|e| !e.hidden && e.is_visual())
                .collect();
            elements.sort_by(|a, b| {
                a.start_time
                    .total_cmp(&b.start_time)
                    .then_with(|| a.id.cmp(&b.id))
            });
            nodes.extend(elements.into_iter().map(|e| RenderNode {
                track_id: track.id.clone(),
                element: e.clone(),
            }));
        }

        let key = SceneKey {
            canvas,
            fps,
            background,
            assets,
            nodes: &nodes,
        };
        let mut h = Fnv1a64::new_default();
        h.write_u64(nodes.len() as u64);
        if let Err(err) = serde_json::to_writer(&mut h, &key) {
            tracing::warn!(%err, "scene fingerprint incomplete");
        }

        Self {
            canvas,
            fps,
            background,
            assets: assets.to_vec(),
            nodes,
            identity: h.finish(),
            duration: timeline_duration(tracks),
            revision: None,
        }
    }

    pub fn identity(&self) -> u64 {
        self.identity
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    pub fn asset(&self, id: &str) -> Option<&MediaAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Nodes whose activity window contains `time`, in paint order.
    pub fn active_nodes(&self, time: f64) -> impl Iterator<Item = &RenderNode> {
        self.nodes
            .iter()
            .filter(move |n| n.element.is_active_at(time))
    }

    /// Discretized frame for `time`, clamped to the last frame of the timeline.
    pub fn frame_at(&self, time: f64) -> FrameIndex {
        self.fps.frame_at(time, self.duration)
    }
}

/// Remembers the last rendered `(scene identity, frame)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameGate {
    last: Option<(u64, FrameIndex)>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_current(&self, identity: u64, frame: FrameIndex) -> bool {
        self.last == Some((identity, frame))
    }

    pub fn record(&mut self, identity: u64, frame: FrameIndex) {
        self.last = Some((identity, frame));
    }

    /// Force the next gated pass to draw.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
