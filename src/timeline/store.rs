use crate::foundation::core::{Canvas, Fps};
use crate::timeline::model::{
    Element, ElementRef, ElementUpdate, MediaAsset, Project, Track, apply_updates, find_element,
};
use crate::timeline::preview::PreviewTransaction;

/// Timeline state consumed by bounds resolution and the interaction controller.
///
/// Provisional edits go through `preview_elements` and are resolved by exactly one of
/// `commit_preview` or `discard_preview`.
pub trait TimelineStore {
    fn tracks(&self) -> &[Track];
    fn media_assets(&self) -> &[MediaAsset];
    fn canvas(&self) -> Canvas;
    fn fps(&self) -> Fps;
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
    /// Counter bumped on every change to `tracks`, previews included.
    fn revision(&self) -> u64;

    fn element(&self, r: &ElementRef) -> Option<&Element> {
        find_element(self.tracks(), r)
    }

    /// Apply provisional, non-undoable changes, opening the transaction on first use.
    fn preview_elements(&mut self, updates: &[ElementUpdate]);
    /// Fold the open transaction into undoable history.
    fn commit_preview(&mut self);
    /// Roll back to the state captured when the transaction opened.
    fn discard_preview(&mut self);
    fn is_preview_active(&self) -> bool;
    /// Undoable mutation outside any transaction. Ignored while a preview is open.
    fn update_elements(&mut self, updates: &[ElementUpdate]);
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    before: Vec<Track>,
    after: Vec<Track>,
}

/// In-memory [`TimelineStore`] with snapshot-based undo/redo.
#[derive(Clone, Debug)]
pub struct MemoryTimeline {
    project: Project,
    preview: PreviewTransaction<Vec<Track>>,
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    current_time: f64,
    playing: bool,
    revision: u64,
}

impl MemoryTimeline {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            preview: PreviewTransaction::new(),
            undo: Vec::new(),
            redo: Vec::new(),
            current_time: 0.0,
            playing: false,
            revision: 0,
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time.max(0.0);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn history_len(&self) -> usize {
        self.undo.len()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn push_history(&mut self, before: Vec<Track>) {
        if before == self.project.tracks {
            return;
        }
        self.undo.push(HistoryEntry {
            before,
            after: self.project.tracks.clone(),
        });
        self.redo.clear();
    }

    pub fn undo(&mut self) -> bool {
        if self.preview.is_active() {
            tracing::debug!("undo ignored while a preview transaction is open");
            return false;
        }
        let Some(entry) = self.undo.pop() else {
            return false;
        };
        self.project.tracks = entry.before.clone();
        self.redo.push(entry);
        self.touch();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.preview.is_active() {
            tracing::debug!("redo ignored while a preview transaction is open");
            return false;
        }
        let Some(entry) = self.redo.pop() else {
            return false;
        };
        self.project.tracks = entry.after.clone();
        self.undo.push(entry);
        self.touch();
        true
    }
}

impl TimelineStore for MemoryTimeline {
    fn tracks(&self) -> &[Track] {
        &self.project.tracks
    }

    fn media_assets(&self) -> &[MediaAsset] {
        &self.project.assets
    }

    fn canvas(&self) -> Canvas {
        self.project.canvas
    }

    fn fps(&self) -> Fps {
        self.project.fps
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn preview_elements(&mut self, updates: &[ElementUpdate]) {
        self.preview.begin(&self.project.tracks);
        apply_updates(&mut self.project.tracks, updates);
        self.touch();
    }

    fn commit_preview(&mut self) {
        if let Some(before) = self.preview.end() {
            self.push_history(before);
        }
    }

    fn discard_preview(&mut self) {
        if let Some(before) = self.preview.end() {
            self.project.tracks = before;
            self.touch();
        }
    }

    fn is_preview_active(&self) -> bool {
        self.preview.is_active()
    }

    fn update_elements(&mut self, updates: &[ElementUpdate]) {
        if self.preview.is_active() {
            tracing::debug!("direct update ignored while a preview transaction is open");
            return;
        }
        let before = self.project.tracks.clone();
        apply_updates(&mut self.project.tracks, updates);
        self.push_history(before);
        self.touch();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/store.rs"]
mod tests;
