//! Pointer gesture state machine for the preview surface.
//!
//! The controller turns host pointer events into preview mutations on a [`TimelineStore`]:
//!
//! - pointer-down on an element starts a drag; on empty canvas it clears the selection
//! - pointer-down on a corner handle scales, on the rotation handle rotates
//! - double-click on a text element opens an in-place text edit
//!
//! Every gesture owns at most one preview transaction and closes it exactly once, by commit or
//! discard. Gestures never open while the store already has a preview in flight.

use crate::bounds::resolver::{ElementWithBounds, resolve_visible_bounds};
use crate::config::settings::EditorSettings;
use crate::foundation::core::{Point, Size, Vec2};
use crate::foundation::math::normalize_degrees;
use crate::geometry::coords::Viewport;
use crate::interact::handles::{Handle, HandleLayout};
use crate::interact::hit_test::hit_test;
use crate::interact::text_edit::TextEditOverlay;
use crate::snap::engine::{SnapLines, snap_position, snap_rotation, snap_scale_anchored};
use crate::text::layout::TextShaper;
use crate::timeline::model::{ElementKind, ElementPatch, ElementRef, ElementUpdate, Transform};
use crate::timeline::selection::{Selection, SubscriptionId};
use crate::timeline::store::TimelineStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Held shift bypasses snapping.
    pub shift: bool,
}

/// A pointer event in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn primary(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// Observable overlay state: active guides, the grabbed handle, and the text edit proxy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayState {
    pub snap_lines: SnapLines,
    pub active_handle: Option<Handle>,
    pub editing: Option<TextEditOverlay>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Scaling,
    Rotating,
    EditingText,
}

#[derive(Debug)]
struct DragState {
    start: Point,
    /// Snap size of the first dragged element.
    size: Size,
    /// Offset from the first element's position to its bounds center.
    box_offset: Vec2,
    elements: Vec<(ElementRef, Transform)>,
    moved: bool,
}

#[derive(Debug)]
struct ScaleState {
    target: ElementRef,
    initial: Transform,
    center: Point,
    initial_distance: f64,
    base_size: Size,
    /// Bounds center offset from the position, per unit of scale.
    anchor: Vec2,
}

#[derive(Debug)]
struct RotateState {
    target: ElementRef,
    initial: Transform,
    center: Point,
    initial_angle: f64,
}

#[derive(Debug)]
struct TextEditState {
    target: ElementRef,
    original_opacity: f64,
}

#[derive(Debug)]
enum Gesture {
    Idle,
    Dragging(DragState),
    Scaling(ScaleState),
    Rotating(RotateState),
    EditingText(TextEditState),
}

type OverlayListener = Box<dyn FnMut(&OverlayState)>;

pub struct InteractionController<S: TimelineStore> {
    store: S,
    selection: Selection,
    shaper: TextShaper,
    settings: EditorSettings,
    viewport: Viewport,
    gesture: Gesture,
    overlay: OverlayState,
    listeners: Vec<(SubscriptionId, OverlayListener)>,
    next_listener: u64,
}

impl<S: TimelineStore + std::fmt::Debug> std::fmt::Debug for InteractionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("store", &self.store)
            .field("selection", &self.selection)
            .field("gesture", &self.gesture)
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

fn angle_deg(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

impl<S: TimelineStore> InteractionController<S> {
    /// Controller over `store` with a 1:1 viewport of the store's canvas.
    pub fn new(store: S, settings: EditorSettings, shaper: TextShaper) -> Self {
        let viewport = Viewport::identity(store.canvas());
        Self {
            store,
            selection: Selection::new(),
            shaper,
            settings,
            viewport,
            gesture: Gesture::Idle,
            overlay: OverlayState::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access for host-driven changes (playhead, undo). Avoid mid-gesture.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn phase(&self) -> GesturePhase {
        match self.gesture {
            Gesture::Idle => GesturePhase::Idle,
            Gesture::Dragging(_) => GesturePhase::Dragging,
            Gesture::Scaling(_) => GesturePhase::Scaling,
            Gesture::Rotating(_) => GesturePhase::Rotating,
            Gesture::EditingText(_) => GesturePhase::EditingText,
        }
    }

    /// Update the preview layout. An open text edit is re-anchored.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Gesture::EditingText(state) = &self.gesture {
            let target = state.target.clone();
            let content = self.overlay.editing.as_ref().map(|e| e.content.clone());
            let mut next = self.overlay.clone();
            next.editing = self.text_edit_overlay(&target).map(|mut o| {
                if let Some(c) = content {
                    o.content = c;
                }
                o
            });
            self.set_overlay(next);
        }
    }

    /// Listen for overlay changes. Listeners only fire when the state actually changes.
    pub fn subscribe(&mut self, listener: impl FnMut(&OverlayState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Visible elements with bounds at the store's current time, in paint order.
    pub fn visible_bounds(&mut self) -> Vec<ElementWithBounds> {
        resolve_visible_bounds(
            self.store.tracks(),
            self.store.current_time(),
            self.store.canvas(),
            self.store.media_assets(),
            &mut self.shaper,
        )
    }

    /// Handles for a single visual selection; absent for multi-selection or while editing text.
    pub fn handle_layout(&mut self) -> Option<HandleLayout> {
        if matches!(self.gesture, Gesture::EditingText(_)) {
            return None;
        }
        let selected = self.single_selected()?;
        Some(HandleLayout::new(
            &selected.bounds,
            &self.viewport,
            &self.settings.handles,
        ))
    }

    fn single_selected(&mut self) -> Option<ElementWithBounds> {
        if self.selection.len() != 1 {
            return None;
        }
        let target = self.selection.first()?.clone();
        self.visible_bounds()
            .into_iter()
            .find(|e| e.element_ref() == target && e.element.is_visual())
    }

    fn can_open_gesture(&self) -> bool {
        if !matches!(self.gesture, Gesture::Idle) {
            return false;
        }
        if self.store.is_preview_active() {
            tracing::debug!("gesture ignored: a preview transaction is already open");
            return false;
        }
        true
    }

    pub fn on_pointer_down(&mut self, ev: PointerEvent) {
        if ev.button != PointerButton::Primary || !self.can_open_gesture() {
            return;
        }

        let overlay_point = self.viewport.screen_to_overlay(ev.position);
        if let Some(handle) = self
            .handle_layout()
            .and_then(|layout| layout.handle_at(overlay_point))
        {
            self.on_handle_pointer_down(handle, ev);
            return;
        }

        let p = self.viewport.screen_to_canvas(ev.position);
        let visible = self.visible_bounds();
        let Some(hit) = hit_test(p, &visible) else {
            self.selection.clear();
            return;
        };

        let hit_ref = hit.element_ref();
        if !self.selection.contains(&hit_ref) {
            self.selection.set_selected(vec![hit_ref]);
        }

        let elements: Vec<(ElementRef, Transform)> = self
            .selection
            .selected()
            .iter()
            .filter_map(|r| {
                self.store
                    .element(r)
                    .filter(|e| e.is_visual())
                    .map(|e| (r.clone(), e.transform))
            })
            .collect();
        let Some((first, first_transform)) = elements.first() else {
            return;
        };
        let center = self.store.canvas().center();
        let (bounds, box_offset) = match visible.iter().find(|e| e.element_ref() == *first) {
            Some(e) => (
                e.bounds,
                e.bounds.center() - (center + first_transform.position),
            ),
            None => (hit.bounds, Vec2::ZERO),
        };

        self.gesture = Gesture::Dragging(DragState {
            start: p,
            size: Size::new(bounds.width, bounds.height),
            box_offset,
            elements,
            moved: false,
        });
    }

    /// Start scaling or rotating the single selected element from a handle grab.
    pub fn on_handle_pointer_down(&mut self, handle: Handle, ev: PointerEvent) {
        if ev.button != PointerButton::Primary || !self.can_open_gesture() {
            return;
        }
        let Some(selected) = self.single_selected() else {
            return;
        };
        let target = selected.element_ref();
        let initial = selected.element.transform;
        let bounds = selected.bounds;

        self.gesture = match handle {
            Handle::Corner(_) => {
                let scale = if initial.scale > 0.0 { initial.scale } else { 1.0 };
                let offset = bounds.center() - (self.store.canvas().center() + initial.position);
                Gesture::Scaling(ScaleState {
                    target,
                    initial,
                    center: bounds.center(),
                    initial_distance: bounds.corner_distance(),
                    base_size: Size::new(bounds.width / scale, bounds.height / scale),
                    anchor: offset / scale,
                })
            }
            Handle::Rotation => {
                let p = self.viewport.screen_to_canvas(ev.position);
                Gesture::Rotating(RotateState {
                    target,
                    initial,
                    center: bounds.center(),
                    initial_angle: angle_deg(bounds.center(), p),
                })
            }
        };
        let mut next = self.overlay.clone();
        next.active_handle = Some(handle);
        self.set_overlay(next);
    }

    pub fn on_pointer_move(&mut self, ev: PointerEvent) {
        let p = self.viewport.screen_to_canvas(ev.position);
        let snap = !ev.modifiers.shift;
        let canvas = self.store.canvas();
        let cfg = self.settings.snap;

        let (updates, lines) = match &mut self.gesture {
            Gesture::Idle | Gesture::EditingText(_) => return,
            Gesture::Dragging(drag) => {
                let delta = p - drag.start;
                let threshold = self.settings.interaction.min_drag_distance_px;
                if delta.x.abs() <= threshold && delta.y.abs() <= threshold {
                    let mut next = self.overlay.clone();
                    next.snap_lines.clear();
                    self.set_overlay(next);
                    return;
                }
                drag.moved = true;

                // snap the bounds box, not the raw position
                let origin = drag.elements[0].1.position + drag.box_offset;
                let proposed = origin + delta;
                let (snapped, lines) = if snap {
                    let out = snap_position(proposed, canvas, drag.size, &cfg);
                    (out.position, out.lines)
                } else {
                    (proposed, SnapLines::new())
                };
                let applied = snapped - origin;

                let updates: Vec<ElementUpdate> = drag
                    .elements
                    .iter()
                    .map(|(r, initial)| {
                        ElementUpdate::transform(
                            r.clone(),
                            Transform {
                                position: initial.position + applied,
                                ..*initial
                            },
                        )
                    })
                    .collect();
                (updates, lines)
            }
            Gesture::Scaling(state) => {
                let d = (p - state.center).hypot();
                let distance = if d > 0.0 { d } else { 1.0 };
                let proposed =
                    (state.initial.scale * distance / state.initial_distance).max(cfg.min_scale);
                let (scale, lines) = if snap {
                    let out = snap_scale_anchored(
                        proposed,
                        state.initial.position,
                        state.anchor,
                        state.base_size,
                        canvas,
                        &cfg,
                    );
                    (out.scale, out.lines)
                } else {
                    (proposed, SnapLines::new())
                };
                let update = ElementUpdate::transform(
                    state.target.clone(),
                    Transform {
                        scale,
                        ..state.initial
                    },
                );
                (vec![update], lines)
            }
            Gesture::Rotating(state) => {
                let delta = normalize_degrees(angle_deg(state.center, p) - state.initial_angle);
                let proposed = state.initial.rotate + delta;
                let rotate = if snap {
                    snap_rotation(proposed, &cfg).rotation
                } else {
                    proposed
                };
                let update = ElementUpdate::transform(
                    state.target.clone(),
                    Transform {
                        rotate,
                        ..state.initial
                    },
                );
                (vec![update], SnapLines::new())
            }
        };

        let mut next = self.overlay.clone();
        next.snap_lines = lines;
        self.set_overlay(next);
        self.store.preview_elements(&updates);
    }

    pub fn on_pointer_up(&mut self, ev: PointerEvent) {
        if let Gesture::Dragging(drag) = &mut self.gesture {
            let delta = self.viewport.screen_to_canvas(ev.position) - drag.start;
            let threshold = self.settings.interaction.min_drag_distance_px;
            drag.moved = delta.x.abs() > threshold || delta.y.abs() > threshold;
        }
        self.finish_transform_gesture();
    }

    /// Focus loss: transform gestures commit (drags only if they moved) and text edits commit.
    pub fn on_blur(&mut self) {
        if matches!(self.gesture, Gesture::EditingText(_)) {
            self.commit_text_edit();
        } else {
            self.finish_transform_gesture();
        }
    }

    /// Escape: abandon whatever gesture is in flight.
    pub fn on_escape(&mut self) {
        self.cancel();
    }

    pub fn cancel(&mut self) {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::EditingText(_) => self.cancel_text_edit(),
            _ => {
                self.store.discard_preview();
                self.reset_gesture();
            }
        }
    }

    pub fn on_playback_started(&mut self) {
        if matches!(self.gesture, Gesture::EditingText(_)) {
            self.cancel_text_edit();
        }
    }

    fn finish_transform_gesture(&mut self) {
        match &self.gesture {
            Gesture::Idle | Gesture::EditingText(_) => return,
            Gesture::Dragging(drag) if !drag.moved => self.store.discard_preview(),
            _ => self.store.commit_preview(),
        }
        self.reset_gesture();
    }

    fn reset_gesture(&mut self) {
        self.gesture = Gesture::Idle;
        self.set_overlay(OverlayState::default());
    }

    pub fn on_double_click(&mut self, ev: PointerEvent) {
        if !self.can_open_gesture() {
            return;
        }
        let p = self.viewport.screen_to_canvas(ev.position);
        let visible = self.visible_bounds();
        let Some(hit) = hit_test(p, &visible) else {
            return;
        };
        if !matches!(hit.element.kind, ElementKind::Text(_)) {
            return;
        }
        let target = hit.element_ref();
        let original_opacity = hit.element.opacity;

        let Some(editing) = self.text_edit_overlay(&target) else {
            return;
        };
        self.store.preview_elements(&[ElementUpdate {
            target: target.clone(),
            patch: ElementPatch {
                opacity: Some(0.0),
                ..ElementPatch::default()
            },
        }]);
        self.gesture = Gesture::EditingText(TextEditState {
            target,
            original_opacity,
        });
        self.set_overlay(OverlayState {
            editing: Some(editing),
            ..OverlayState::default()
        });
    }

    fn text_edit_overlay(&self, target: &ElementRef) -> Option<TextEditOverlay> {
        let element = self.store.element(target)?;
        let text = element.text()?;
        Some(TextEditOverlay::new(
            target.clone(),
            text,
            &element.transform,
            self.store.canvas(),
            &self.viewport,
        ))
    }

    /// Replace the edited text provisionally.
    pub fn edit_text(&mut self, content: &str) {
        let Gesture::EditingText(state) = &self.gesture else {
            return;
        };
        let update = ElementUpdate {
            target: state.target.clone(),
            patch: ElementPatch {
                content: Some(content.to_string()),
                ..ElementPatch::default()
            },
        };
        self.store.preview_elements(&[update]);
        let mut next = self.overlay.clone();
        if let Some(editing) = &mut next.editing {
            editing.content = content.to_string();
        }
        self.set_overlay(next);
    }

    /// Restore the element's opacity and fold the edit into history.
    pub fn commit_text_edit(&mut self) {
        let Gesture::EditingText(state) = &self.gesture else {
            return;
        };
        let update = ElementUpdate {
            target: state.target.clone(),
            patch: ElementPatch {
                opacity: Some(state.original_opacity),
                ..ElementPatch::default()
            },
        };
        self.store.preview_elements(&[update]);
        self.store.commit_preview();
        self.reset_gesture();
    }

    /// Drop the edit; content and opacity return to their pre-edit values.
    pub fn cancel_text_edit(&mut self) {
        if !matches!(self.gesture, Gesture::EditingText(_)) {
            return;
        }
        self.store.discard_preview();
        self.reset_gesture();
    }

    fn set_overlay(&mut self, next: OverlayState) {
        if next == self.overlay {
            return;
        }
        self.overlay = next;
        for (_, listener) in &mut self.listeners {
            listener(&self.overlay);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/controller.rs"]
mod tests;
