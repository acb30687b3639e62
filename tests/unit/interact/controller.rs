use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::foundation::color::Color;
use crate::foundation::core::{Canvas, Fps, Vec2};
use crate::snap::engine::SnapLine;
use crate::timeline::model::{Element, Project, TextAlign, TextContent, Track, TrackKind};
use crate::timeline::store::MemoryTimeline;

fn text_at(id: &str, content: &str, x: f64) -> Element {
    Element::new(id, 0.0, 10.0, ElementKind::Text(TextContent::new(content))).with_transform(
        Transform {
            position: Vec2::new(x, 0.0),
            ..Transform::default()
        },
    )
}

fn controller_with(elements: Vec<Element>) -> InteractionController<MemoryTimeline> {
    let project = Project {
        canvas: Canvas {
            width: 1920,
            height: 1080,
        },
        fps: Fps::default(),
        background: Color::BLACK,
        assets: vec![],
        tracks: vec![Track::new("t", TrackKind::Text, elements)],
    };
    let mut store = MemoryTimeline::new(project);
    store.set_current_time(1.0);
    InteractionController::new(store, EditorSettings::default(), TextShaper::default())
}

fn left_aligned_at(id: &str, content: &str, x: f64) -> Element {
    let mut text = TextContent::new(content);
    text.text_align = TextAlign::Left;
    Element::new(id, 0.0, 10.0, ElementKind::Text(text)).with_transform(Transform {
        position: Vec2::new(x, 0.0),
        ..Transform::default()
    })
}

fn controller() -> InteractionController<MemoryTimeline> {
    controller_with(vec![text_at("e", "Hi", 0.0)])
}

fn target() -> ElementRef {
    ElementRef::new("t", "e")
}

fn transform_of(c: &InteractionController<MemoryTimeline>, r: &ElementRef) -> Transform {
    c.store().element(r).unwrap().transform
}

#[test]
fn unsnapped_drag_moves_bounds_center_and_commits_once() {
    let mut c = controller();
    let before = c.visible_bounds();
    assert_eq!(before[0].bounds.center(), Point::new(960.0, 540.0));

    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    assert_eq!(c.phase(), GesturePhase::Dragging);
    assert_eq!(c.selection().selected(), &[target()]);
    for step in [20.0, 60.0, 100.0] {
        c.on_pointer_move(PointerEvent::primary(960.0 + step, 540.0).with_shift());
        assert!(c.store().is_preview_active());
    }
    c.on_pointer_up(PointerEvent::primary(1060.0, 540.0).with_shift());

    assert_eq!(c.phase(), GesturePhase::Idle);
    assert!(!c.store().is_preview_active());
    assert_eq!(c.store().history_len(), 1);
    let after = c.visible_bounds();
    assert_eq!(after[0].bounds.center(), Point::new(1060.0, 540.0));
}

#[test]
fn sub_threshold_drag_is_discarded() {
    let mut c = controller();
    let before = transform_of(&c, &target());
    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    c.on_pointer_move(PointerEvent::primary(960.3, 540.2));
    c.on_pointer_up(PointerEvent::primary(960.3, 540.2));

    assert!(!c.store().is_preview_active());
    assert_eq!(c.store().history_len(), 0);
    assert_eq!(transform_of(&c, &target()), before);
}

#[test]
fn returning_to_start_before_release_discards() {
    let mut c = controller();
    let before = transform_of(&c, &target());
    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    c.on_pointer_move(PointerEvent::primary(1100.0, 540.0).with_shift());
    assert!(c.store().is_preview_active());
    c.on_pointer_up(PointerEvent::primary(960.0, 540.0));

    assert!(!c.store().is_preview_active());
    assert_eq!(transform_of(&c, &target()), before);
}

#[test]
fn pointer_down_on_empty_canvas_clears_selection() {
    let mut c = controller();
    c.selection_mut().set_selected(vec![target()]);
    c.on_pointer_down(PointerEvent::primary(10.0, 10.0));
    assert!(c.selection().is_empty());
    assert_eq!(c.phase(), GesturePhase::Idle);
}

#[test]
fn secondary_button_is_ignored() {
    let mut c = controller();
    let mut ev = PointerEvent::primary(960.0, 540.0);
    ev.button = PointerButton::Secondary;
    c.on_pointer_down(ev);
    assert_eq!(c.phase(), GesturePhase::Idle);
    assert!(c.selection().is_empty());
}

#[test]
fn drag_snaps_to_center_and_reports_guides_unless_shift_is_held() {
    let mut c = controller();
    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    c.on_pointer_move(PointerEvent::primary(965.0, 543.0));
    assert_eq!(transform_of(&c, &target()).position, Vec2::ZERO);
    assert_eq!(
        c.overlay().snap_lines.as_slice(),
        &[SnapLine::vertical(0.0), SnapLine::horizontal(0.0)]
    );

    c.on_pointer_move(PointerEvent::primary(965.0, 543.0).with_shift());
    assert_eq!(transform_of(&c, &target()).position, Vec2::new(5.0, 3.0));
    assert!(c.overlay().snap_lines.is_empty());

    c.on_pointer_up(PointerEvent::primary(965.0, 543.0));
    assert!(c.overlay().snap_lines.is_empty());
}

#[test]
fn multi_selection_drag_moves_every_selected_element() {
    let mut c = controller_with(vec![text_at("a", "A", -300.0), text_at("b", "B", 300.0)]);
    let (a, b) = (ElementRef::new("t", "a"), ElementRef::new("t", "b"));
    c.selection_mut().set_selected(vec![a.clone(), b.clone()]);

    c.on_pointer_down(PointerEvent::primary(1260.0, 540.0));
    assert_eq!(c.selection().len(), 2);
    c.on_pointer_move(PointerEvent::primary(1310.0, 560.0).with_shift());
    c.on_pointer_up(PointerEvent::primary(1310.0, 560.0).with_shift());

    assert_eq!(transform_of(&c, &a).position, Vec2::new(-250.0, 20.0));
    assert_eq!(transform_of(&c, &b).position, Vec2::new(350.0, 20.0));
    assert_eq!(c.store().history_len(), 1);
    assert!(c.handle_layout().is_none());
}

#[test]
fn rotation_handle_rotates_and_snaps() {
    let mut c = controller();
    c.selection_mut().set_selected(vec![target()]);
    let layout = c.handle_layout().unwrap();
    // "Hi" is 180px tall: top edge at 450, handle 24px above.
    assert_eq!(layout.rotation_handle, Point::new(960.0, 426.0));

    c.on_pointer_down(PointerEvent::primary(960.0, 426.0));
    assert_eq!(c.phase(), GesturePhase::Rotating);
    assert_eq!(c.overlay().active_handle, Some(Handle::Rotation));

    c.on_pointer_move(PointerEvent::primary(1100.0, 545.0));
    assert_eq!(transform_of(&c, &target()).rotate, 90.0);
    c.on_pointer_up(PointerEvent::primary(1100.0, 545.0));

    assert_eq!(c.overlay().active_handle, None);
    assert_eq!(transform_of(&c, &target()).rotate, 90.0);
    assert_eq!(c.store().history_len(), 1);
}

#[test]
fn corner_handle_scales_by_distance_ratio() {
    let mut c = controller();
    c.selection_mut().set_selected(vec![target()]);
    let layout = c.handle_layout().unwrap();
    let (_, corner) = layout
        .corners
        .iter()
        .copied()
        .find(|(k, _)| *k == crate::geometry::rotated::Corner::BottomRight)
        .unwrap();

    c.on_pointer_down(PointerEvent::primary(corner.x, corner.y));
    assert_eq!(c.phase(), GesturePhase::Scaling);
    let far = Point::new(960.0, 540.0) + (corner - Point::new(960.0, 540.0)) * 2.0;
    c.on_pointer_move(PointerEvent::primary(far.x, far.y).with_shift());
    assert!((transform_of(&c, &target()).scale - 2.0).abs() < 1e-9);

    // Collapsing onto the center floors at the minimum scale.
    c.on_pointer_move(PointerEvent::primary(960.0, 540.0).with_shift());
    let floor = c.settings().snap.min_scale;
    assert!(transform_of(&c, &target()).scale >= floor);

    c.on_blur();
    assert_eq!(c.phase(), GesturePhase::Idle);
    assert_eq!(c.store().history_len(), 1);
}

#[test]
fn gestures_do_not_open_while_a_preview_is_active() {
    let mut c = controller();
    c.store_mut().preview_elements(&[ElementUpdate::transform(
        target(),
        Transform::default(),
    )]);
    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    assert_eq!(c.phase(), GesturePhase::Idle);
    c.on_double_click(PointerEvent::primary(960.0, 540.0));
    assert_eq!(c.phase(), GesturePhase::Idle);
}

#[test]
fn text_edit_hides_element_and_commit_applies_content() {
    let mut c = controller();
    c.on_double_click(PointerEvent::primary(960.0, 540.0));
    assert_eq!(c.phase(), GesturePhase::EditingText);
    assert_eq!(c.store().element(&target()).unwrap().opacity, 0.0);
    assert_eq!(c.overlay().editing.as_ref().unwrap().content, "Hi");
    assert!(c.handle_layout().is_none());

    // Pointer input is ignored while editing.
    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    assert_eq!(c.phase(), GesturePhase::EditingText);

    c.edit_text("Bye");
    assert_eq!(c.overlay().editing.as_ref().unwrap().content, "Bye");
    c.commit_text_edit();

    let el = c.store().element(&target()).unwrap();
    assert_eq!(el.opacity, 1.0);
    assert_eq!(el.text().unwrap().content, "Bye");
    assert_eq!(c.store().history_len(), 1);
    assert!(c.overlay().editing.is_none());
}

#[test]
fn escape_and_playback_cancel_text_edit() {
    let mut c = controller();
    c.on_double_click(PointerEvent::primary(960.0, 540.0));
    c.edit_text("Bye");
    c.on_escape();
    let el = c.store().element(&target()).unwrap();
    assert_eq!((el.opacity, el.text().unwrap().content.as_str()), (1.0, "Hi"));
    assert!(!c.store().is_preview_active());

    c.on_double_click(PointerEvent::primary(960.0, 540.0));
    c.edit_text("Later");
    c.on_playback_started();
    assert_eq!(c.phase(), GesturePhase::Idle);
    assert_eq!(c.store().element(&target()).unwrap().text().unwrap().content, "Hi");
    assert_eq!(c.store().history_len(), 0);
}

#[test]
fn blur_commits_text_edit() {
    let mut c = controller();
    c.on_double_click(PointerEvent::primary(960.0, 540.0));
    c.edit_text("Kept");
    c.on_blur();
    let el = c.store().element(&target()).unwrap();
    assert_eq!(el.text().unwrap().content, "Kept");
    assert_eq!(el.opacity, 1.0);
}

#[test]
fn overlay_listeners_fire_only_on_change() {
    let mut c = controller();
    let seen = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&seen);
    let id = c.subscribe(move |_| *counter.borrow_mut() += 1);

    c.on_pointer_down(PointerEvent::primary(960.0, 540.0));
    c.on_pointer_move(PointerEvent::primary(965.0, 543.0));
    assert_eq!(*seen.borrow(), 1);
    // Same guides again: no notification.
    c.on_pointer_move(PointerEvent::primary(964.0, 542.0));
    assert_eq!(*seen.borrow(), 1);
    c.on_pointer_up(PointerEvent::primary(964.0, 542.0));
    assert_eq!(*seen.borrow(), 2);

    assert!(c.unsubscribe(id));
    c.on_double_click(PointerEvent::primary(960.0, 540.0));
    assert_eq!(*seen.borrow(), 2);
}

#[test]
fn drag_snaps_the_aligned_box_edge_onto_the_guide() {
    // left-aligned text: the box starts at the position, so its left edge sits at x = 102
    let mut c = controller_with(vec![left_aligned_at("e", "Hi", -858.0)]);
    let start = c.visible_bounds()[0].bounds;
    assert!((start.cx - start.width / 2.0 - 102.0).abs() < 1e-9);

    c.on_pointer_down(PointerEvent::primary(start.cx, start.cy));
    c.on_pointer_move(PointerEvent::primary(start.cx - 97.0, start.cy));

    let moved = c.visible_bounds()[0].bounds;
    assert!((moved.cx - moved.width / 2.0).abs() < 1e-9);
    assert!(c.overlay().snap_lines.contains(&SnapLine::vertical(-960.0)));
    c.on_pointer_up(PointerEvent::primary(start.cx - 97.0, start.cy));
    assert_eq!(c.store().history_len(), 1);
}

#[test]
fn nudging_aligned_text_away_from_guides_does_not_snap() {
    let mut c = controller_with(vec![left_aligned_at("e", "Hi", -858.0)]);
    let start = c.visible_bounds()[0].bounds;

    c.on_pointer_down(PointerEvent::primary(start.cx, start.cy));
    c.on_pointer_move(PointerEvent::primary(start.cx + 2.0, start.cy));

    assert!((transform_of(&c, &target()).position.x + 856.0).abs() < 1e-9);
    assert!(
        !c.overlay()
            .snap_lines
            .iter()
            .any(|l| l.kind == crate::snap::engine::SnapLineKind::Vertical)
    );
}

#[test]
fn scaling_aligned_text_snaps_its_far_edge() {
    // the left edge stays on the center guide while the box grows to the right
    let mut c = controller_with(vec![left_aligned_at("e", "Hi", 0.0)]);
    c.selection_mut().set_selected(vec![target()]);
    let start = c.visible_bounds()[0].bounds;
    let layout = c.handle_layout().unwrap();
    let (_, corner) = layout
        .corners
        .iter()
        .copied()
        .find(|(k, _)| *k == crate::geometry::rotated::Corner::BottomRight)
        .unwrap();

    c.on_pointer_down(PointerEvent::primary(corner.x, corner.y));
    assert_eq!(c.phase(), GesturePhase::Scaling);
    let factor = 960.0 / start.width * 0.995;
    let far = start.center() + (corner - start.center()) * factor;
    c.on_pointer_move(PointerEvent::primary(far.x, far.y));

    let scaled = c.visible_bounds()[0].bounds;
    assert!((scaled.cx - scaled.width / 2.0 - 960.0).abs() < 1e-6);
    assert!((scaled.cx + scaled.width / 2.0 - 1920.0).abs() < 1e-6);
    let lines = &c.overlay().snap_lines;
    assert!(lines.contains(&SnapLine::vertical(0.0)));
    assert!(lines.contains(&SnapLine::vertical(960.0)));
}
