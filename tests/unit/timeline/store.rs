use super::*;
use crate::foundation::core::Vec2;
use crate::timeline::model::{ElementKind, TextContent, TrackKind, Transform};

fn timeline() -> MemoryTimeline {
    let project = Project {
        canvas: Canvas {
            width: 1920,
            height: 1080,
        },
        fps: Fps::default(),
        background: crate::foundation::color::Color::BLACK,
        assets: vec![],
        tracks: vec![Track {
            id: "t".to_string(),
            name: String::new(),
            kind: TrackKind::Text,
            is_main: false,
            hidden: false,
            elements: vec![Element {
                id: "e".to_string(),
                name: String::new(),
                start_time: 0.0,
                duration: 5.0,
                trim_start: 0.0,
                trim_end: 0.0,
                hidden: false,
                transform: Transform::default(),
                opacity: 1.0,
                blend_mode: Default::default(),
                kind: ElementKind::Text(TextContent::new("Hi")),
            }],
        }],
    };
    MemoryTimeline::new(project)
}

fn moved(x: f64) -> ElementUpdate {
    ElementUpdate::transform(
        ElementRef::new("t", "e"),
        Transform {
            position: Vec2::new(x, 0.0),
            ..Transform::default()
        },
    )
}

fn position_x(tl: &MemoryTimeline) -> f64 {
    tl.element(&ElementRef::new("t", "e"))
        .unwrap()
        .transform
        .position
        .x
}

#[test]
fn many_previews_commit_as_one_history_entry() {
    let mut tl = timeline();
    for x in [1.0, 2.0, 3.0, 40.0] {
        tl.preview_elements(&[moved(x)]);
        assert!(tl.is_preview_active());
    }
    tl.commit_preview();
    assert!(!tl.is_preview_active());
    assert_eq!(tl.history_len(), 1);
    assert_eq!(position_x(&tl), 40.0);

    assert!(tl.undo());
    assert_eq!(position_x(&tl), 0.0);
    assert!(tl.redo());
    assert_eq!(position_x(&tl), 40.0);
}

#[test]
fn discard_restores_snapshot_exactly() {
    let mut tl = timeline();
    let before = tl.tracks().to_vec();
    tl.preview_elements(&[moved(5.0)]);
    tl.preview_elements(&[moved(9.0)]);
    tl.discard_preview();
    assert!(!tl.is_preview_active());
    assert_eq!(tl.tracks(), before.as_slice());
    assert_eq!(tl.history_len(), 0);
}

#[test]
fn commit_without_change_adds_no_entry() {
    let mut tl = timeline();
    tl.preview_elements(&[moved(0.0)]);
    tl.commit_preview();
    assert_eq!(tl.history_len(), 0);
    // Closing an idle transaction is a no-op.
    tl.commit_preview();
    tl.discard_preview();
    assert_eq!(tl.history_len(), 0);
}

#[test]
fn direct_updates_and_undo_are_blocked_during_preview() {
    let mut tl = timeline();
    tl.update_elements(&[moved(7.0)]);
    assert_eq!(tl.history_len(), 1);

    tl.preview_elements(&[moved(8.0)]);
    tl.update_elements(&[moved(100.0)]);
    assert!(!tl.undo());
    assert_eq!(position_x(&tl), 8.0);
    tl.discard_preview();
    assert_eq!(position_x(&tl), 7.0);
    assert!(tl.undo());
    assert_eq!(position_x(&tl), 0.0);
}

#[test]
fn revision_moves_with_every_track_change() {
    let mut t = timeline();
    let r0 = t.revision();

    t.preview_elements(&[moved(10.0)]);
    let r1 = t.revision();
    assert_ne!(r1, r0);
    t.commit_preview();
    assert_eq!(t.revision(), r1);

    assert!(t.undo());
    let r2 = t.revision();
    assert_ne!(r2, r1);

    t.set_current_time(2.0);
    t.set_playing(true);
    assert_eq!(t.revision(), r2);

    t.update_elements(&[moved(20.0)]);
    assert_ne!(t.revision(), r2);
}
