use std::path::PathBuf;

use super::*;
use crate::foundation::core::{Fps, Vec2};
use crate::render::scene::FrameGate;
use crate::timeline::model::{
    BlendMode, MediaAsset, MediaKind, Project, TextContent, Track, TrackKind, Transform,
};

const RED_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#ff0000"/></svg>"##;

fn temp_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "stagecraft-compositor-{tag}-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn compositor(root: &std::path::Path) -> Compositor {
    Compositor::new(
        ImageLoader::new(root, Some(1)).unwrap(),
        StickerRegistry::with_directory_providers(root),
        TextShaper::default(),
        RenderSettings::default(),
    )
}

fn project(tracks: Vec<Track>, assets: Vec<MediaAsset>) -> Project {
    Project {
        canvas: Canvas {
            width: 320,
            height: 180,
        },
        fps: Fps { num: 30, den: 1 },
        background: Color::BLACK,
        assets,
        tracks,
    }
}

fn boxed_text(color: Color) -> Element {
    let mut t = TextContent::new("Hi");
    t.background_color = Some(color);
    Element::new("t", 0.0, 10.0, ElementKind::Text(t))
}

fn one_track(el: Element) -> Vec<Track> {
    vec![Track::new("track", TrackKind::Text, vec![el])]
}

fn surface() -> Surface {
    Surface::new(320, 180).unwrap()
}

#[test]
fn empty_scene_clears_to_background() {
    let root = temp_root("empty");
    let mut c = compositor(&root);
    let mut p = project(Vec::new(), Vec::new());
    p.background = Color::rgba(0, 0, 255, 255);
    let mut s = surface();
    c.render(&Scene::build(&p), 0.0, &mut s).unwrap();
    assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(319, 179), Some([0, 0, 255, 255]));
}

#[test]
fn clear_color_setting_overrides_background() {
    let root = temp_root("clear");
    let mut c = Compositor::new(
        ImageLoader::new(&root, Some(1)).unwrap(),
        StickerRegistry::new(),
        TextShaper::default(),
        RenderSettings {
            clear_rgba: Some([0, 0, 0, 0]),
            ..RenderSettings::default()
        },
    );
    let mut s = surface();
    c.render(&Scene::build(&project(Vec::new(), Vec::new())), 0.0, &mut s)
        .unwrap();
    assert_eq!(s.pixel(5, 5), Some([0, 0, 0, 0]));
}

#[test]
fn text_background_box_is_drawn_around_the_center() {
    let root = temp_root("textbg");
    let mut c = compositor(&root);
    let p = project(one_track(boxed_text(Color::rgba(255, 0, 0, 255))), Vec::new());
    let mut s = surface();
    c.render(&Scene::build(&p), 1.0, &mut s).unwrap();

    assert_eq!(s.pixel(160, 90), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(10, 90), Some([0, 0, 0, 255]));
    assert_eq!(s.pixel(160, 10), Some([0, 0, 0, 255]));
}

#[test]
fn inactive_elements_are_not_drawn() {
    let root = temp_root("inactive");
    let mut c = compositor(&root);
    let p = project(one_track(boxed_text(Color::rgba(255, 0, 0, 255))), Vec::new());
    let mut s = surface();
    c.render(&Scene::build(&p), 10.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([0, 0, 0, 255]));
}

#[test]
fn element_position_moves_the_drawing() {
    let root = temp_root("moved");
    let mut c = compositor(&root);
    let el = boxed_text(Color::rgba(255, 0, 0, 255)).with_transform(Transform {
        position: Vec2::new(100.0, 0.0),
        ..Transform::default()
    });
    let mut s = surface();
    c.render(&Scene::build(&project(one_track(el), Vec::new())), 0.0, &mut s)
        .unwrap();
    assert_eq!(s.pixel(260, 90), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(160, 90), Some([0, 0, 0, 255]));
}

#[test]
fn opacity_and_blend_mode_apply_per_element() {
    let root = temp_root("blend");
    let mut c = compositor(&root);

    let mut half = boxed_text(Color::rgba(255, 255, 255, 255));
    half.opacity = 0.5;
    let mut s = surface();
    c.render(&Scene::build(&project(one_track(half), Vec::new())), 0.0, &mut s)
        .unwrap();
    let px = s.pixel(160, 90).unwrap();
    assert!((127..=129).contains(&px[0]), "{px:?}");
    assert_eq!(px[3], 255);

    let mut multiplied = boxed_text(Color::rgba(255, 0, 0, 255));
    multiplied.blend_mode = BlendMode::Multiply;
    let mut p = project(one_track(multiplied), Vec::new());
    p.background = Color::rgba(128, 128, 128, 255);
    c.render(&Scene::build(&p), 0.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([128, 0, 0, 255]));
}

#[test]
fn images_draw_nothing_until_loaded() {
    let root = temp_root("image");
    std::fs::write(root.join("red.svg"), RED_SVG).unwrap();
    let mut c = compositor(&root);
    let asset = MediaAsset {
        id: "m".into(),
        kind: MediaKind::Image,
        width: Some(4),
        height: Some(4),
        duration: None,
        source: Some("red.svg".into()),
    };
    let el = Element::new(
        "img",
        0.0,
        5.0,
        ElementKind::Image {
            media_id: "m".into(),
        },
    );
    let scene = Scene::build(&project(
        vec![Track::new("v", TrackKind::Image, vec![el])],
        vec![asset],
    ));
    let mut s = surface();

    c.render(&scene, 0.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([0, 0, 0, 255]));

    assert_eq!(c.wait_for_assets(), 1);
    assert_eq!(c.render_frame(&scene, 0.0, &mut s).unwrap(), RenderOutcome::Rendered);
    assert_eq!(s.pixel(160, 90), Some([255, 0, 0, 255]));
    // Contain-fit: a square source covers the middle 180 px of a 320 px wide canvas.
    assert_eq!(s.pixel(20, 90), Some([0, 0, 0, 255]));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn failed_sources_stay_blank() {
    let root = temp_root("failed");
    let mut c = compositor(&root);
    let asset = MediaAsset {
        id: "m".into(),
        kind: MediaKind::Image,
        width: None,
        height: None,
        duration: None,
        source: Some("missing.png".into()),
    };
    let el = Element::new(
        "img",
        0.0,
        5.0,
        ElementKind::Image {
            media_id: "m".into(),
        },
    );
    let scene = Scene::build(&project(
        vec![Track::new("v", TrackKind::Image, vec![el])],
        vec![asset],
    ));
    let mut s = surface();
    c.render(&scene, 0.0, &mut s).unwrap();
    c.wait_for_assets();
    c.render(&scene, 0.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([0, 0, 0, 255]));
    assert!(c.take_notifications().is_empty());
}

#[test]
fn stickers_resolve_through_the_registry() {
    let root = temp_root("sticker");
    std::fs::create_dir_all(root.join("shapes")).unwrap();
    std::fs::write(root.join("shapes").join("dot.svg"), RED_SVG).unwrap();
    let mut c = compositor(&root);
    let el = Element::new(
        "s",
        0.0,
        5.0,
        ElementKind::Sticker {
            sticker_id: "shapes:dot".into(),
        },
    );
    let scene = Scene::build(&project(
        vec![Track::new("st", TrackKind::Sticker, vec![el])],
        Vec::new(),
    ));
    let mut s = surface();
    c.render(&scene, 0.0, &mut s).unwrap();
    c.wait_for_assets();
    c.render(&scene, 0.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([255, 0, 0, 255]));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn malformed_sticker_ids_notify_once() {
    let root = temp_root("badsticker");
    let mut c = compositor(&root);
    let el = Element::new(
        "s",
        0.0,
        5.0,
        ElementKind::Sticker {
            sticker_id: "no-colon".into(),
        },
    );
    let scene = Scene::build(&project(
        vec![Track::new("st", TrackKind::Sticker, vec![el])],
        Vec::new(),
    ));
    let mut s = surface();
    c.render(&scene, 0.0, &mut s).unwrap();
    c.render(&scene, 0.1, &mut s).unwrap();

    let notes = c.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].element_id, "s");
    assert!(c.take_notifications().is_empty());
    assert_eq!(s.pixel(160, 90), Some([0, 0, 0, 255]));
}

struct SolidFrames;

impl VideoFrameSource for SolidFrames {
    fn frame_at(&self, media_id: &str, source_time_s: f64) -> Option<Arc<DecodedImage>> {
        if media_id != "clip" || source_time_s < 0.0 {
            return None;
        }
        Some(Arc::new(DecodedImage {
            width: 2,
            height: 2,
            rgba8_premul: Arc::new([0u8, 255, 0, 255].repeat(4)),
        }))
    }
}

#[test]
fn video_frames_come_from_the_host_source() {
    let root = temp_root("video");
    let asset = MediaAsset {
        id: "clip".into(),
        kind: MediaKind::Video,
        width: Some(320),
        height: Some(180),
        duration: Some(5.0),
        source: None,
    };
    let el = Element::new(
        "v",
        0.0,
        5.0,
        ElementKind::Video {
            media_id: "clip".into(),
        },
    );
    let scene = Scene::build(&project(
        vec![Track::new("main", TrackKind::Video, vec![el])],
        vec![asset],
    ));
    let mut s = surface();

    compositor(&root).render(&scene, 1.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([0, 0, 0, 255]));

    let mut c = compositor(&root).with_video_source(Box::new(SolidFrames));
    c.render(&scene, 1.0, &mut s).unwrap();
    assert_eq!(s.pixel(160, 90), Some([0, 255, 0, 255]));
}

#[test]
fn gated_render_skips_unchanged_frames() {
    let root = temp_root("gate");
    let mut c = compositor(&root);
    let p = project(one_track(boxed_text(Color::WHITE)), Vec::new());
    let scene = Scene::build(&p);
    let mut s = surface();

    assert_eq!(c.render_frame(&scene, 0.0, &mut s).unwrap(), RenderOutcome::Rendered);
    assert_eq!(c.render_frame(&scene, 0.01, &mut s).unwrap(), RenderOutcome::Skipped);
    assert_eq!(c.render_frame(&scene, 0.5, &mut s).unwrap(), RenderOutcome::Rendered);

    let mut moved = p.clone();
    moved.tracks[0].elements[0].transform.position = Vec2::new(3.0, 0.0);
    let moved = Scene::build(&moved);
    assert_eq!(c.render_frame(&moved, 0.5, &mut s).unwrap(), RenderOutcome::Rendered);

    c.invalidate();
    assert_eq!(*c.gate(), FrameGate::new());
    assert_eq!(c.render_frame(&moved, 0.5, &mut s).unwrap(), RenderOutcome::Rendered);
}

#[test]
fn rendering_twice_is_pixel_identical() {
    let root = temp_root("repeat");
    let mut c = compositor(&root);
    let el = boxed_text(Color::rgba(10, 200, 30, 255)).with_transform(Transform {
        position: Vec2::new(-20.0, 15.0),
        scale: 1.5,
        rotate: 33.0,
    });
    let scene = Scene::build(&project(one_track(el), Vec::new()));
    let mut a = surface();
    let mut b = surface();
    c.render(&scene, 0.0, &mut a).unwrap();
    c.render(&scene, 0.0, &mut b).unwrap();
    assert_eq!(a.data(), b.data());
}

#[test]
fn mismatched_surface_is_rejected() {
    let root = temp_root("mismatch");
    let mut c = compositor(&root);
    let mut s = Surface::new(10, 10).unwrap();
    let err = c
        .render(&Scene::build(&project(Vec::new(), Vec::new())), 0.0, &mut s)
        .unwrap_err();
    assert!(matches!(err, StageError::Validation(_)));
}
