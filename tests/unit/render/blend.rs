use super::*;

const GRAY: [u8; 4] = [128, 128, 128, 255];

fn one(mode: BlendMode, dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let mut d = dst;
    composite_over(&mut d, &src, opacity, mode).unwrap();
    d
}

#[test]
fn normal_opaque_source_replaces_destination() {
    assert_eq!(one(BlendMode::Normal, GRAY, [10, 20, 30, 255], 1.0), [10, 20, 30, 255]);
}

#[test]
fn zero_opacity_and_transparent_source_are_noops() {
    for mode in [BlendMode::Normal, BlendMode::Multiply, BlendMode::Screen] {
        assert_eq!(one(mode, GRAY, [255, 0, 0, 255], 0.0), GRAY);
        assert_eq!(one(mode, GRAY, [0, 0, 0, 0], 1.0), GRAY);
    }
}

#[test]
fn normal_half_opacity_mixes() {
    let out = one(BlendMode::Normal, [0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert!((127..=129).contains(&out[0]));
    assert_eq!(out[3], 255);
}

#[test]
fn multiply_and_screen_against_gray() {
    let white = [255, 255, 255, 255];
    let black = [0, 0, 0, 255];
    assert_eq!(one(BlendMode::Multiply, GRAY, white, 1.0), GRAY);
    assert_eq!(one(BlendMode::Multiply, GRAY, black, 1.0), black);
    assert_eq!(one(BlendMode::Screen, GRAY, black, 1.0), GRAY);
    assert_eq!(one(BlendMode::Screen, GRAY, white, 1.0), white);
}

#[test]
fn difference_of_equal_colors_is_black() {
    assert_eq!(one(BlendMode::Difference, GRAY, GRAY, 1.0), [0, 0, 0, 255]);
}

#[test]
fn blend_onto_transparent_behaves_like_over() {
    let src = [200, 100, 50, 255];
    for mode in [BlendMode::Multiply, BlendMode::Overlay, BlendMode::Exclusion] {
        assert_eq!(one(mode, [0, 0, 0, 0], src, 1.0), src);
    }
}

#[test]
fn mismatched_buffers_are_rejected() {
    let mut dst = [0u8; 8];
    assert!(composite_over(&mut dst, &[0u8; 4], 1.0, BlendMode::Normal).is_err());
}
