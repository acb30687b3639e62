use std::io::Cursor;

use super::*;

fn png_1x1(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, rgba.to_vec()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

const RED_SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;

#[test]
fn png_decodes_premultiplied() {
    let decoded = decode_image(&png_1x1([100, 50, 200, 128])).unwrap();
    assert_eq!((decoded.width, decoded.height), (1, 1));
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn svg_parse_ok_and_err() {
    parse_svg(RED_SQUARE).unwrap();
    assert!(parse_svg(br#"<svg"#).is_err());
}

#[test]
fn svg_rasterizes_at_requested_size() {
    let decoded = decode_source(RED_SQUARE, Some((20, 20))).unwrap();
    assert_eq!((decoded.width, decoded.height), (20, 20));
    let center = (10 * 20 + 10) * 4;
    assert_eq!(&decoded.rgba8_premul[center..center + 4], &[255, 0, 0, 255]);

    let intrinsic = decode_source(RED_SQUARE, None).unwrap();
    assert_eq!((intrinsic.width, intrinsic.height), (10, 10));
}

#[test]
fn sniffing_routes_rasters_and_rejects_garbage() {
    assert!(looks_like_svg(RED_SQUARE));
    assert!(!looks_like_svg(&png_1x1([0, 0, 0, 255])));
    assert!(decode_source(&png_1x1([0, 0, 0, 255]), Some((5, 5))).is_ok());
    assert!(decode_source(b"definitely not an image", None).is_err());
}

#[test]
fn zero_raster_size_is_rejected() {
    let tree = parse_svg(RED_SQUARE).unwrap();
    assert!(matches!(rasterize_svg(&tree, 0, 10), Err(StageError::Asset(_))));
}
