use super::*;
use crate::text::layout::TextShaper;
use crate::timeline::model::TextAlign;

fn block(content: &str, align: TextAlign) -> TextBlock {
    let mut t = TextContent::new(content);
    t.text_align = align;
    TextShaper::default().measure(&t, 90.0)
}

#[test]
fn background_follows_alignment() {
    let b = block("abcd", TextAlign::Center);
    let r = background_rect(&b);
    assert_eq!(r.x0, -b.max_width / 2.0 - 8.0);
    assert_eq!(r.width(), b.max_width + 16.0);
    assert_eq!(r.height(), b.height + 8.0);

    let left = background_rect(&block("abcd", TextAlign::Left));
    assert_eq!(left.x0, -8.0);
    let right = background_rect(&block("abcd", TextAlign::Right));
    assert_eq!(right.x1, 8.0);
}

#[test]
fn decorations_sit_below_and_across_the_baseline() {
    let b = block("abc", TextAlign::Left);
    let line = &b.lines[0];
    let t = decoration_thickness(b.font_size_px);
    assert!((t - 1.05).abs() < 1e-9);

    let under = decoration_rect(line, &b, TextDecoration::Underline).unwrap();
    assert_eq!(under.x0, 0.0);
    assert_eq!(under.width(), line.width);
    assert!(under.y0 >= line.baseline_y + line.descent);
    assert!((under.y0 - (line.baseline_y + line.descent + t)).abs() < 1e-9);

    let strike = decoration_rect(line, &b, TextDecoration::LineThrough).unwrap();
    assert!(strike.y1 < line.baseline_y);
    assert!(strike.y0 > line.baseline_y - line.ascent);

    assert!(decoration_rect(line, &b, TextDecoration::None).is_none());
}

#[test]
fn thin_text_keeps_a_one_pixel_decoration() {
    assert_eq!(decoration_thickness(4.0), 1.0);
}

#[test]
fn empty_lines_have_no_decoration() {
    let b = block("a\n\nb", TextAlign::Center);
    assert!(decoration_rect(&b.lines[1], &b, TextDecoration::Underline).is_none());
}
