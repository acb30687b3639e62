use super::*;
use crate::geometry::rotated::Bounds;
use crate::timeline::model::{Element, ElementKind};

fn entry(id: &str, bounds: Bounds) -> ElementWithBounds {
    ElementWithBounds {
        track_id: "t".to_string(),
        element_id: id.to_string(),
        element: Element::new(id, 0.0, 1.0, ElementKind::Sticker {
            sticker_id: "shapes:square".to_string(),
        }),
        bounds,
    }
}

fn square(cx: f64, cy: f64, size: f64, rotation: f64) -> Bounds {
    Bounds {
        cx,
        cy,
        width: size,
        height: size,
        rotation,
    }
}

#[test]
fn later_entry_wins_on_overlap() {
    let list = [
        entry("below", square(100.0, 100.0, 100.0, 0.0)),
        entry("above", square(120.0, 100.0, 100.0, 0.0)),
    ];
    let hit = hit_test(Point::new(110.0, 100.0), &list).unwrap();
    assert_eq!(hit.element_id, "above");
    let hit = hit_test(Point::new(60.0, 100.0), &list).unwrap();
    assert_eq!(hit.element_id, "below");
    assert!(hit_test(Point::new(500.0, 500.0), &list).is_none());
}

#[test]
fn rotation_is_respected() {
    let list = [entry("diamond", square(0.0, 0.0, 100.0, 45.0))];
    // Inside the axis-aligned box but outside the rotated one.
    assert!(hit_test(Point::new(45.0, 45.0), &list).is_none());
    // Outside the axis-aligned box but inside the rotated one.
    assert!(hit_test(Point::new(65.0, 0.0), &list).is_some());
}
