use crate::foundation::core::{Point, Vec2};

/// Resolved canvas-space geometry of one element: center, unrotated size, rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

/// Corner of a (possibly rotated) bounds box, named in the box's local frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    fn signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }
}

fn rotate(v: Vec2, deg: f64) -> Vec2 {
    let (sin, cos) = deg.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Whether `p` lies inside the rectangle centered at `center` with the given size, rotated by
/// `rotation_deg` around its center. Edges are inclusive.
pub fn point_in_rotated_rect(
    p: Point,
    center: Point,
    width: f64,
    height: f64,
    rotation_deg: f64,
) -> bool {
    let local = rotate(p - center, -rotation_deg);
    let (hw, hh) = (width / 2.0, height / 2.0);
    local.x >= -hw && local.x <= hw && local.y >= -hh && local.y <= hh
}

impl Bounds {
    pub fn center(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    pub fn contains(&self, p: Point) -> bool {
        point_in_rotated_rect(p, self.center(), self.width, self.height, self.rotation)
    }

    /// World point into the box's unrotated local frame (origin at the center).
    pub fn to_local(&self, p: Point) -> Vec2 {
        rotate(p - self.center(), -self.rotation)
    }

    /// Local offset from the center back into world (canvas) space.
    pub fn to_world(&self, local: Vec2) -> Point {
        self.center() + rotate(local, self.rotation)
    }

    pub fn corner(&self, corner: Corner) -> Point {
        let (sx, sy) = corner.signs();
        self.to_world(Vec2::new(sx * self.width / 2.0, sy * self.height / 2.0))
    }

    /// Distance from center to any corner; 1 for a degenerate box so ratios stay finite.
    pub fn corner_distance(&self) -> f64 {
        let d = (self.width / 2.0).hypot(self.height / 2.0);
        if d > 0.0 { d } else { 1.0 }
    }

    /// Rotation handle anchor: `offset` canvas pixels above the top edge, rotating with the box.
    pub fn rotation_handle(&self, offset: f64) -> Point {
        self.to_world(Vec2::new(0.0, -self.height / 2.0 - offset))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/rotated.rs"]
mod tests;
