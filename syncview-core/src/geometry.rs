use serde::{Deserialize, Serialize};

/// A point in client (page) or surface-local pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Translate a client-space point into the local space of `bounds`.
    pub fn relative_to(&self, bounds: &Rect) -> Point {
        Point::new(self.x - bounds.x, self.y - bounds.y)
    }
}

/// Axis-aligned rectangle with floating point origin and extent.
///
/// Used for surface bounding boxes, source windows sampled from a bitmap,
/// and destination regions in a backing buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Visual center of the rectangle, floored to whole pixels.
    pub fn pixel_center(&self) -> Point {
        Point::new((self.width / 2.0).floor(), (self.height / 2.0).floor())
    }

    pub fn left_half(&self) -> Rect {
        Rect::new(self.x, self.y, self.width / 2.0, self.height)
    }

    pub fn right_half(&self) -> Rect {
        Rect::new(self.x + self.width / 2.0, self.y, self.width / 2.0, self.height)
    }
}
