//! Document-flow geometry shared by layout, gutter, and renderer callbacks.

use serde::Serialize;

/// A point in document-flow coordinates (y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle; zero width or height is legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn min_x(&self) -> f32 {
        self.origin.x
    }

    pub fn min_y(&self) -> f32 {
        self.origin.y
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    /// Returns this rectangle grown vertically by `margin` on both edges.
    ///
    /// The top edge is clamped at zero since document flow never goes negative.
    pub fn expanded_vertically(&self, margin: f32) -> Self {
        let top = (self.min_y() - margin).max(0.0);
        let bottom = self.max_y() + margin;
        Self::new(self.origin.x, top, self.size.width, (bottom - top).max(0.0))
    }

    /// Returns `true` when the vertical spans of both rectangles overlap.
    ///
    /// Zero-height rectangles intersect when their y lies inside the other span.
    pub fn intersects_vertically(&self, other: &Rect) -> bool {
        self.min_y() <= other.max_y() && other.min_y() <= self.max_y()
    }

    pub fn offset_by(&self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.origin.x + dx,
            self.origin.y + dy,
            self.size.width,
            self.size.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanded_vertically_clamps_top_at_zero() {
        let rect = Rect::new(0.0, 10.0, 100.0, 50.0).expanded_vertically(32.0);
        assert_eq!(rect.min_y(), 0.0);
        assert_eq!(rect.max_y(), 92.0);
    }

    #[test]
    fn zero_height_rect_intersects_enclosing_span() {
        let line = Rect::new(0.0, 16.0, 0.0, 0.0);
        let viewport = Rect::new(0.0, 0.0, 200.0, 32.0);
        assert!(viewport.intersects_vertically(&line));
        assert!(!Rect::new(0.0, 40.0, 10.0, 0.0).intersects_vertically(&viewport));
    }
}
