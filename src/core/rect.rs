//! Axis-Aligned Rectangles
//!
//! Collider geometry. Edge semantics follow the usual half-open convention:
//! touching rectangles do not intersect and a point on the right or bottom
//! edge is outside.

use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Axis-aligned rectangle anchored at its top-left corner.
///
/// The width and height of an intersection result may be negative when the
/// source rectangles are disjoint.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle at `origin` with the given size.
    #[inline]
    pub fn at(origin: Vec2, w: f32, h: f32) -> Self {
        Self::new(origin.x, origin.y, w, h)
    }

    /// Right edge.
    #[inline]
    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge.
    #[inline]
    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    /// Horizontal center.
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    /// Vertical center.
    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x(), self.center_y())
    }

    /// True if the rectangle has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Area, zero for empty rectangles.
    #[inline]
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.w * self.h
        }
    }

    /// Strict overlap test: shared edges do not count.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.max_x() > other.x
            && self.max_y() > other.y
            && self.x < other.max_x()
            && self.y < other.max_y()
    }

    /// Intersection rectangle. Check `is_empty` on the result before use.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.max_x().min(other.max_x());
        let y2 = self.max_y().min(other.max_y());
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Half-open point containment.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.max_x()
            && point.y < self.max_y()
    }
}
