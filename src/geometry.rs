//! Plain 2D value types for block bounding boxes in world coordinates.
//!
//! Everything on the canvas is an axis-aligned rectangle. The snap resolver
//! measures distances between points and rectangle centers, relationship
//! inference tests tolerant containment, and placement validation tests
//! intersection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from a top-left corner and a size, the way blocks store themselves.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_min_max(Vec2::new(x, y), Vec2::new(x + width, y + height))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Strict intersection: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: Rect) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y)
    }

    /// Returns true if `inner` lies within this rectangle grown by `tolerance`
    /// on all four edges.
    pub fn contains_rect(&self, inner: Rect, tolerance: f64) -> bool {
        let outer = self.expand(tolerance);
        inner.min.x >= outer.min.x
            && inner.max.x <= outer.max.x
            && inner.min.y >= outer.min.y
            && inner.max.y <= outer.max.y
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::from_min_max(
            Vec2::new(self.min.x + dx, self.min.y + dy),
            Vec2::new(self.max.x + dx, self.max.y + dy),
        )
    }

    /// Grow every edge outwards by `amount`.
    pub fn expand(&self, amount: f64) -> Rect {
        Rect::from_min_max(
            Vec2::new(self.min.x - amount, self.min.y - amount),
            Vec2::new(self.max.x + amount, self.max.y + amount),
        )
    }
}
